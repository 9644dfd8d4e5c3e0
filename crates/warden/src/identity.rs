//! [`IdentityApi`] over the request pipeline.

use std::sync::Arc;

use serde::Deserialize;
use warden_pipeline::{CredentialProvider, PipelineError, RequestPipeline, TokenStore};
use warden_refresh::Renewer;
use warden_session::{IdentityApi, LoginRequest, RegisterRequest, SessionError, User};
use warden_transport::{ApiRequest, ApiResponse, Transport, TransportError};

/// Body of a login or registration response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Body of a "who am I" response: the user itself, or wrapped like an
/// [`AuthPayload`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MePayload {
    Wrapped { user: User },
    Bare(User),
}

/// The identity endpoints, called through a [`RequestPipeline`].
///
/// Identity endpoints never trigger renewal, so a 401 here means exactly
/// what the server said. When a [`TokenStore`] is attached, an
/// `accessToken` in a login or registration response is stored, and
/// logout clears the store.
pub struct HttpIdentityApi<T, C, R>
where
    T: Transport,
    C: CredentialProvider,
    R: Renewer,
{
    pipeline: Arc<RequestPipeline<T, C, R>>,
    tokens: Option<TokenStore>,
}

impl<T, C, R> HttpIdentityApi<T, C, R>
where
    T: Transport,
    C: CredentialProvider,
    R: Renewer,
{
    pub fn new(pipeline: Arc<RequestPipeline<T, C, R>>) -> Self {
        Self {
            pipeline,
            tokens: None,
        }
    }

    pub fn with_token_store(mut self, store: TokenStore) -> Self {
        self.tokens = Some(store);
        self
    }

    async fn authenticate(&self, request: ApiRequest) -> Result<User, SessionError> {
        let response = self.pipeline.send(request).await.map_err(session_error)?;
        let payload: AuthPayload = response.json().map_err(from_transport)?;

        if let (Some(store), Some(token)) = (&self.tokens, payload.access_token) {
            store.set(token);
        }
        if let Some(message) = &payload.message {
            tracing::debug!(%message, "identity service answered");
        }
        payload
            .user
            .ok_or_else(|| SessionError::Malformed("response carries no user".into()))
    }
}

impl<T, C, R> IdentityApi for HttpIdentityApi<T, C, R>
where
    T: Transport,
    C: CredentialProvider,
    R: Renewer,
{
    async fn me(&self) -> Result<User, SessionError> {
        let path = &self.pipeline.endpoints().me;
        let response = self.pipeline.get(path).await.map_err(session_error)?;
        match response.json::<MePayload>().map_err(from_transport)? {
            MePayload::Wrapped { user } | MePayload::Bare(user) => Ok(user),
        }
    }

    async fn login(&self, request: &LoginRequest) -> Result<User, SessionError> {
        let path = &self.pipeline.endpoints().login;
        let request = ApiRequest::post(path).json(request).map_err(from_transport)?;
        self.authenticate(request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<User, SessionError> {
        let path = &self.pipeline.endpoints().register;
        let request = ApiRequest::post(path).json(request).map_err(from_transport)?;
        self.authenticate(request).await
    }

    async fn logout(&self) -> Result<(), SessionError> {
        let path = &self.pipeline.endpoints().logout;
        let result = self.pipeline.post(path).await;
        if let Some(store) = &self.tokens {
            store.clear();
        }
        result.map(|_| ()).map_err(session_error)
    }
}

/// Maps a pipeline failure onto what the session layer understands.
fn session_error(error: PipelineError) -> SessionError {
    match error {
        PipelineError::Status(response) => SessionError::Rejected {
            status: response.status,
            message: server_message(&response),
        },
        PipelineError::RetryExhausted { .. } => SessionError::Rejected {
            status: ApiResponse::UNAUTHORIZED,
            message: "unauthorized".into(),
        },
        PipelineError::RenewalFailed(e) => SessionError::Transport(e.to_string()),
        PipelineError::Transport(e) => from_transport(e),
    }
}

fn from_transport(error: TransportError) -> SessionError {
    match error {
        TransportError::Decode(e) | TransportError::Encode(e) => {
            SessionError::Malformed(e.to_string())
        }
        other => SessionError::Transport(other.to_string()),
    }
}

/// Pulls a human-readable reason out of an error response.
///
/// The server reports failures as `{ "message": ... }` or
/// `{ "error": ... }`; anything else falls back to the raw body, then the
/// status line.
fn server_message(response: &ApiResponse) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    if let Ok(ErrorBody { message, error }) = response.json::<ErrorBody>() {
        if let Some(reason) = message.or(error) {
            return reason;
        }
    }
    let text = response.text();
    if text.trim().is_empty() {
        response.to_string()
    } else {
        text
    }
}
