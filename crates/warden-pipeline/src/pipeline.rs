//! The request pipeline: attach, send, renew once, replay.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use warden_refresh::{RefreshCoordinator, Renewer};
use warden_transport::{ApiRequest, ApiResponse, Transport, TransportError};

use crate::{AuthEndpoints, CredentialProvider, PipelineError, RequestDescriptor};

/// Sends API calls with the current credential attached and recovers from
/// one expired credential per call.
///
/// ## Flow of one call
///
/// ```text
/// send(req) ──→ attach credential ──→ transport ──→ 2xx ──────────→ Ok
///                    ↑                    │
///                    │                    ├──→ other status ─────→ Err(Status)
///                    │                    │
///                    │                    └──→ 401
///                    │                          ├─ identity endpoint → Err(Status)
///                    │                          ├─ already retried ──→ Err(RetryExhausted)
///                    │                          └─ request_renewal()
///                    │                                ├─ Err ────────→ Err(RenewalFailed)
///                    └────────── replay ──────────────┘ Ok
/// ```
///
/// The coordinator is injected so several pipelines (or a pipeline and
/// other renewal triggers) can share one single-flight lock.
pub struct RequestPipeline<T, C, R>
where
    T: Transport,
    C: CredentialProvider,
    R: Renewer,
{
    transport: T,
    credentials: C,
    coordinator: Arc<RefreshCoordinator<R>>,
    endpoints: AuthEndpoints,
}

impl<T, C, R> RequestPipeline<T, C, R>
where
    T: Transport,
    C: CredentialProvider,
    R: Renewer,
{
    /// Creates a pipeline over `transport`, reading credentials from
    /// `credentials` and renewing through the shared `coordinator`.
    pub fn new(
        transport: T,
        credentials: C,
        coordinator: Arc<RefreshCoordinator<R>>,
        endpoints: AuthEndpoints,
    ) -> Self {
        Self {
            transport,
            credentials,
            coordinator,
            endpoints,
        }
    }

    /// Returns the coordinator this pipeline renews through.
    pub fn coordinator(&self) -> &Arc<RefreshCoordinator<R>> {
        &self.coordinator
    }

    /// Returns the identity endpoints exempt from renewal.
    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `request` and returns the server's successful response.
    ///
    /// # Errors
    /// - [`PipelineError::Transport`]: the call never got a response
    /// - [`PipelineError::Status`]: non-2xx status, including a 401 from
    ///   an identity endpoint
    /// - [`PipelineError::RenewalFailed`]: a 401 triggered renewal and the
    ///   renewal failed
    /// - [`PipelineError::RetryExhausted`]: the replay after a successful
    ///   renewal was rejected again
    pub async fn send(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, PipelineError> {
        let mut descriptor = RequestDescriptor::new(request);

        // Runs at most twice: the retry flag admits a single replay.
        loop {
            let response = self.dispatch(&descriptor).await?;
            let id = descriptor.id();
            let request = descriptor.request();

            if !response.is_unauthorized() {
                if response.is_success() {
                    return Ok(response);
                }
                tracing::debug!(
                    %id,
                    method = %request.method,
                    path = %request.path,
                    status = response.status,
                    "request failed"
                );
                return Err(PipelineError::Status(response));
            }

            if self.endpoints.is_identity(&request.path) {
                tracing::debug!(
                    %id,
                    path = %request.path,
                    "identity endpoint answered 401, not renewing"
                );
                return Err(PipelineError::Status(response));
            }

            if !descriptor.mark_retried() {
                let request = descriptor.request();
                tracing::warn!(
                    %id,
                    method = %request.method,
                    path = %request.path,
                    "still unauthorized after renewal"
                );
                return Err(PipelineError::RetryExhausted {
                    method: request.method,
                    path: request.path.clone(),
                });
            }

            tracing::debug!(%id, "unauthorized, waiting for credential renewal");
            self.coordinator
                .request_renewal()
                .await
                .map_err(PipelineError::RenewalFailed)?;
            tracing::debug!(%id, "renewal settled, replaying");
        }
    }

    /// Sends `request` and decodes the successful response body as JSON.
    pub async fn send_json<U: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<U, PipelineError> {
        let response = self.send(request).await?;
        Ok(response.json()?)
    }

    /// Sends a `GET` to `path`. See [`RequestPipeline::send`].
    pub async fn get(&self, path: &str) -> Result<ApiResponse, PipelineError> {
        self.send(ApiRequest::get(path)).await
    }

    /// Sends a bodiless `POST` to `path`.
    pub async fn post(
        &self,
        path: &str,
    ) -> Result<ApiResponse, PipelineError> {
        self.send(ApiRequest::post(path)).await
    }

    /// Sends a `POST` to `path` with `body` encoded as JSON.
    ///
    /// # Errors
    /// [`PipelineError::Transport`] if `body` fails to encode, otherwise as
    /// [`RequestPipeline::send`].
    pub async fn post_json<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, PipelineError> {
        let request = ApiRequest::post(path).json(body)?;
        self.send(request).await
    }

    /// Sends a `PUT` to `path` with `body` encoded as JSON.
    pub async fn put_json<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, PipelineError> {
        let request = ApiRequest::put(path).json(body)?;
        self.send(request).await
    }

    /// Sends a `DELETE` to `path`.
    pub async fn delete(
        &self,
        path: &str,
    ) -> Result<ApiResponse, PipelineError> {
        self.send(ApiRequest::delete(path)).await
    }

    /// One attempt: the credential is read now, not when the call began.
    async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<ApiResponse, TransportError> {
        let credential = self.credentials.credential();
        let request = descriptor.attempt(credential.as_ref());
        tracing::trace!(
            id = %descriptor.id(),
            method = %request.method,
            path = %request.path,
            retried = descriptor.is_retried(),
            "dispatching"
        );
        self.transport.send(request).await
    }
}
