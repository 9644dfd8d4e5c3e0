//! `WardenClient` builder and the assembled client.
//!
//! This is the entry point for applications. It ties together all the
//! layers: transport → refresh coordinator → pipeline → session → guard.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use warden_guard::{Decision, NavigationGuard, RouteTable};
use warden_pipeline::{EndpointRenewer, RequestPipeline, TokenStore};
use warden_refresh::{RefreshConfig, RefreshCoordinator};
use warden_session::{LoginRequest, RegisterRequest, Session, SessionStore, User};
use warden_transport::{ApiRequest, ApiResponse, HttpTransport, Transport};

use crate::{ClientConfig, HttpIdentityApi, WardenError};

/// The renewer a client uses: the refresh endpoint over the shared transport.
pub type ClientRenewer<T> = EndpointRenewer<Arc<T>>;

/// The pipeline every client call goes through.
pub type ClientPipeline<T> = RequestPipeline<Arc<T>, TokenStore, ClientRenewer<T>>;

/// The identity API behind a client's session store.
pub type ClientIdentity<T> = HttpIdentityApi<Arc<T>, TokenStore, ClientRenewer<T>>;

/// Builder for configuring a [`WardenClient`].
///
/// # Example
///
/// ```rust,no_run
/// use warden::prelude::*;
///
/// # async fn run() -> Result<(), WardenError> {
/// let client = WardenClient::builder()
///     .base_url("https://portal.example/api")
///     .routes(RouteTable::new().route("leases", "/leases", RouteRequirement::authenticated()))
///     .build()?;
///
/// client.login("alice", "secret").await?;
/// let leases = client.get("/leases").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct WardenClientBuilder {
    config: ClientConfig,
    access_token: Option<String>,
}

impl WardenClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.config.routes = routes;
        self
    }

    /// Starts the client with a bearer token obtained elsewhere.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Builds a client that talks HTTP to `base_url`.
    ///
    /// # Errors
    /// [`WardenError::Transport`] if the base URL does not parse or the
    /// HTTP client cannot be created.
    pub fn build(self) -> Result<WardenClient<HttpTransport>, WardenError> {
        let config = self.config.validated();
        let transport = HttpTransport::new(&config.base_url, config.request_timeout())?;
        Ok(WardenClient::assemble(config, self.access_token, transport))
    }

    /// Builds a client over a caller-supplied transport.
    ///
    /// `base_url` and `request_timeout_ms` are the transport's business and
    /// are ignored here.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> WardenClient<T> {
        WardenClient::assemble(self.config.validated(), self.access_token, transport)
    }
}

/// A configured client: one session, one renewal lock, one route guard.
///
/// Every API call made through [`send`](Self::send) and friends carries the
/// current credential and transparently survives one credential expiry.
pub struct WardenClient<T: Transport = HttpTransport> {
    config: ClientConfig,
    tokens: TokenStore,
    pipeline: Arc<ClientPipeline<T>>,
    session: Arc<SessionStore<ClientIdentity<T>>>,
    guard: NavigationGuard<ClientIdentity<T>>,
}

impl WardenClient<HttpTransport> {
    /// Creates a new builder.
    pub fn builder() -> WardenClientBuilder {
        WardenClientBuilder::new()
    }
}

impl<T: Transport> WardenClient<T> {
    fn assemble(config: ClientConfig, access_token: Option<String>, transport: T) -> Self {
        let transport = Arc::new(transport);
        let tokens = access_token
            .map(|token| TokenStore::with_token(token))
            .unwrap_or_default();

        let renewer = EndpointRenewer::new(Arc::clone(&transport), &config.endpoints)
            .with_token_store(tokens.clone());
        let coordinator = Arc::new(RefreshCoordinator::new(
            renewer,
            RefreshConfig {
                renewal_timeout: config.renewal_timeout(),
            },
        ));
        let pipeline = Arc::new(RequestPipeline::new(
            transport,
            tokens.clone(),
            coordinator,
            config.endpoints.clone(),
        ));

        let identity =
            HttpIdentityApi::new(Arc::clone(&pipeline)).with_token_store(tokens.clone());
        let session = Arc::new(SessionStore::new(identity));
        let guard = NavigationGuard::new(
            Arc::clone(&session),
            config.routes.clone(),
            config.guard.clone(),
        );

        tracing::info!(
            base_url = %config.base_url,
            routes = config.routes.len(),
            renewal_timeout = ?config.renewal_timeout(),
            "warden client ready"
        );

        Self {
            config,
            tokens,
            pipeline,
            session,
            guard,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The bearer token store shared by the pipeline and the renewer.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn pipeline(&self) -> &Arc<ClientPipeline<T>> {
        &self.pipeline
    }

    pub fn session(&self) -> &Arc<SessionStore<ClientIdentity<T>>> {
        &self.session
    }

    pub fn guard(&self) -> &NavigationGuard<ClientIdentity<T>> {
        &self.guard
    }

    // -- API calls --------------------------------------------------------

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, WardenError> {
        Ok(self.pipeline.send(request).await?)
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, WardenError> {
        Ok(self.pipeline.get(path).await?)
    }

    /// Sends `request` and decodes the response body as JSON.
    pub async fn send_json<U: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<U, WardenError> {
        Ok(self.pipeline.send_json(request).await?)
    }

    /// Renews the credential now, joining a renewal already in flight.
    pub async fn renew(&self) -> Result<(), WardenError> {
        Ok(self.pipeline.coordinator().request_renewal().await?)
    }

    // -- session ----------------------------------------------------------

    pub async fn login(&self, username: &str, password: &str) -> Result<User, WardenError> {
        Ok(self.session.login(&LoginRequest::new(username, password)).await?)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, WardenError> {
        Ok(self.session.register(request).await?)
    }

    pub async fn logout(&self) {
        self.session.logout().await;
    }

    pub async fn restore_session(&self) -> Session {
        self.session.restore_session().await
    }

    // -- navigation -------------------------------------------------------

    pub async fn before_each(&self, full_path: &str) -> Decision {
        self.guard.before_each(full_path).await
    }

    /// Returns the path navigation to `full_path` actually lands on.
    pub async fn navigate(&self, full_path: &str) -> String {
        self.guard.navigate(full_path).await
    }
}
