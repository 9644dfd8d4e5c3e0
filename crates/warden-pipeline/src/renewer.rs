//! Renewal through the server's refresh endpoint.

use serde::Deserialize;
use warden_refresh::{RenewalError, Renewer};
use warden_transport::{ApiRequest, Transport};

use crate::{AuthEndpoints, TokenStore};

/// Optional fields of a refresh response this renewer understands.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenewedCredential {
    #[serde(default)]
    access_token: Option<String>,
}

/// A [`Renewer`] that POSTs to the refresh endpoint.
///
/// The call goes straight to the transport, bypassing the pipeline, so a
/// 401 from the refresh endpoint is a plain renewal failure and can never
/// trigger another renewal. The long-lived session artifact (usually an
/// HttpOnly cookie) is whatever the transport carries on its own.
///
/// When a [`TokenStore`] is attached and the response body contains an
/// `accessToken`, that token replaces the stored one before the renewal
/// reports success, so replays pick it up.
pub struct EndpointRenewer<T: Transport> {
    transport: T,
    path: String,
    tokens: Option<TokenStore>,
}

impl<T: Transport> EndpointRenewer<T> {
    /// Creates a renewer that posts to `endpoints.refresh`.
    pub fn new(transport: T, endpoints: &AuthEndpoints) -> Self {
        Self {
            transport,
            path: endpoints.refresh.clone(),
            tokens: None,
        }
    }

    /// Stores renewed access tokens into `store`.
    pub fn with_token_store(mut self, store: TokenStore) -> Self {
        self.tokens = Some(store);
        self
    }
}

impl<T: Transport> Renewer for EndpointRenewer<T> {
    async fn renew(&self) -> Result<(), RenewalError> {
        let response = self.transport.send(ApiRequest::post(&self.path)).await?;
        if !response.is_success() {
            return Err(RenewalError::Rejected {
                status: response.status,
            });
        }

        if let Some(store) = &self.tokens {
            // The body is optional; cookie-only servers send nothing useful.
            let renewed: RenewedCredential = response.json().unwrap_or_default();
            if let Some(token) = renewed.access_token {
                store.set(token);
                tracing::debug!("stored renewed access token");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;
    use warden_transport::{ApiResponse, TransportError};

    use super::*;

    /// Answers every call with a fixed result and records the paths.
    struct FixedTransport {
        reply: Mutex<Option<Result<ApiResponse, TransportError>>>,
        paths: Mutex<Vec<String>>,
    }

    impl FixedTransport {
        fn new(reply: Result<ApiResponse, TransportError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                paths: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for FixedTransport {
        async fn send(
            &self,
            request: ApiRequest,
        ) -> Result<ApiResponse, TransportError> {
            self.paths.lock().push(request.path);
            self.reply
                .lock()
                .take()
                .unwrap_or(Err(TransportError::ConnectionClosed("used".into())))
        }
    }

    #[tokio::test]
    async fn test_renew_success_posts_refresh_endpoint() {
        let transport = FixedTransport::new(Ok(ApiResponse::new(200)));
        let renewer =
            EndpointRenewer::new(Arc::clone(&transport), &AuthEndpoints::default());

        renewer.renew().await.expect("should renew");

        assert_eq!(*transport.paths.lock(), vec!["/auth/refresh-token"]);
    }

    #[tokio::test]
    async fn test_renew_stores_access_token_from_body() {
        let transport = FixedTransport::new(Ok(ApiResponse::with_json(
            200,
            &json!({ "accessToken": "fresh", "message": "ok" }),
        )));
        let store = TokenStore::with_token("stale");
        let renewer = EndpointRenewer::new(transport, &AuthEndpoints::default())
            .with_token_store(store.clone());

        renewer.renew().await.unwrap();

        assert_eq!(store.token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_renew_body_without_token_keeps_existing() {
        let transport = FixedTransport::new(Ok(ApiResponse::new(204)));
        let store = TokenStore::with_token("kept");
        let renewer = EndpointRenewer::new(transport, &AuthEndpoints::default())
            .with_token_store(store.clone());

        renewer.renew().await.unwrap();

        assert_eq!(store.token().as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn test_renew_unauthorized_returns_rejected() {
        let transport = FixedTransport::new(Ok(ApiResponse::new(401)));
        let renewer = EndpointRenewer::new(transport, &AuthEndpoints::default());

        let result = renewer.renew().await;

        assert!(matches!(result, Err(RenewalError::Rejected { status: 401 })));
    }

    #[tokio::test]
    async fn test_renew_transport_failure_returns_transport_error() {
        let transport = FixedTransport::new(Err(TransportError::TimedOut));
        let renewer = EndpointRenewer::new(transport, &AuthEndpoints::default());

        let result = renewer.renew().await;

        assert!(matches!(result, Err(RenewalError::Transport(_))));
    }
}
