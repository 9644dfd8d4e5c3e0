//! Transport layer for Warden.
//!
//! Provides the request/response model ([`ApiRequest`], [`ApiResponse`]) and
//! the [`Transport`] trait that abstracts over how a call actually reaches
//! the API server. The layers above (refresh coordinator, request pipeline)
//! only ever talk to a `Transport`, so tests can script responses without a
//! network.
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpTransport`], backed by `reqwest` with a cookie
//!   store so server-issued session cookies travel with every call.

mod error;
#[cfg(feature = "http")]
mod http;
mod request;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use request::{ApiRequest, ApiResponse, Method};

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique request IDs.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one logical request.
///
/// A replayed call keeps the ID of the call it replays, which makes the
/// original attempt and its replay easy to correlate in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Allocates the next process-wide request ID.
    pub fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a `RequestId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Sends a single request to the API server and returns its response.
///
/// Any status code the server answers with, including 401, is a successful
/// transport round trip and comes back as `Ok(ApiResponse)`. Only failures
/// to reach the server or read its answer are `Err`.
pub trait Transport: Send + Sync + 'static {
    /// Sends the request and waits for the full response body.
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send {
        (**self).send(request)
    }
}
