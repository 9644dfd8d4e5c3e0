//! Error types for the pipeline layer.

use warden_refresh::RenewalError;
use warden_transport::{ApiResponse, Method, TransportError};

/// Errors returned by [`RequestPipeline`](crate::RequestPipeline).
///
/// An expired credential on an ordinary endpoint is not an error by
/// itself: the pipeline renews and replays. Only the outcomes below reach
/// the caller.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The call never produced a response, or its body did not decode.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status. The response is
    /// passed through unmodified.
    #[error("request failed: {0}")]
    Status(ApiResponse),

    /// The call needed a renewal and the renewal failed. Every call queued
    /// on the same renewal receives the same error.
    #[error("credential renewal failed: {0}")]
    RenewalFailed(#[source] RenewalError),

    /// The call was replayed after a successful renewal and the server
    /// rejected the fresh credential too. No second renewal is attempted.
    #[error("{method} {path} still unauthorized after credential renewal")]
    RetryExhausted { method: Method, path: String },
}

impl PipelineError {
    /// Returns the HTTP status behind this error, if there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(response) => Some(response.status),
            Self::RetryExhausted { .. } => Some(ApiResponse::UNAUTHORIZED),
            Self::Transport(_) | Self::RenewalFailed(_) => None,
        }
    }

    /// Returns the server's response for [`PipelineError::Status`].
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::Status(response) => Some(response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_of_each_variant() {
        assert_eq!(PipelineError::Status(ApiResponse::new(503)).status(), Some(503));
        assert_eq!(
            PipelineError::RetryExhausted {
                method: Method::Get,
                path: "/leases".into(),
            }
            .status(),
            Some(401)
        );
        assert_eq!(
            PipelineError::RenewalFailed(RenewalError::Abandoned).status(),
            None
        );
        assert_eq!(
            PipelineError::Transport(TransportError::TimedOut).status(),
            None
        );
    }

    #[test]
    fn test_retry_exhausted_display_names_call() {
        let err = PipelineError::RetryExhausted {
            method: Method::Get,
            path: "/leases".into(),
        };
        assert_eq!(
            err.to_string(),
            "GET /leases still unauthorized after credential renewal"
        );
    }

    #[test]
    fn test_from_transport_error() {
        let err: PipelineError = TransportError::TimedOut.into();
        assert!(matches!(err, PipelineError::Transport(_)));
        assert!(err.response().is_none());
    }
}
