//! Error types for the refresh layer.

use std::sync::Arc;
use std::time::Duration;

use warden_transport::TransportError;

/// Why a credential renewal did not succeed.
///
/// One renewal outcome is delivered to every request queued behind it, so
/// this type is `Clone`. Transport errors are not `Clone` themselves and are
/// shared behind an `Arc`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenewalError {
    /// The server answered the renewal call with a non-success status,
    /// typically because the long-lived session artifact is gone or expired.
    #[error("credential renewal rejected with status {status}")]
    Rejected { status: u16 },

    /// The renewal call never produced a response.
    #[error("credential renewal failed: {0}")]
    Transport(#[source] Arc<TransportError>),

    /// The renewal call did not settle within the configured limit.
    #[error("credential renewal timed out after {0:?}")]
    TimedOut(Duration),

    /// The task driving the renewal was dropped before it settled.
    #[error("credential renewal abandoned before it settled")]
    Abandoned,
}

impl From<TransportError> for RenewalError {
    fn from(err: TransportError) -> Self {
        Self::Transport(Arc::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error_wraps_and_keeps_message() {
        let err: RenewalError =
            TransportError::ConnectionClosed("reset".into()).into();
        assert!(matches!(err, RenewalError::Transport(_)));
        assert!(err.to_string().contains("reset"));
    }

    #[test]
    fn test_clone_shares_transport_error() {
        let err: RenewalError = TransportError::TimedOut.into();
        let copy = err.clone();
        match (err, copy) {
            (RenewalError::Transport(a), RenewalError::Transport(b)) => {
                assert!(Arc::ptr_eq(&a, &b));
            }
            _ => panic!("expected transport variants"),
        }
    }

    #[test]
    fn test_rejected_display_includes_status() {
        let err = RenewalError::Rejected { status: 401 };
        assert_eq!(err.to_string(), "credential renewal rejected with status 401");
    }
}
