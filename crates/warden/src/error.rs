//! Unified error type for the Warden client.

use warden_pipeline::PipelineError;
use warden_refresh::RenewalError;
use warden_session::SessionError;
use warden_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `warden` facade you deal with this single error type
/// instead of importing errors from each sub-crate. `?` converts sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// The call never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Credential renewal failed outside of a pipeline call.
    #[error(transparent)]
    Renewal(#[from] RenewalError),

    /// An API call failed after the pipeline did what it could.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Login, registration, or another session operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The client configuration could not be read.
    #[error("invalid configuration: {0}")]
    Config(String),
}
