//! Error types for the session layer.

/// Errors from session operations.
///
/// Only `login` and `register` surface these to the caller. Session
/// restore and logout absorb them and settle on a definite state instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The request failed local validation and was never sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The server refused the operation (wrong password, duplicate
    /// username, no active session, ...).
    #[error("rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The identity service could not be reached.
    #[error("identity service unreachable: {0}")]
    Transport(String),

    /// The server answered, but not with the expected shape.
    #[error("malformed identity response: {0}")]
    Malformed(String),
}
