/// Errors that can occur in the transport layer.
///
/// A transport error means the call never produced an HTTP response (or the
/// response could not be read). Error statuses such as 401 or 500 are not
/// transport errors; they arrive as an [`ApiResponse`](crate::ApiResponse).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP client failed (connect, TLS, body read).
    #[cfg(feature = "http")]
    #[error("http request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// The base URL or request path does not form a valid URL.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A request body could not be serialized to JSON.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A response body did not match the expected JSON shape.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The call did not complete within the configured timeout.
    #[error("request timed out")]
    TimedOut,

    /// The connection was closed before a response arrived.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimedOut
        } else {
            Self::Http(err)
        }
    }
}
