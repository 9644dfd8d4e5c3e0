//! Request and response types shared by every layer.
//!
//! These are deliberately plain data: a request is a method, a path relative
//! to the API base, query pairs, headers, and an optional JSON body. Keeping
//! them independent of `reqwest` means a request can be cloned, inspected,
//! and replayed without touching the HTTP client.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::TransportError;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// ApiRequest
// ---------------------------------------------------------------------------

/// An outgoing API call.
///
/// `path` is relative to the transport's base URL and always starts with
/// `/` (for example `/auth/me` or `/properties`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Creates a request with no query, headers, or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self {
            method,
            path,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Serializes `body` as the JSON request body.
    ///
    /// # Errors
    /// Returns [`TransportError::Encode`] if `body` cannot be represented
    /// as JSON (for example a map with non-string keys).
    pub fn json<T: Serialize + ?Sized>(
        mut self,
        body: &T,
    ) -> Result<Self, TransportError> {
        let value =
            serde_json::to_value(body).map_err(TransportError::Encode)?;
        self.body = Some(value);
        Ok(self)
    }

    /// Appends a query parameter.
    pub fn query(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Sets a header, replacing any existing header of the same name.
    ///
    /// Header names compare case-insensitively.
    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.set_header(name, value);
        self
    }

    /// In-place form of [`with_header`](Self::with_header).
    pub fn set_header(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Returns the value of the named header, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// ApiResponse
// ---------------------------------------------------------------------------

/// A response received from the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Status code signalling a missing, expired, or invalid credential.
    pub const UNAUTHORIZED: u16 = 401;

    /// Creates a response with an empty body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Creates a response whose body is the given JSON value.
    pub fn with_json(status: u16, value: &serde_json::Value) -> Self {
        Self {
            status,
            headers: vec![(
                "content-type".to_string(),
                "application/json".to_string(),
            )],
            body: value.to_string().into_bytes(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `true` if the server rejected the presented credential.
    pub fn is_unauthorized(&self) -> bool {
        self.status == Self::UNAUTHORIZED
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    /// Returns [`TransportError::Decode`] if the body is not valid JSON for
    /// `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_slice(&self.body).map_err(TransportError::Decode)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns the value of the named header, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)
    }
}
