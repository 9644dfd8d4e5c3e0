//! Credentials and where the pipeline reads them from.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// An access credential attached to outgoing calls.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Sent as `Authorization: Bearer <token>`.
    Bearer(String),
}

impl Credential {
    /// Returns the header name and value that carry this credential.
    pub fn header(&self) -> (&'static str, String) {
        match self {
            Self::Bearer(token) => ("Authorization", format!("Bearer {token}")),
        }
    }
}

/// Tokens stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// Read-only access to the current credential.
///
/// The pipeline calls this once per attempt, so the replay after a renewal
/// sees whatever the renewal stored. Implementations must not block and
/// must not mutate anything.
pub trait CredentialProvider: Send + Sync + 'static {
    /// Returns the credential to attach, or `None` to send the call bare.
    fn credential(&self) -> Option<Credential>;
}

impl<P: CredentialProvider> CredentialProvider for Arc<P> {
    fn credential(&self) -> Option<Credential> {
        (**self).credential()
    }
}

// ---------------------------------------------------------------------------
// TokenStore
// ---------------------------------------------------------------------------

/// An in-memory bearer token shared between the pipeline (reader) and
/// whoever obtains tokens (login flow, [`EndpointRenewer`](crate::EndpointRenewer)).
///
/// Cloning is cheap and every clone sees the same token.
#[derive(Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(token);
        store
    }

    /// Replaces the stored token.
    pub fn set(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Removes the stored token.
    pub fn clear(&self) {
        *self.token.write() = None;
    }

    /// Returns a copy of the stored token.
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &self.token.read().is_some())
            .finish()
    }
}

impl CredentialProvider for TokenStore {
    fn credential(&self) -> Option<Credential> {
        self.token().map(Credential::Bearer)
    }
}
