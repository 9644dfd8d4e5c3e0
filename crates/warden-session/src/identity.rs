//! The identity service hook.
//!
//! [`SessionStore`](crate::SessionStore) does not know how identity calls
//! reach the server. Production wires in `warden::HttpIdentityApi`, which
//! routes them through the request pipeline; tests use scripted mocks.

use std::future::Future;
use std::sync::Arc;

use crate::{LoginRequest, RegisterRequest, SessionError, User};

/// The server operations that establish, report, and end a session.
///
/// # Example
///
/// ```rust
/// use warden_session::{IdentityApi, LoginRequest, RegisterRequest, SessionError, User};
///
/// /// Nobody is ever logged in.
/// struct Offline;
///
/// impl IdentityApi for Offline {
///     async fn me(&self) -> Result<User, SessionError> {
///         Err(SessionError::Transport("offline".into()))
///     }
///     async fn login(&self, _: &LoginRequest) -> Result<User, SessionError> {
///         Err(SessionError::Transport("offline".into()))
///     }
///     async fn register(&self, _: &RegisterRequest) -> Result<User, SessionError> {
///         Err(SessionError::Transport("offline".into()))
///     }
///     async fn logout(&self) -> Result<(), SessionError> {
///         Ok(())
///     }
/// }
/// ```
pub trait IdentityApi: Send + Sync + 'static {
    /// Returns the user the server associates with this client, if any.
    fn me(&self) -> impl Future<Output = Result<User, SessionError>> + Send;

    /// Authenticates with username and password.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<User, SessionError>> + Send;

    /// Creates an account and authenticates as it.
    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<User, SessionError>> + Send;

    /// Tells the server to end the session.
    fn logout(&self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

impl<A: IdentityApi> IdentityApi for Arc<A> {
    fn me(&self) -> impl Future<Output = Result<User, SessionError>> + Send {
        (**self).me()
    }

    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<User, SessionError>> + Send {
        (**self).login(request)
    }

    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<User, SessionError>> + Send {
        (**self).register(request)
    }

    fn logout(&self) -> impl Future<Output = Result<(), SessionError>> + Send {
        (**self).logout()
    }
}
