//! The renewal hook.
//!
//! The coordinator does not know how a credential is renewed. The usual
//! implementation posts to the server's refresh endpoint (see
//! `warden_pipeline::EndpointRenewer`), but tests plug in scripted renewers
//! and an application may renew through an entirely different channel.

use std::future::Future;
use std::sync::Arc;

use crate::RenewalError;

/// Obtains a fresh access credential.
///
/// # Trait bounds
///
/// - `Send + Sync` → one renewer is shared by every request through the
///   coordinator, possibly from different runtime threads.
/// - `'static` → it lives as long as the client.
///
/// # Example
///
/// ```rust
/// use warden_refresh::{Renewer, RenewalError};
///
/// /// Always succeeds. Useful when the server renews sessions on its own.
/// struct NoopRenewer;
///
/// impl Renewer for NoopRenewer {
///     async fn renew(&self) -> Result<(), RenewalError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Renewer: Send + Sync + 'static {
    /// Performs one renewal attempt.
    ///
    /// Called by [`RefreshCoordinator`](crate::RefreshCoordinator) only,
    /// never concurrently with itself on the same coordinator.
    fn renew(
        &self,
    ) -> impl Future<Output = Result<(), RenewalError>> + Send;
}

impl<R: Renewer> Renewer for Arc<R> {
    fn renew(
        &self,
    ) -> impl Future<Output = Result<(), RenewalError>> + Send {
        (**self).renew()
    }
}
