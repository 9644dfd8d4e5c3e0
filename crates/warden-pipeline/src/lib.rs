//! Request pipeline for Warden.
//!
//! Every API call the client makes goes through a [`RequestPipeline`]:
//!
//! 1. **Attach**: the current credential from a [`CredentialProvider`] is
//!    added to a copy of the request (the caller's request is untouched)
//! 2. **Send**: the request goes out over a
//!    [`Transport`](warden_transport::Transport)
//! 3. **Recover**: a 401 on an ordinary endpoint asks the shared
//!    [`RefreshCoordinator`](warden_refresh::RefreshCoordinator) for a
//!    renewal and replays the call once with the fresh credential
//!
//! Calls to the identity endpoints themselves (login, register, logout,
//! "who am I", refresh) never trigger renewal. A 401 there is the answer.

mod credential;
mod descriptor;
mod endpoints;
mod error;
mod pipeline;
mod renewer;

pub use credential::{Credential, CredentialProvider, TokenStore};
pub use descriptor::RequestDescriptor;
pub use endpoints::AuthEndpoints;
pub use error::PipelineError;
pub use pipeline::RequestPipeline;
pub use renewer::EndpointRenewer;
