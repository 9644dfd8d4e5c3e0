//! # Warden
//!
//! Session-aware HTTP client for single-page style applications.
//!
//! Warden keeps a user session alive across an HTTP API whose credentials
//! expire. Concurrent calls that hit an expired credential share a single
//! renewal and replay once it succeeds; the session state machine tracks
//! who is logged in; a navigation guard decides which routes they may see.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use warden::prelude::*;
//!
//! # async fn run() -> Result<(), WardenError> {
//! warden::init_tracing();
//!
//! let client = WardenClient::builder()
//!     .base_url("http://localhost:8080/api")
//!     .routes(
//!         RouteTable::new()
//!             .route("dashboard", "/", RouteRequirement::authenticated())
//!             .route("login", "/login", RouteRequirement::guest_only()),
//!     )
//!     .build()?;
//!
//! // Where does a visit to the dashboard land?
//! let location = client.navigate("/").await;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod identity;

pub use client::{ClientIdentity, ClientPipeline, ClientRenewer, WardenClient, WardenClientBuilder};
pub use config::ClientConfig;
pub use error::WardenError;
pub use identity::HttpIdentityApi;

pub use warden_guard as guard;
pub use warden_pipeline as pipeline;
pub use warden_refresh as refresh;
pub use warden_session as session;
pub use warden_transport as transport;

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber that prints to stderr.
///
/// Verbosity comes from `RUST_LOG` (for example `warden=debug`), falling
/// back to `info`. Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub mod prelude {
    //! The types most applications need.

    pub use crate::{ClientConfig, WardenClient, WardenClientBuilder, WardenError};
    pub use warden_guard::{Decision, GuardConfig, NavigationGuard, RouteRequirement, RouteTable};
    pub use warden_pipeline::{AuthEndpoints, PipelineError, TokenStore};
    pub use warden_session::{
        LoginRequest, RegisterRequest, Session, SessionError, SessionEvent, SessionState, User,
    };
    pub use warden_transport::{ApiRequest, ApiResponse, Method, Transport};
}
