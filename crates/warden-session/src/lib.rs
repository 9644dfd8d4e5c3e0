//! Client-side session state for Warden.
//!
//! This crate answers "who is using the client right now?":
//!
//! 1. **Identity calls**: the [`IdentityApi`] trait (who am I, login,
//!    register, logout), implemented over HTTP by the `warden` crate and by
//!    mocks in tests
//! 2. **State machine**: [`SessionStore`], which owns the current
//!    [`Session`] and moves it between [`SessionState`]s
//! 3. **Notifications**: [`SessionEvent`]s broadcast on every transition
//!
//! # How it fits in the stack
//!
//! ```text
//! Navigation Guard (above)  ← reads the session, triggers hydration
//!     ↕
//! Session layer (this crate)  ← owns identity + initialization status
//!     ↕
//! IdentityApi (below)  ← usually the request pipeline
//! ```

mod error;
mod identity;
mod session;
mod store;
mod user;

pub use error::SessionError;
pub use identity::IdentityApi;
pub use session::{Session, SessionState};
pub use store::{SessionEvent, SessionStore};
pub use user::{LoginRequest, RegisterRequest, User};
