//! Route access policy for Warden.
//!
//! Before the client shows a route, it asks the [`NavigationGuard`] whether
//! the current session may see it. The answer is a [`Decision`]: go ahead,
//! or go somewhere else (the login route, carrying the original path, or
//! the default route).
//!
//! The policy itself is [`decide`], a pure function of the route's
//! [`RouteRequirement`], a session snapshot, and the [`GuardConfig`]. The
//! guard adds the one impure step: making sure the session has been
//! restored before a protected route is judged.

mod config;
mod decision;
mod guard;
mod route;

pub use config::GuardConfig;
pub use decision::{Decision, decide, return_target};
pub use guard::NavigationGuard;
pub use route::{Route, RouteRequirement, RouteTable};
