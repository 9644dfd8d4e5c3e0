//! Single-flight credential renewal for Warden.
//!
//! When several requests discover at the same moment that their access
//! credential has expired, only one of them may ask the server for a new
//! one. This crate provides that coordination:
//!
//! 1. **Renewal hook**: the [`Renewer`] trait, the one operation that
//!    actually obtains a fresh credential
//! 2. **Coordination**: [`RefreshCoordinator`], which runs at most one
//!    renewal at a time and hands its outcome to every caller that queued
//!    behind it
//!
//! # How it fits in the stack
//!
//! ```text
//! Request Pipeline (above)  ← asks for renewal after a 401, then replays
//!     ↕
//! Refresh layer (this crate)  ← deduplicates renewal, fans out the outcome
//!     ↕
//! Transport (below)  ← carries the renewal call itself
//! ```

mod coordinator;
mod error;
mod renewer;

pub use coordinator::{RefreshConfig, RefreshCoordinator};
pub use error::RenewalError;
pub use renewer::Renewer;
