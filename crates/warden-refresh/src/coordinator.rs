//! The refresh coordinator: at most one renewal in flight, outcome fanned
//! out to everyone waiting on it.
//!
//! # Concurrency note
//!
//! The coordinator's state sits behind a `parking_lot::Mutex` that is only
//! ever held for a few instructions and never across an `.await`. The
//! critical section "check `in_flight`, then either claim it or enqueue" is
//! therefore atomic with respect to every other caller, on a single-threaded
//! or a multi-threaded runtime alike.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::{RenewalError, Renewer};

/// A caller parked until the in-flight renewal settles.
type Waiter = oneshot::Sender<Result<(), RenewalError>>;

// ---------------------------------------------------------------------------
// RefreshConfig
// ---------------------------------------------------------------------------

/// Configuration for renewal behavior.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Upper bound on a single renewal attempt. When it elapses the attempt
    /// fails with [`RenewalError::TimedOut`] for the initiator and every
    /// queued caller.
    ///
    /// Default: 10 seconds. `None` waits indefinitely.
    pub renewal_timeout: Option<Duration>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            renewal_timeout: Some(Duration::from_secs(10)),
        }
    }
}

// ---------------------------------------------------------------------------
// RefreshCoordinator
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CoordinatorState {
    /// True while exactly one renewal attempt is running.
    in_flight: bool,

    /// Callers that arrived while `in_flight` was true, in arrival order.
    waiters: Vec<Waiter>,
}

/// Runs at most one credential renewal at a time.
///
/// ## Lifecycle
///
/// ```text
///              request_renewal()                     renewal settles
///   [Idle] ───────────────────────→ [InFlight] ─────────────────────→ [Idle]
///                                      │  ↑                    (waiters drained,
///                     request_renewal()│  │                     in enqueue order)
///                                      ▼  │
///                                  enqueue waiter
/// ```
///
/// Construct one per client and share it (`Arc`) with every pipeline that
/// should deduplicate renewal against the others.
pub struct RefreshCoordinator<R: Renewer> {
    renewer: R,
    config: RefreshConfig,
    state: Mutex<CoordinatorState>,
    renewals: AtomicU64,
}

impl<R: Renewer> RefreshCoordinator<R> {
    /// Creates an idle coordinator around the given renewer.
    pub fn new(renewer: R, config: RefreshConfig) -> Self {
        Self {
            renewer,
            config,
            state: Mutex::new(CoordinatorState::default()),
            renewals: AtomicU64::new(0),
        }
    }

    /// Returns the renewer this coordinator drives.
    pub fn renewer(&self) -> &R {
        &self.renewer
    }

    /// Requests a credential renewal and waits for its outcome.
    ///
    /// If no renewal is running, this call starts one and returns its
    /// result. If one is already running, this call does not start another;
    /// it waits for the running one and returns the same result.
    ///
    /// A failure is final for everyone waiting on that attempt, but the
    /// coordinator is idle again afterwards: the next call starts a fresh
    /// attempt.
    ///
    /// # Errors
    /// Returns the [`RenewalError`] of the attempt this call was attached
    /// to.
    pub async fn request_renewal(&self) -> Result<(), RenewalError> {
        let queued = {
            let mut state = self.state.lock();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                tracing::debug!(
                    position = state.waiters.len(),
                    "renewal already in flight, waiting on it"
                );
                Some(rx)
            } else {
                state.in_flight = true;
                None
            }
        };

        if let Some(rx) = queued {
            // A dropped sender without a value can only come from a
            // release path that skipped this waiter.
            return rx.await.unwrap_or(Err(RenewalError::Abandoned));
        }

        let attempt = self.renewals.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(attempt, "credential renewal started");

        let mut guard = SettleGuard {
            state: &self.state,
            settled: false,
        };
        let outcome = self.run_renewal().await;
        let released = guard.settle(&outcome);

        match &outcome {
            Ok(()) => {
                tracing::info!(attempt, released, "credential renewal succeeded");
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    released,
                    error = %e,
                    "credential renewal failed"
                );
            }
        }
        outcome
    }

    /// Returns `true` while a renewal attempt is running.
    pub fn is_in_flight(&self) -> bool {
        self.state.lock().in_flight
    }

    /// Returns the number of callers currently waiting on the running
    /// attempt. Always 0 while idle.
    pub fn pending_waiters(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Returns how many renewal attempts this coordinator has started.
    pub fn renewals_started(&self) -> u64 {
        self.renewals.load(Ordering::Relaxed)
    }

    async fn run_renewal(&self) -> Result<(), RenewalError> {
        match self.config.renewal_timeout {
            Some(limit) => tokio::time::timeout(limit, self.renewer.renew())
                .await
                .unwrap_or(Err(RenewalError::TimedOut(limit))),
            None => self.renewer.renew().await,
        }
    }
}

/// Releases the coordinator when the initiating future finishes or is
/// dropped mid-renewal.
///
/// Without this, cancelling the initiator would leave `in_flight` set and
/// every queued caller parked forever.
struct SettleGuard<'a> {
    state: &'a Mutex<CoordinatorState>,
    settled: bool,
}

impl SettleGuard<'_> {
    fn settle(&mut self, outcome: &Result<(), RenewalError>) -> usize {
        self.settled = true;
        release(self.state, outcome)
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let released = release(self.state, &Err(RenewalError::Abandoned));
            tracing::warn!(released, "credential renewal abandoned");
        }
    }
}

/// Clears `in_flight` and notifies every waiter, oldest first.
///
/// The lock is released before notifying, so a waiter that immediately
/// requests another renewal finds the coordinator idle.
fn release(
    state: &Mutex<CoordinatorState>,
    outcome: &Result<(), RenewalError>,
) -> usize {
    let waiters = {
        let mut state = state.lock();
        state.in_flight = false;
        std::mem::take(&mut state.waiters)
    };

    let count = waiters.len();
    for waiter in waiters {
        // The receiver is gone if that caller was cancelled; nothing to do.
        let _ = waiter.send(outcome.clone());
    }
    count
}

// =========================================================================
// Tests
// =========================================================================
