//! The session store: owns the client's one session.
//!
//! Responsibilities:
//! - Restoring a session the server may still hold ("who am I")
//! - Logging in, registering, and logging out
//! - Answering identity and role queries for the navigation guard
//! - Broadcasting a [`SessionEvent`] for every completed transition
//!
//! # Concurrency note
//!
//! The [`Session`] lives behind a `parking_lot::RwLock` that is only held
//! for short reads and writes, never across an `.await`. Restores are
//! serialized by a separate `tokio::sync::Mutex` so that callers arriving
//! during a hydration share its result instead of asking the server again.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::{
    IdentityApi, LoginRequest, RegisterRequest, Session, SessionError, SessionState,
    User,
};

/// Capacity of the event channel. Slow subscribers skip ahead rather than
/// holding up transitions.
const EVENT_CAPACITY: usize = 32;

/// Something that happened to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn(User),
    Registered(User),
    /// The server still held a session for this client.
    Restored(User),
    /// A restore found no session; the client is anonymous.
    RestoreFailed,
    LoggedOut,
}

/// Tracks who is using the client.
///
/// ## Lifecycle
///
/// ```text
///  [Unknown]/[Anonymous]
///       │
///       ├── restore_session() ──→ [Hydrating] ──ok──→ [Authenticated]
///       │                              │
///       │                              └──err──→ [Anonymous]
///       │
///       └── login() / register() ──ok──→ [Authenticated]
///
///  any state ── logout() ──→ [Anonymous]
/// ```
///
/// Every completed operation marks the session initialized, and nothing
/// ever clears that flag.
pub struct SessionStore<A: IdentityApi> {
    api: A,
    session: RwLock<Session>,
    /// Held for the duration of a restore.
    hydration: tokio::sync::Mutex<()>,
    /// Number of completed restores. A waiter that sees this move while it
    /// queued knows a restore finished on its behalf.
    hydrations: AtomicU64,
    /// Bumped by every login, registration, and logout. A restore whose
    /// answer arrives after one of these is stale and only initializes.
    transitions: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl<A: IdentityApi> SessionStore<A> {
    pub fn new(api: A) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            session: RwLock::new(Session::new()),
            hydration: tokio::sync::Mutex::new(()),
            hydrations: AtomicU64::new(0),
            transitions: AtomicU64::new(0),
            events,
        }
    }

    /// Returns the identity API this store calls.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Asks the server who is logged in and adopts the answer.
    ///
    /// Never fails: any error, whether the server has no session for this
    /// client or could not be reached, lands the session in `Anonymous`.
    /// If a restore is already running, this waits for it and returns its
    /// outcome without a second call.
    ///
    /// An already authenticated session stays `Authenticated` while the
    /// call runs; only an identity-less session passes through `Hydrating`.
    /// A login, registration, or logout that completes while the call is
    /// out wins: the restore's answer is discarded and no event is sent.
    pub async fn restore_session(&self) -> Session {
        let seen = self.hydrations.load(Ordering::Acquire);
        let _running = self.hydration.lock().await;
        if self.hydrations.load(Ordering::Acquire) != seen {
            tracing::debug!("joined a restore that was already running");
            return self.snapshot();
        }

        let mut rollback = HydrationRollback::begin(&self.session, &self.transitions);
        let started = rollback.started;
        let (state, event) = match self.api.me().await {
            Ok(user) => (
                SessionState::Authenticated(user.clone()),
                SessionEvent::Restored(user),
            ),
            Err(e) => {
                tracing::debug!(error = %e, "no session to restore");
                (SessionState::Anonymous, SessionEvent::RestoreFailed)
            }
        };
        rollback.disarm();

        let applied = self.complete_restore(started, state);
        self.hydrations.fetch_add(1, Ordering::Release);
        if applied {
            if let SessionEvent::Restored(user) = &event {
                tracing::info!(user_id = user.id, username = %user.username, "session restored");
            }
            self.publish(event);
        } else {
            tracing::debug!("session changed while restoring, discarding stale answer");
        }
        self.snapshot()
    }

    /// Logs in with username and password.
    ///
    /// # Errors
    /// [`SessionError::InvalidInput`] if the form fails validation (nothing
    /// is sent), otherwise whatever the identity API reports. On error the
    /// session is left exactly as it was.
    pub async fn login(&self, request: &LoginRequest) -> Result<User, SessionError> {
        request.validate()?;

        let user = {
            let _loading = LoadingFlag::raise(&self.session);
            self.api.login(request).await.inspect_err(|e| {
                tracing::warn!(username = %request.username, error = %e, "login failed");
            })?
        };

        tracing::info!(user_id = user.id, username = %user.username, "logged in");
        self.complete(SessionState::Authenticated(user.clone()));
        self.publish(SessionEvent::LoggedIn(user.clone()));
        Ok(user)
    }

    /// Creates an account and logs in as it.
    ///
    /// # Errors
    /// Same contract as [`SessionStore::login`].
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, SessionError> {
        request.validate()?;

        let user = {
            let _loading = LoadingFlag::raise(&self.session);
            self.api.register(request).await.inspect_err(|e| {
                tracing::warn!(username = %request.username, error = %e, "registration failed");
            })?
        };

        tracing::info!(user_id = user.id, username = %user.username, "registered");
        self.complete(SessionState::Authenticated(user.clone()));
        self.publish(SessionEvent::Registered(user.clone()));
        Ok(user)
    }

    /// Ends the session.
    ///
    /// The server is told first, but its answer does not matter: the local
    /// session always ends up `Anonymous`.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "server logout failed; clearing local session anyway");
        }
        self.complete(SessionState::Anonymous);
        tracing::info!("logged out");
        self.publish(SessionEvent::LoggedOut);
    }

    // -- queries ----------------------------------------------------------

    pub fn snapshot(&self) -> Session {
        self.session.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_authenticated()
    }

    pub fn is_initialized(&self) -> bool {
        self.session.read().is_initialized()
    }

    pub fn is_loading(&self) -> bool {
        self.session.read().is_loading()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.session.read().has_role(role)
    }

    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.session.read().has_any_role(roles)
    }

    pub fn roles(&self) -> Vec<String> {
        self.session.read().roles()
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Option<User> {
        self.session.read().identity().cloned()
    }

    /// Subscribes to session transitions from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Applies the outcome of a login, registration, or logout.
    fn complete(&self, state: SessionState) {
        let mut session = self.session.write();
        self.transitions.fetch_add(1, Ordering::AcqRel);
        session.set_state(state);
        session.mark_initialized();
    }

    /// Applies a restore's answer unless a transition completed since
    /// `started`. Returns whether the answer was applied.
    fn complete_restore(&self, started: u64, state: SessionState) -> bool {
        let mut session = self.session.write();
        session.mark_initialized();
        if self.transitions.load(Ordering::Acquire) != started {
            return false;
        }
        session.set_state(state);
        true
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Puts an identity-less session into `Hydrating` and, if the restore is
/// dropped before it completes, puts the previous state back.
///
/// Also records the transition count seen while entering, so the restore
/// can tell whether its answer is still current.
struct HydrationRollback<'a> {
    session: &'a RwLock<Session>,
    previous: Option<SessionState>,
    started: u64,
}

impl<'a> HydrationRollback<'a> {
    fn begin(session: &'a RwLock<Session>, transitions: &AtomicU64) -> Self {
        let mut guard = session.write();
        let started = transitions.load(Ordering::Acquire);
        let previous = if guard.is_authenticated() {
            None
        } else {
            let previous = guard.state().clone();
            guard.set_state(SessionState::Hydrating);
            Some(previous)
        };
        Self {
            session,
            previous,
            started,
        }
    }

    fn disarm(&mut self) {
        self.previous = None;
    }
}

impl Drop for HydrationRollback<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            let mut session = self.session.write();
            if *session.state() == SessionState::Hydrating {
                session.set_state(previous);
            }
        }
    }
}

/// Raises `loading` for as long as it lives.
struct LoadingFlag<'a> {
    session: &'a RwLock<Session>,
}

impl<'a> LoadingFlag<'a> {
    fn raise(session: &'a RwLock<Session>) -> Self {
        session.write().set_loading(true);
        Self { session }
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.session.write().set_loading(false);
    }
}
