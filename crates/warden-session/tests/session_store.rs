//! Integration tests for `SessionStore` against a scripted identity API.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::broadcast::error::TryRecvError;
use warden_session::{
    IdentityApi, LoginRequest, RegisterRequest, SessionError, SessionEvent,
    SessionState, SessionStore, User,
};

// =========================================================================
// Scripted identity API
// =========================================================================

#[derive(Default)]
struct ScriptedApi {
    /// Who `me` reports; `None` answers 401.
    current: Mutex<Option<User>>,
    /// Who `login` and `register` authenticate as; `None` answers 401.
    accepts: Mutex<Option<User>>,
    logout_fails: AtomicBool,
    delay: Mutex<Duration>,
    me_calls: AtomicUsize,
    login_calls: AtomicUsize,
    register_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

impl ScriptedApi {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_current(user: User) -> Arc<Self> {
        let api = Self::new();
        *api.current.lock() = Some(user);
        api
    }

    fn unauthorized() -> SessionError {
        SessionError::Rejected {
            status: 401,
            message: "Unauthorized".into(),
        }
    }

    async fn pause(&self) {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl IdentityApi for ScriptedApi {
    async fn me(&self) -> Result<User, SessionError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.current.lock().clone().ok_or_else(Self::unauthorized)
    }

    async fn login(&self, _: &LoginRequest) -> Result<User, SessionError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.accepts.lock().clone().ok_or_else(Self::unauthorized)
    }

    async fn register(&self, _: &RegisterRequest) -> Result<User, SessionError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.accepts.lock().clone().ok_or_else(|| SessionError::Rejected {
            status: 400,
            message: "Username is already taken".into(),
        })
    }

    async fn logout(&self) -> Result<(), SessionError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails.load(Ordering::SeqCst) {
            return Err(SessionError::Transport("connection refused".into()));
        }
        Ok(())
    }
}

fn alice() -> User {
    User::new(1, "alice", ["ROLE_TENANT"])
}

fn registration() -> RegisterRequest {
    RegisterRequest::new("newbie", "newbie@example.com", "secret1")
}

// =========================================================================
// restore_session
// =========================================================================

#[tokio::test]
async fn test_restore_session_server_has_session_authenticates() {
    let api = ScriptedApi::with_current(alice());
    let store = SessionStore::new(Arc::clone(&api));

    let session = store.restore_session().await;

    assert_eq!(session.identity(), Some(&alice()));
    assert!(session.is_initialized());
    assert!(store.is_authenticated());
    assert!(store.has_role("ROLE_TENANT"));
    assert_eq!(store.roles(), vec!["ROLE_TENANT".to_string()]);
}

#[tokio::test]
async fn test_restore_session_no_session_becomes_anonymous_without_error() {
    let api = ScriptedApi::new();
    let store = SessionStore::new(Arc::clone(&api));

    let session = store.restore_session().await;

    assert_eq!(session.state(), &SessionState::Anonymous);
    assert!(session.is_initialized());
    assert!(store.user().is_none());
}

#[tokio::test]
async fn test_restore_session_concurrent_callers_share_one_call() {
    let api = ScriptedApi::with_current(alice());
    *api.delay.lock() = Duration::from_millis(20);
    let store = SessionStore::new(Arc::clone(&api));

    let sessions = join_all((0..4).map(|_| store.restore_session())).await;

    assert_eq!(api.me_calls.load(Ordering::SeqCst), 1);
    for session in sessions {
        assert_eq!(session.identity(), Some(&alice()));
    }
}

#[tokio::test]
async fn test_restore_session_sequential_calls_each_ask_server() {
    let api = ScriptedApi::with_current(alice());
    let store = SessionStore::new(Arc::clone(&api));

    store.restore_session().await;
    *api.current.lock() = None;
    let session = store.restore_session().await;

    assert_eq!(api.me_calls.load(Ordering::SeqCst), 2);
    assert_eq!(session.state(), &SessionState::Anonymous);
}

#[tokio::test]
async fn test_restore_session_hydrating_visible_while_running() {
    let api = ScriptedApi::with_current(alice());
    *api.delay.lock() = Duration::from_millis(30);
    let store = Arc::new(SessionStore::new(Arc::clone(&api)));

    let task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.restore_session().await }
    });
    while api.me_calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(store.snapshot().state(), &SessionState::Hydrating);
    assert!(!store.is_initialized());

    task.await.unwrap();
    assert!(store.is_authenticated());
}

/// Spawns a restore and returns once its `me` call is out and has already
/// picked up the current delay.
async fn spawn_restore(
    store: &Arc<SessionStore<Arc<ScriptedApi>>>,
    api: &ScriptedApi,
) -> tokio::task::JoinHandle<warden_session::Session> {
    let task = tokio::spawn({
        let store = Arc::clone(store);
        async move { store.restore_session().await }
    });
    while api.me_calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    task
}

#[tokio::test]
async fn test_restore_session_failing_after_login_keeps_login() {
    let api = ScriptedApi::new();
    *api.delay.lock() = Duration::from_millis(50);
    let store = Arc::new(SessionStore::new(Arc::clone(&api)));
    let mut events = store.subscribe();

    let restore = spawn_restore(&store, &api).await;
    *api.delay.lock() = Duration::ZERO;
    *api.accepts.lock() = Some(alice());
    store.login(&LoginRequest::new("alice", "secret")).await.unwrap();
    assert!(store.is_authenticated());

    let session = restore.await.unwrap();

    assert_eq!(session.identity(), Some(&alice()));
    assert_eq!(store.user(), Some(alice()));
    assert!(store.is_initialized());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedIn(alice()));
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_restore_session_succeeding_after_logout_stays_anonymous() {
    let api = ScriptedApi::with_current(alice());
    *api.delay.lock() = Duration::from_millis(50);
    let store = Arc::new(SessionStore::new(Arc::clone(&api)));
    let mut events = store.subscribe();

    let restore = spawn_restore(&store, &api).await;
    store.logout().await;

    let session = restore.await.unwrap();

    assert_eq!(session.state(), &SessionState::Anonymous);
    assert!(!store.is_authenticated());
    assert!(store.is_initialized());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedOut);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

// =========================================================================
// login / register
// =========================================================================

#[tokio::test]
async fn test_login_success_authenticates_and_initializes() {
    let api = ScriptedApi::new();
    *api.accepts.lock() = Some(alice());
    let store = SessionStore::new(Arc::clone(&api));

    let user = store
        .login(&LoginRequest::new("alice", "secret"))
        .await
        .unwrap();

    assert_eq!(user, alice());
    assert!(store.is_authenticated());
    assert!(store.is_initialized());
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_login_rejected_propagates_and_keeps_prior_state() {
    let api = ScriptedApi::new();
    let store = SessionStore::new(Arc::clone(&api));
    store.restore_session().await;
    let before = store.snapshot();

    let err = store
        .login(&LoginRequest::new("alice", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Rejected { status: 401, .. }));
    assert_eq!(store.snapshot(), before);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_login_rejected_while_authenticated_keeps_identity() {
    let api = ScriptedApi::with_current(alice());
    let store = SessionStore::new(Arc::clone(&api));
    store.restore_session().await;

    let result = store.login(&LoginRequest::new("bob", "wrong")).await;

    assert!(result.is_err());
    assert_eq!(store.user(), Some(alice()));
}

#[tokio::test]
async fn test_login_invalid_input_never_calls_server() {
    let api = ScriptedApi::new();
    let store = SessionStore::new(Arc::clone(&api));

    let err = store.login(&LoginRequest::new("", "secret")).await.unwrap_err();

    assert!(matches!(err, SessionError::InvalidInput(_)));
    assert_eq!(api.login_calls.load(Ordering::SeqCst), 0);
    assert!(!store.is_initialized());
}

#[tokio::test]
async fn test_login_loading_raised_only_while_outstanding() {
    let api = ScriptedApi::new();
    *api.accepts.lock() = Some(alice());
    *api.delay.lock() = Duration::from_millis(30);
    let store = Arc::new(SessionStore::new(Arc::clone(&api)));

    let task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.login(&LoginRequest::new("alice", "secret")).await }
    });
    while api.login_calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    assert!(store.is_loading());
    task.await.unwrap().unwrap();
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_register_success_authenticates() {
    let api = ScriptedApi::new();
    let newbie = User::new(9, "newbie", ["ROLE_TENANT"]);
    *api.accepts.lock() = Some(newbie.clone());
    let store = SessionStore::new(Arc::clone(&api));

    let user = store.register(&registration()).await.unwrap();

    assert_eq!(user, newbie);
    assert_eq!(store.user(), Some(newbie));
    assert!(store.is_initialized());
}

#[tokio::test]
async fn test_register_duplicate_propagates_server_message() {
    let api = ScriptedApi::new();
    let store = SessionStore::new(Arc::clone(&api));

    let err = store.register(&registration()).await.unwrap_err();

    assert_eq!(
        err,
        SessionError::Rejected {
            status: 400,
            message: "Username is already taken".into()
        }
    );
    assert_eq!(store.snapshot().state(), &SessionState::Unknown);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_register_invalid_form_never_calls_server() {
    let api = ScriptedApi::new();
    let store = SessionStore::new(Arc::clone(&api));
    let mut request = registration();
    request.password = "123".into();

    let err = store.register(&request).await.unwrap_err();

    assert!(matches!(err, SessionError::InvalidInput(_)));
    assert_eq!(api.register_calls.load(Ordering::SeqCst), 0);
}

// =========================================================================
// logout
// =========================================================================

#[tokio::test]
async fn test_logout_clears_identity() {
    let api = ScriptedApi::with_current(alice());
    let store = SessionStore::new(Arc::clone(&api));
    store.restore_session().await;

    store.logout().await;

    assert_eq!(store.snapshot().state(), &SessionState::Anonymous);
    assert_eq!(api.logout_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_logout_server_failure_still_clears_identity() {
    let api = ScriptedApi::with_current(alice());
    api.logout_fails.store(true, Ordering::SeqCst);
    let store = SessionStore::new(Arc::clone(&api));
    store.restore_session().await;

    store.logout().await;

    assert!(!store.is_authenticated());
    assert!(store.is_initialized());
}

#[tokio::test]
async fn test_logout_before_any_operation_initializes() {
    let store = SessionStore::new(ScriptedApi::new());

    store.logout().await;

    assert!(store.is_initialized());
    assert_eq!(store.snapshot().state(), &SessionState::Anonymous);
}

// =========================================================================
// Invariants and events
// =========================================================================

#[tokio::test]
async fn test_initialized_never_reverts_across_operations() {
    let api = ScriptedApi::new();
    let store = SessionStore::new(Arc::clone(&api));
    assert!(!store.is_initialized());

    store.restore_session().await;
    assert!(store.is_initialized());

    let _ = store.login(&LoginRequest::new("alice", "wrong")).await;
    assert!(store.is_initialized());

    *api.accepts.lock() = Some(alice());
    store.login(&LoginRequest::new("alice", "secret")).await.unwrap();
    assert!(store.is_initialized());

    store.logout().await;
    assert!(store.is_initialized());

    store.restore_session().await;
    assert!(store.is_initialized());
}

#[tokio::test]
async fn test_subscribe_receives_each_transition_in_order() {
    let api = ScriptedApi::new();
    let store = SessionStore::new(Arc::clone(&api));
    let mut events = store.subscribe();

    store.restore_session().await;
    *api.accepts.lock() = Some(alice());
    store.login(&LoginRequest::new("alice", "secret")).await.unwrap();
    store.logout().await;
    *api.current.lock() = Some(alice());
    store.restore_session().await;

    assert_eq!(events.recv().await.unwrap(), SessionEvent::RestoreFailed);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedIn(alice()));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedOut);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Restored(alice()));
}

#[tokio::test]
async fn test_subscribe_failed_login_publishes_nothing() {
    let store = SessionStore::new(ScriptedApi::new());
    let mut events = store.subscribe();

    let _ = store.login(&LoginRequest::new("alice", "wrong")).await;

    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}
