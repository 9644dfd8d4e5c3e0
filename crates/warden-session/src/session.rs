//! Point-in-time view of the session.

use crate::User;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing is known yet; no session operation has run.
    #[default]
    Unknown,
    /// A "who am I" call is running.
    Hydrating,
    /// The server vouched for this identity.
    Authenticated(User),
    /// A session operation completed and nobody is logged in.
    Anonymous,
}

/// A snapshot of the session.
///
/// `initialized` records that at least one session operation has completed,
/// whatever its outcome. It never goes back to `false`; the only way to set
/// it is [`Session::mark_initialized`], which the store calls on completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
    initialized: bool,
    loading: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The authenticated user. `None` in every state but `Authenticated`.
    pub fn identity(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// True while a login or registration is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.identity().is_some_and(|user| user.has_role(role))
    }

    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.identity().is_some_and(|user| user.has_any_role(roles))
    }

    /// Role tags of the current identity, empty when not authenticated.
    pub fn roles(&self) -> Vec<String> {
        self.identity()
            .map(|user| user.roles.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_unknown_and_uninitialized() {
        let session = Session::new();

        assert_eq!(session.state(), &SessionState::Unknown);
        assert!(!session.is_initialized());
        assert!(!session.is_loading());
        assert!(session.identity().is_none());
    }

    #[test]
    fn test_identity_only_when_authenticated() {
        let mut session = Session::new();
        for state in [SessionState::Unknown, SessionState::Hydrating, SessionState::Anonymous] {
            session.set_state(state);
            assert!(!session.is_authenticated());
            assert!(session.roles().is_empty());
        }

        session.set_state(SessionState::Authenticated(User::new(1, "alice", ["ROLE_ADMIN"])));
        assert_eq!(session.identity().map(|u| u.id), Some(1));
        assert!(session.has_role("ROLE_ADMIN"));
        assert!(session.has_any_role(&["ROLE_OWNER", "ROLE_ADMIN"]));
        assert_eq!(session.roles(), vec!["ROLE_ADMIN".to_string()]);
    }

    #[test]
    fn test_has_role_anonymous_is_false() {
        let mut session = Session::new();
        session.set_state(SessionState::Anonymous);

        assert!(!session.has_role("ROLE_TENANT"));
        assert!(!session.has_any_role(&["ROLE_TENANT"]));
    }
}
