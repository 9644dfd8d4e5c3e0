//! The navigation guard.

use std::sync::Arc;

use warden_session::{IdentityApi, SessionStore};

use crate::{Decision, GuardConfig, RouteTable, decide, return_target};

/// Checks every navigation against the route table and the session.
///
/// The first navigation decides how long the user waits for hydration:
/// a protected route blocks until the session has been restored, because
/// judging it on an unknown session would bounce a logged-in user to the
/// login page. Any other route is judged immediately while the restore
/// runs in the background.
pub struct NavigationGuard<A: IdentityApi> {
    store: Arc<SessionStore<A>>,
    routes: RouteTable,
    config: GuardConfig,
}

impl<A: IdentityApi> NavigationGuard<A> {
    pub fn new(store: Arc<SessionStore<A>>, routes: RouteTable, config: GuardConfig) -> Self {
        Self {
            store,
            routes,
            config,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SessionStore<A>> {
        &self.store
    }

    /// Decides whether navigation to `full_path` may proceed.
    ///
    /// Must be called from within a tokio runtime: on the first navigation
    /// to an unprotected route, the session restore is spawned as a task.
    pub async fn before_each(&self, full_path: &str) -> Decision {
        let requirement = self.routes.requirement_for(full_path);

        if !self.store.is_initialized() {
            if requirement.requires_auth {
                tracing::debug!(path = full_path, "waiting for session restore");
                self.store.restore_session().await;
            } else {
                let store = Arc::clone(&self.store);
                tokio::spawn(async move {
                    store.restore_session().await;
                });
            }
        }

        let decision = decide(requirement, &self.store.snapshot(), full_path, &self.config);
        match &decision {
            Decision::Allow => tracing::debug!(path = full_path, "navigation allowed"),
            Decision::Redirect { to, .. } => {
                tracing::info!(path = full_path, redirect = %to, "navigation redirected");
            }
        }
        decision
    }

    /// Like [`before_each`](Self::before_each), but returns the path the
    /// client ends up on.
    pub async fn navigate(&self, full_path: &str) -> String {
        let decision = self.before_each(full_path).await;
        self.location_of(&decision)
            .unwrap_or_else(|| full_path.to_string())
    }

    /// Renders a redirect with the configured return parameter.
    pub fn location_of(&self, decision: &Decision) -> Option<String> {
        decision.location(&self.config.redirect_param)
    }

    /// Where to go after a successful login from `login_full_path`.
    pub fn return_target(&self, login_full_path: &str) -> String {
        return_target(login_full_path, &self.config)
    }
}
