//! Guard configuration.

use serde::{Deserialize, Serialize};

/// Where the guard sends people it turns away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Unauthenticated visitors to protected routes go here.
    pub login_route: String,
    /// Authenticated visitors to guest-only routes, and anyone lacking a
    /// required role, go here.
    pub default_route: String,
    /// Query parameter carrying the originally requested path on a login
    /// redirect.
    pub redirect_param: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_route: "/login".to_string(),
            default_route: "/".to_string(),
            redirect_param: "redirect".to_string(),
        }
    }
}
