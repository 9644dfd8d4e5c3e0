//! Identity endpoint paths.

use serde::{Deserialize, Serialize};

/// Paths of the endpoints that manage credentials and identity.
///
/// A 401 from any of these is returned to the caller as is. Renewing in
/// response would at best be pointless (login, register) and at worst loop
/// (refresh answering 401 to its own renewal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEndpoints {
    pub login: String,
    pub register: String,
    pub logout: String,
    pub me: String,
    pub refresh: String,

    /// Any path starting with this prefix counts as an identity endpoint,
    /// including ones not listed above. Empty disables prefix matching.
    pub identity_prefix: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            register: "/auth/register".to_string(),
            logout: "/auth/logout".to_string(),
            me: "/auth/me".to_string(),
            refresh: "/auth/refresh-token".to_string(),
            identity_prefix: "/auth/".to_string(),
        }
    }
}

impl AuthEndpoints {
    /// Returns `true` if a 401 from `path` must not trigger renewal.
    pub fn is_identity(&self, path: &str) -> bool {
        if !self.identity_prefix.is_empty()
            && path.starts_with(&self.identity_prefix)
        {
            return true;
        }
        [
            &self.login,
            &self.register,
            &self.logout,
            &self.me,
            &self.refresh,
        ]
        .iter()
        .any(|endpoint| endpoint.as_str() == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_identity_default_paths() {
        let endpoints = AuthEndpoints::default();
        for path in [
            "/auth/login",
            "/auth/register",
            "/auth/logout",
            "/auth/me",
            "/auth/refresh-token",
            "/auth/anything-else",
        ] {
            assert!(endpoints.is_identity(path), "{path}");
        }
        assert!(!endpoints.is_identity("/properties"));
        assert!(!endpoints.is_identity("/users/auth/me"));
    }

    #[test]
    fn test_is_identity_without_prefix_matches_listed_paths_only() {
        let endpoints = AuthEndpoints {
            identity_prefix: String::new(),
            me: "/session/me".to_string(),
            ..AuthEndpoints::default()
        };
        assert!(endpoints.is_identity("/session/me"));
        assert!(endpoints.is_identity("/auth/login"));
        assert!(!endpoints.is_identity("/auth/other"));
    }

    #[test]
    fn test_deserialize_partial_keeps_defaults() {
        let endpoints: AuthEndpoints =
            serde_json::from_str(r#"{ "refresh": "/token/renew" }"#).unwrap();
        assert_eq!(endpoints.refresh, "/token/renew");
        assert_eq!(endpoints.login, "/auth/login");
    }
}
