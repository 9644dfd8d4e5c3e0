//! Routes and their access requirements.

use serde::{Deserialize, Serialize};

/// What a route demands of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteRequirement {
    /// Only authenticated sessions may enter.
    pub requires_auth: bool,
    /// Only anonymous sessions may enter (login, registration).
    pub guest_only: bool,
    /// The session must hold at least one of these roles. Empty means no
    /// role restriction.
    pub roles: Vec<String>,
}

/// The requirement of any path no route claims.
static UNRESTRICTED: RouteRequirement = RouteRequirement {
    requires_auth: false,
    guest_only: false,
    roles: Vec::new(),
};

impl RouteRequirement {
    /// No restriction at all.
    pub fn public() -> Self {
        Self::default()
    }

    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            ..Self::default()
        }
    }

    pub fn guest_only() -> Self {
        Self {
            guest_only: true,
            ..Self::default()
        }
    }

    /// Adds a role restriction.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }
}

/// A named path and its requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub requirement: RouteRequirement,
}

/// The client's routes, looked up by exact path.
///
/// Paths that match no route fall through to an implicit catch-all with no
/// requirement, so "not found" pages are reachable by anyone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route. When two routes share a path, the first one added wins
    /// lookups.
    pub fn route(
        mut self,
        name: impl Into<String>,
        path: impl Into<String>,
        requirement: RouteRequirement,
    ) -> Self {
        self.routes.push(Route {
            name: name.into(),
            path: path.into(),
            requirement,
        });
        self
    }

    /// Finds the route for `full_path`, ignoring its query and fragment.
    pub fn resolve(&self, full_path: &str) -> Option<&Route> {
        let path = normalize(full_path);
        self.routes.iter().find(|route| normalize(&route.path) == path)
    }

    /// The requirement that applies to `full_path`.
    pub fn requirement_for(&self, full_path: &str) -> &RouteRequirement {
        self.resolve(full_path)
            .map(|route| &route.requirement)
            .unwrap_or(&UNRESTRICTED)
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Strips query and fragment, and a trailing `/` on anything but the root.
pub(crate) fn normalize(full_path: &str) -> &str {
    let end = full_path.find(['?', '#']).unwrap_or(full_path.len());
    let path = &full_path[..end];
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ if path.is_empty() => "/",
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::new()
            .route("dashboard", "/", RouteRequirement::authenticated())
            .route(
                "payments",
                "/payments",
                RouteRequirement::authenticated().with_roles(["ROLE_OWNER", "ROLE_ADMIN"]),
            )
            .route("login", "/login", RouteRequirement::guest_only())
    }

    #[test]
    fn test_normalize_strips_query_fragment_and_trailing_slash() {
        assert_eq!(normalize("/payments?page=2"), "/payments");
        assert_eq!(normalize("/payments#top"), "/payments");
        assert_eq!(normalize("/payments/"), "/payments");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("/?tab=1"), "/");
        assert_eq!(normalize(""), "/");
    }

    #[test]
    fn test_resolve_exact_path_ignores_query() {
        let table = table();

        assert_eq!(
            table.resolve("/payments?month=3").map(|r| r.name.as_str()),
            Some("payments")
        );
        assert_eq!(table.resolve("/").map(|r| r.name.as_str()), Some("dashboard"));
    }

    #[test]
    fn test_resolve_prefix_is_not_a_match() {
        assert!(table().resolve("/payments/42").is_none());
    }

    #[test]
    fn test_requirement_for_unknown_path_is_unrestricted() {
        let table = table();

        let requirement = table.requirement_for("/no/such/page");

        assert_eq!(requirement, &RouteRequirement::public());
    }

    #[test]
    fn test_by_name_finds_route() {
        assert_eq!(table().by_name("login").map(|r| r.path.as_str()), Some("/login"));
        assert_eq!(table().len(), 3);
    }

    #[test]
    fn test_deserialize_route_list() {
        let table: RouteTable = serde_json::from_str(
            r#"[
                { "name": "leases", "path": "/leases", "requirement": { "requires_auth": true } },
                { "name": "about", "path": "/about" }
            ]"#,
        )
        .unwrap();

        assert!(table.requirement_for("/leases").requires_auth);
        assert!(table.requirement_for("/leases").roles.is_empty());
        assert_eq!(table.requirement_for("/about"), &RouteRequirement::public());
    }
}
