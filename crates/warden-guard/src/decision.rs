//! The access policy.

use warden_session::Session;

use crate::{GuardConfig, RouteRequirement};

/// The outcome of a navigation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Show the requested route.
    Allow,
    /// Go to `to` instead. `return_to` is set for login redirects and holds
    /// the originally requested full path.
    Redirect {
        to: String,
        return_to: Option<String>,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// The path to navigate to instead, with the return path appended as
    /// `?{redirect_param}=<encoded>` when there is one. `None` for
    /// [`Decision::Allow`].
    pub fn location(&self, redirect_param: &str) -> Option<String> {
        match self {
            Self::Allow => None,
            Self::Redirect {
                to,
                return_to: None,
            } => Some(to.clone()),
            Self::Redirect {
                to,
                return_to: Some(original),
            } => {
                let separator = if to.contains('?') { '&' } else { '?' };
                Some(format!(
                    "{to}{separator}{}={}",
                    urlencoding::encode(redirect_param),
                    urlencoding::encode(original)
                ))
            }
        }
    }
}

/// Decides whether `session` may enter a route with `requirement`.
///
/// Checks run in order and the first that fails picks the redirect:
///
/// 1. `requires_auth` and nobody is logged in → login route, carrying
///    `full_path`
/// 2. `guest_only` and someone is logged in → default route
/// 3. roles listed and the identity holds none of them → default route
pub fn decide(
    requirement: &RouteRequirement,
    session: &Session,
    full_path: &str,
    config: &GuardConfig,
) -> Decision {
    let authenticated = session.is_authenticated();

    if requirement.requires_auth && !authenticated {
        return Decision::Redirect {
            to: config.login_route.clone(),
            return_to: Some(full_path.to_string()),
        };
    }

    if requirement.guest_only && authenticated {
        return Decision::Redirect {
            to: config.default_route.clone(),
            return_to: None,
        };
    }

    if !requirement.roles.is_empty() && !session.has_any_role(requirement.roles.as_slice()) {
        return Decision::Redirect {
            to: config.default_route.clone(),
            return_to: None,
        };
    }

    Decision::Allow
}

/// Where to go after logging in from `login_full_path`.
///
/// Reads the redirect parameter off the login route's query. Only paths on
/// this client are honored: a single leading `/` and no control characters.
/// Anything else, or no parameter at all, yields the default route.
pub fn return_target(login_full_path: &str, config: &GuardConfig) -> String {
    let query = login_full_path
        .split_once('?')
        .map(|(_, query)| query.split('#').next().unwrap_or_default())
        .unwrap_or_default();

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| urlencoding::decode(key).is_ok_and(|key| key == config.redirect_param))
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
        .filter(|target| is_local_path(target))
        .unwrap_or_else(|| config.default_route.clone())
}

/// A path on this client: one leading `/`, not followed by another `/` or
/// a `\` (both read as protocol-relative), and no control characters.
fn is_local_path(target: &str) -> bool {
    let mut chars = target.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !target.chars().any(char::is_control)
}
