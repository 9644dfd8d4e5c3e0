//! The authenticated identity and the requests that establish it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SessionError;

/// The identity the server reports for an authenticated client.
///
/// Deserialized from the server's camelCase JSON. Only `id` and `roles` are
/// required; a server that omits the descriptive fields still produces a
/// usable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Opaque role tags such as `ROLE_ADMIN`.
    pub roles: BTreeSet<String>,
    /// Account creation instant, kept exactly as the server formatted it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    /// Creates a user with just an id, a username, and roles.
    pub fn new<I, S>(id: u64, username: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            username: username.into(),
            email: String::new(),
            first_name: None,
            last_name: None,
            phone_number: None,
            roles: roles.into_iter().map(Into::into).collect(),
            created_at: None,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// True when the user holds at least one of `roles`.
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|role| self.roles.contains(role.as_ref()))
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.username, self.id)
    }
}

/// Username and password for [`IdentityApi::login`](crate::IdentityApi::login).
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Rejects blank fields before anything is sent.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.username.trim().is_empty() {
            return Err(SessionError::InvalidInput("username is required".into()));
        }
        if self.password.is_empty() {
            return Err(SessionError::InvalidInput("password is required".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A new account for [`IdentityApi::register`](crate::IdentityApi::register).
///
/// `role` is a requested role tag; the server decides whether to honor it
/// and falls back to its default (tenant) role when it is absent.
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

const USERNAME_LEN: (usize, usize) = (3, 50);
const PASSWORD_LEN: (usize, usize) = (6, 100);
const PHONE_MAX_LEN: usize = 20;

impl RegisterRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Checks the same form constraints the server enforces, so an obviously
    /// bad form never costs a round trip.
    pub fn validate(&self) -> Result<(), SessionError> {
        let username_len = self.username.trim().chars().count();
        if username_len < USERNAME_LEN.0 || username_len > USERNAME_LEN.1 {
            return Err(SessionError::InvalidInput(format!(
                "username must be between {} and {} characters",
                USERNAME_LEN.0, USERNAME_LEN.1
            )));
        }

        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(SessionError::InvalidInput(
                "a valid email address is required".into(),
            ));
        }

        let password_len = self.password.chars().count();
        if password_len < PASSWORD_LEN.0 || password_len > PASSWORD_LEN.1 {
            return Err(SessionError::InvalidInput(format!(
                "password must be between {} and {} characters",
                PASSWORD_LEN.0, PASSWORD_LEN.1
            )));
        }

        if let Some(phone) = &self.phone_number {
            if !is_valid_phone(phone) {
                return Err(SessionError::InvalidInput(format!(
                    "phone number may hold up to {PHONE_MAX_LEN} digits, spaces, '+' or '-'"
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone_number", &self.phone_number)
            .field("role", &self.role)
            .finish()
    }
}

fn is_valid_phone(phone: &str) -> bool {
    phone.chars().count() <= PHONE_MAX_LEN
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || c == '+' || c == '-' || c.is_whitespace())
}
