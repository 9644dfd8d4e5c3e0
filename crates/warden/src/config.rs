//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use warden_guard::{GuardConfig, RouteTable};
use warden_pipeline::AuthEndpoints;

use crate::WardenError;

/// Everything needed to build a [`WardenClient`](crate::WardenClient).
///
/// Every field has a default, so a JSON document only needs the keys it
/// changes:
///
/// ```rust
/// let config = warden::ClientConfig::from_json(
///     r#"{ "base_url": "https://portal.example/api", "renewal_timeout_ms": 5000 }"#,
/// )
/// .unwrap();
/// assert_eq!(config.endpoints.refresh, "/auth/refresh-token");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root every API path is appended to.
    pub base_url: String,
    /// Per-call timeout. 0 disables it.
    pub request_timeout_ms: u64,
    /// Bound on one renewal, after which every queued call fails. 0
    /// disables it.
    pub renewal_timeout_ms: u64,
    pub endpoints: AuthEndpoints,
    pub guard: GuardConfig,
    pub routes: RouteTable,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            request_timeout_ms: 30_000,
            renewal_timeout_ms: 10_000,
            endpoints: AuthEndpoints::default(),
            guard: GuardConfig::default(),
            routes: RouteTable::default(),
        }
    }
}

impl ClientConfig {
    /// Longest accepted timeout for either setting.
    pub const MAX_TIMEOUT_MS: u64 = 600_000;

    /// Parses a JSON document and runs [`validated`](Self::validated) on it.
    ///
    /// # Errors
    /// [`WardenError::Config`] if the document is not valid JSON for this
    /// shape.
    pub fn from_json(json: &str) -> Result<Self, WardenError> {
        serde_json::from_str::<Self>(json)
            .map(Self::validated)
            .map_err(|e| WardenError::Config(e.to_string()))
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Rules:
    /// - timeouts capped to [`Self::MAX_TIMEOUT_MS`] (0 is allowed and disables)
    /// - trailing `/` trimmed from `base_url`
    /// - endpoint and guard paths given a leading `/` when missing
    pub fn validated(mut self) -> Self {
        for (name, value) in [
            ("request_timeout_ms", &mut self.request_timeout_ms),
            ("renewal_timeout_ms", &mut self.renewal_timeout_ms),
        ] {
            if *value > Self::MAX_TIMEOUT_MS {
                warn!(setting = name, value = *value, max = Self::MAX_TIMEOUT_MS, "timeout exceeds maximum, clamping");
                *value = Self::MAX_TIMEOUT_MS;
            }
        }

        let trimmed = self.base_url.trim_end_matches('/');
        if trimmed.len() != self.base_url.len() {
            self.base_url = trimmed.to_string();
        }

        let endpoints = &mut self.endpoints;
        for path in [
            &mut endpoints.login,
            &mut endpoints.register,
            &mut endpoints.logout,
            &mut endpoints.me,
            &mut endpoints.refresh,
            &mut self.guard.login_route,
            &mut self.guard.default_route,
        ] {
            if !path.starts_with('/') {
                warn!(path = %path, "path without leading '/', fixing");
                path.insert(0, '/');
            }
        }
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        millis(self.request_timeout_ms)
    }

    pub fn renewal_timeout(&self) -> Option<Duration> {
        millis(self.renewal_timeout_ms)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}
