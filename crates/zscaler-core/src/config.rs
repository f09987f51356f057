//! Gateway connection settings.
//!
//! These are the asset-configuration values handed to the connector by
//! whatever loads them (the CLI harness reads them from a JSON file).

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// API path prefix that must not be part of the configured base URL.
pub const API_PATH_SUFFIX: &str = "/api/v1";

/// Minimum API key length required by the key obfuscation scheme.
pub const MIN_API_KEY_LENGTH: usize = 12;

/// Settings for one gateway tenant.
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Admin portal URL, e.g. `https://admin.zscalerbeta.net`.
    pub base_url: String,
    /// Admin username.
    pub username: String,
    /// Admin password.
    pub password: String,
    /// Tenant API key.
    pub api_key: String,
    /// Whether to verify the server's TLS certificate.
    #[serde(default = "default_verify")]
    pub verify_server_cert: bool,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum calls per request when the gateway keeps answering 409/429.
    /// `None` retries until the gateway accepts the call.
    #[serde(default)]
    pub max_retry_attempts: Option<u32>,
}

fn default_verify() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl GatewayConfig {
    /// Creates a config with default transport settings.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            api_key: api_key.into(),
            verify_server_cert: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retry_attempts: None,
        }
    }

    /// Base URL with any trailing slashes removed.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy derived from these settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retry_attempts,
        }
    }

    /// Checks that every required field is usable.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("base_url", self.base_url.as_str()),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
            ("api_key", self.api_key.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(GatewayError::Validation(format!(
                    "Missing required configuration value: {}",
                    name
                )));
            }
        }

        if self.base_url().ends_with(API_PATH_SUFFIX) {
            return Err(GatewayError::Validation(format!(
                "The base_url should not end with {} e.g. https://admin.zscaler_instance.net",
                API_PATH_SUFFIX
            )));
        }

        if self.api_key.chars().count() < MIN_API_KEY_LENGTH {
            return Err(GatewayError::Validation(format!(
                "api_key must be at least {} characters",
                MIN_API_KEY_LENGTH
            )));
        }

        if self.max_retry_attempts == Some(0) {
            return Err(GatewayError::Validation(
                "max_retry_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_key", &"<redacted>")
            .field("verify_server_cert", &self.verify_server_cert)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retry_attempts", &self.max_retry_attempts)
            .finish()
    }
}

/// How many times a request may be reissued on 409/429.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls allowed per request; `None` is unbounded.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retries until the gateway accepts the call.
    pub fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    /// Gives up after `attempts` calls.
    pub fn capped(attempts: u32) -> Self {
        Self {
            max_attempts: Some(attempts),
        }
    }

    /// Returns true once `attempts` calls have been issued and no more are allowed.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}
