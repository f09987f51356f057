//! Gateway session lifecycle.
//!
//! Login posts the username, password and an obfuscated API key to
//! `/api/v1/authenticatedSession`. The obfuscation mixes API key characters
//! picked by the last six digits of a millisecond timestamp:
//!
//! - `n` = last 6 digits of the timestamp
//! - `r` = `n >> 1`, zero-padded to 6 digits
//! - key = `api_key[d]` for each digit `d` of `n`, then `api_key[d + 2]` for
//!   each digit `d` of `r`
//!
//! The gateway answers with a `Set-Cookie` header; its first `name=value`
//! pair is sent as the `cookie` header on every later call. Logout is a
//! `DELETE` on the same path and never fails the run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::retry::Executor;
use crate::transport::ApiRequest;

/// Session creation and deletion endpoint.
pub const SESSION_PATH: &str = "/api/v1/authenticatedSession";

/// Length of the obfuscated key sent at login.
pub const OBFUSCATED_KEY_LENGTH: usize = 12;

const TIMESTAMP_DIGITS: usize = 6;

/// An authenticated gateway session.
#[derive(Clone)]
pub struct Session {
    base_url: String,
    cookie: String,
    established_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session from an already captured cookie.
    pub fn new(base_url: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cookie: cookie.into(),
            established_at: Utc::now(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The `name=value` cookie pair.
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    /// Headers carried by every authenticated call.
    pub fn auth_headers(&self) -> Vec<(String, String)> {
        vec![("cookie".to_string(), self.cookie.clone())]
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("cookie", &"<redacted>")
            .field("established_at", &self.established_at)
            .finish()
    }
}

/// Current time in milliseconds since the epoch, as sent in the login body.
pub fn current_timestamp() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Derives the 12-character login key from `api_key` and `timestamp`.
pub fn obfuscate_api_key(api_key: &str, timestamp: &str) -> Result<String> {
    let error = || GatewayError::Auth("Error obfuscating API key".to_string());

    if timestamp.len() < TIMESTAMP_DIGITS || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(error());
    }

    let key: Vec<char> = api_key.chars().collect();
    let n = &timestamp[timestamp.len() - TIMESTAMP_DIGITS..];
    let shifted = n.parse::<u32>().map_err(|_| error())? >> 1;
    let r = format!("{:06}", shifted);

    let pick = |digit: char, offset: usize| -> Result<char> {
        let index = digit.to_digit(10).ok_or_else(error)? as usize + offset;
        key.get(index).copied().ok_or_else(error)
    };

    let mut obfuscated = String::with_capacity(OBFUSCATED_KEY_LENGTH);
    for digit in n.chars() {
        obfuscated.push(pick(digit, 0)?);
    }
    for digit in r.chars() {
        obfuscated.push(pick(digit, 2)?);
    }

    Ok(obfuscated)
}

/// Extracts the `name=value` pair from a `Set-Cookie` header.
pub fn session_cookie(set_cookie: &str) -> &str {
    set_cookie.split(';').next().unwrap_or("").trim()
}

/// Logs in using the current time.
pub fn establish(executor: &Executor, config: &GatewayConfig) -> Result<Session> {
    establish_at(executor, config, &current_timestamp())
}

/// Logs in with an explicit timestamp.
pub fn establish_at(executor: &Executor, config: &GatewayConfig, timestamp: &str) -> Result<Session> {
    let obfuscated = obfuscate_api_key(&config.api_key, timestamp)?;

    let body = json!({
        "apiKey": obfuscated,
        "username": config.username,
        "password": config.password,
        "timestamp": timestamp,
    });

    let reply = executor
        .execute(&ApiRequest::post(SESSION_PATH).with_json(body))
        .map_err(|e| {
            debug!("Error starting Zscaler session: {}", e);
            GatewayError::Auth(format!("Error starting Zscaler session: {}", e))
        })?;

    let cookie = reply
        .header("set-cookie")
        .map(session_cookie)
        .filter(|cookie| !cookie.is_empty())
        .ok_or_else(|| {
            GatewayError::Auth(
                "Error starting Zscaler session: no session cookie in response".to_string(),
            )
        })?;

    info!(base_url = config.base_url(), "Successfully started Zscaler session");
    Ok(Session::new(config.base_url(), cookie))
}

/// Deletes the session. Failures are logged and otherwise ignored.
pub fn teardown(executor: &Executor, session: &Session) {
    let mut request = ApiRequest::delete(SESSION_PATH);
    request.headers.extend(session.auth_headers());

    match executor.execute(&request) {
        Ok(_) => info!("Zscaler session closed"),
        Err(e) => {
            warn!(error = %e, "Deleting the authenticated session failed on the Zscaler server");
            debug!("Marking the action as successful run");
        }
    }
}
