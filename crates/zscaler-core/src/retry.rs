//! Resilient request execution.
//!
//! The gateway reports two transient conditions and tells the client how to
//! wait them out:
//!
//! - `409`: an administrative lock is held; retry after one second
//! - `429`: rate limited; the JSON body carries `"Retry-After": "<N> seconds"`
//!   (or minutes) and the call is retried after exactly that long
//!
//! Waits come from the server, not from a backoff curve. Transport failures
//! and every other classified error are returned unchanged. By default there
//! is no attempt cap; [`RetryPolicy`] can impose one.

use std::time::Duration;

use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::error::{GatewayError, Result};
use crate::response::{classify, Classified, DebugContext};
use crate::transport::{ApiRequest, RawResponse, Transport};

/// Fixed wait before retrying a lock-contended call.
pub const LOCK_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Body field carrying the rate-limit wait.
pub const RETRY_AFTER_FIELD: &str = "Retry-After";

/// Blocks the calling flow between retries.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

impl<T: Sleeper + ?Sized> Sleeper for Box<T> {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// What to do about a 409/429 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDirective {
    /// Lock held; retry after [`LOCK_RETRY_DELAY`].
    LockContended,
    /// Rate limited; retry after the server-declared wait.
    RateLimited(Duration),
}

impl RetryDirective {
    /// Derives a directive from a failed response, if the failure is retryable.
    pub fn from_response(raw: &RawResponse) -> Option<Self> {
        match raw.status {
            409 => Some(Self::LockContended),
            429 => retry_after_from_body(&raw.body).map(Self::RateLimited),
            _ => None,
        }
    }

    /// How long to wait before the next attempt.
    pub fn delay(&self) -> Duration {
        match self {
            Self::LockContended => LOCK_RETRY_DELAY,
            Self::RateLimited(wait) => *wait,
        }
    }

    fn exhausted(self, attempts: u32) -> GatewayError {
        match self {
            Self::LockContended => GatewayError::LockContended { attempts },
            Self::RateLimited(wait) => GatewayError::RateLimited {
                retry_after: Some(wait),
            },
        }
    }
}

fn retry_after_from_body(body: &str) -> Option<Duration> {
    let value: Value = serde_json::from_str(body).ok()?;
    let text = value.get(RETRY_AFTER_FIELD)?.as_str()?;
    debug!("Retry Time: {}", text);
    parse_retry_after(text)
}

/// Parses the gateway's free-text wait, e.g. `"30 seconds"` or `"2 minutes"`.
///
/// Any other unit, or a count that is not a non-negative integer, yields `None`.
pub fn parse_retry_after(text: &str) -> Option<Duration> {
    let mut parts = text.split_whitespace();
    let amount: u64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?.to_ascii_lowercase();

    match unit.as_str() {
        "seconds" => Some(Duration::from_secs(amount)),
        "minutes" => amount.checked_mul(60).map(Duration::from_secs),
        _ => None,
    }
}

/// A successful exchange.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: HeaderMap,
    /// Parsed JSON payload (`{}` for empty 200/204 responses).
    pub payload: Value,
    pub debug: DebugContext,
}

impl Reply {
    /// Value of a response header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Sends requests, retrying lock contention and rate limits.
pub struct Executor {
    transport: Box<dyn Transport>,
    sleeper: Box<dyn Sleeper>,
    policy: RetryPolicy,
}

impl Executor {
    /// Creates an executor over the given transport and sleeper.
    pub fn new(
        transport: Box<dyn Transport>,
        sleeper: Box<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    /// Returns the retry policy in effect.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Sends `request` until the gateway accepts it or fails for good.
    pub fn execute(&self, request: &ApiRequest) -> Result<Reply> {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let raw = self.transport.send(request)?;
            let Classified {
                debug: debug_ctx,
                outcome,
            } = classify(&raw);
            debug!(
                request = %request.describe(),
                status = debug_ctx.status,
                headers = ?debug_ctx.headers,
                body = %debug_ctx.body,
                attempt = attempts,
                "Gateway response"
            );

            let error = match outcome {
                Ok(payload) => {
                    return Ok(Reply {
                        status: raw.status,
                        headers: raw.headers,
                        payload,
                        debug: debug_ctx,
                    })
                }
                Err(e) => e,
            };

            let Some(directive) = RetryDirective::from_response(&raw) else {
                return Err(error);
            };

            if self.policy.is_exhausted(attempts) {
                warn!(
                    request = %request.describe(),
                    attempts, "Giving up after repeated {} responses", raw.status
                );
                return Err(directive.exhausted(attempts));
            }

            match directive {
                RetryDirective::LockContended => {
                    warn!("Error 409: Lock not available: Retrying in 1 second")
                }
                RetryDirective::RateLimited(wait) => {
                    warn!("Exceeded rate limit: Retrying after {} seconds", wait.as_secs())
                }
            }
            self.sleeper.sleep(directive.delay());
        }
    }
}
