//! Gateway error types.

use std::time::Duration;

use thiserror::Error;

use crate::response::DebugContext;

/// Errors that can occur while talking to the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport failure (DNS, connection refused, timeout). Never retried.
    #[error("Error connecting to Zscaler server. {0}")]
    Connectivity(String),

    /// Login rejected or the session could not be established.
    #[error("{0}")]
    Auth(String),

    /// Rate limit could not be waited out.
    #[error("rate limit exceeded; server asked to retry after {retry_after:?}")]
    RateLimited {
        /// Server-declared wait, if one was understood.
        retry_after: Option<Duration>,
    },

    /// The resource lock was still held after the configured attempts.
    #[error("Error 409: Lock not available after {attempts} attempts")]
    LockContended {
        /// Number of calls issued before giving up.
        attempts: u32,
    },

    /// HTML page or a body that could not be parsed.
    #[error("{message}")]
    MalformedResponse {
        /// HTTP status of the offending response.
        status: u16,
        /// Diagnostic text.
        message: String,
        /// Raw exchange, when the error came from a response.
        debug: Option<Box<DebugContext>>,
    },

    /// Structured error returned by the gateway.
    #[error("{message}")]
    Http {
        /// HTTP status of the offending response.
        status: u16,
        /// Message extracted from the response.
        message: String,
        /// Raw exchange.
        debug: Option<Box<DebugContext>>,
    },

    /// Empty body with a status other than 200/204.
    #[error("Empty response and no information in the header")]
    EmptyResponse {
        /// HTTP status of the offending response.
        status: u16,
        /// Raw exchange.
        debug: Option<Box<DebugContext>>,
    },

    /// A named resource (category, report) does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Invalid input, rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// HTTP status of the response this error was classified from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::MalformedResponse { status, .. }
            | Self::Http { status, .. }
            | Self::EmptyResponse { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::LockContended { .. } => Some(409),
            _ => None,
        }
    }

    /// Raw status, body and headers of the response behind this error.
    pub fn debug_context(&self) -> Option<&DebugContext> {
        match self {
            Self::MalformedResponse { debug, .. }
            | Self::Http { debug, .. }
            | Self::EmptyResponse { debug, .. } => debug.as_deref(),
            _ => None,
        }
    }

    /// Attaches the raw exchange to a response-derived error.
    pub fn with_debug(mut self, context: DebugContext) -> Self {
        match &mut self {
            Self::MalformedResponse { debug, .. }
            | Self::Http { debug, .. }
            | Self::EmptyResponse { debug, .. } => *debug = Some(Box::new(context)),
            _ => {}
        }
        self
    }

    /// Returns true for failures that happened before reaching the server.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
