//! Zscaler Core - authenticated REST client for the Zscaler web-security gateway.
//!
//! This crate drives the gateway's administrative API on behalf of a
//! security-orchestration host. It handles:
//!
//! - Session login with the obfuscated API key handshake, and logout
//! - Response classification by content type (JSON, HTML, empty)
//! - Retries on lock contention (409) and rate limiting (429)
//! - Read-modify-write mutation of the block list, allow list and URL categories
//! - URL lookups, sandbox reports and category listing
//!
//! ## Architecture
//!
//! ```text
//! ActionId::handle → endpoints::prepare → lists::amend → GatewayClient::send
//!                                                              │
//!                                          Session cookie ─────┤
//!                                                              ▼
//!                                               Executor (409/429 loop)
//!                                                              │
//!                                                              ▼
//!                                          Transport → response::classify
//! ```
//!
//! # Example
//!
//! ```no_run
//! use zscaler_core::{ActionId, Connector, GatewayConfig};
//! use serde_json::json;
//!
//! let config = GatewayConfig::new(
//!     "https://admin.zscalerbeta.net",
//!     "admin@example.com",
//!     "password",
//!     "0123456789abcdef",
//! );
//! let connector = Connector::from_config(&config).unwrap();
//!
//! let params = json!({"url": "http://a.com, https://b.com"});
//! let result = connector.run(ActionId::BlockUrl, params.as_object().unwrap());
//! println!("{}", result.message);
//!
//! connector.finalize();
//! ```

pub mod actions;
pub mod client;
pub mod config;
pub mod connector;
pub mod endpoints;
pub mod error;
pub mod lists;
pub mod lookup;
pub mod models;
pub mod reports;
pub mod response;
pub mod retry;
pub mod session;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use actions::{ActionId, ActionResult, ActionStatus, Parameters};
pub use client::GatewayClient;
pub use config::{GatewayConfig, RetryPolicy};
pub use connector::Connector;
pub use error::{GatewayError, Result};
pub use lists::{ListAction, ListTarget, MutationRequest, MutationResult};
pub use retry::{Executor, Sleeper, ThreadSleeper};
pub use session::Session;
pub use transport::{ApiRequest, HttpTransport, RawResponse, Transport};
