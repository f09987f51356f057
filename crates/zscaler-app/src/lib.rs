//! Zscaler Connector - command-line harness for the gateway client core.
//!
//! This crate provides the pieces the `zscaler-connector` binary is built from:
//!
//! - Test input and asset configuration loading, with environment overrides
//! - The persisted state blob saved between runs
//! - Logging setup (console plus optional daily-rolling file)
//! - Running every parameter set of a test input against one connector
//!
//! # Usage
//!
//! ```ignore
//! use zscaler_app::input::{resolve_config, Overrides, TestInput};
//! use zscaler_app::harness::run_actions;
//! use zscaler_core::Connector;
//!
//! let input = TestInput::load("block_url.json".as_ref()).unwrap();
//! let config = resolve_config(None, input.config.as_ref(), &Overrides::default()).unwrap();
//!
//! let connector = Connector::from_config(&config).unwrap();
//! let results = run_actions(&connector, &input);
//! connector.finalize();
//! ```

pub mod error;
pub mod harness;
pub mod input;
pub mod logging;
pub mod state;

pub use error::{AppError, Result};
pub use input::{resolve_config, Overrides, TestInput};
pub use state::StateStore;
