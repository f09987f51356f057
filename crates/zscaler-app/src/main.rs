//! Zscaler Connector - runs gateway actions from a host-style test input.
//!
//! One invocation is one connector run: log in, run the input's action once
//! per parameter set, log out, and print the results as JSON on stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use zscaler_app::harness::{all_succeeded, run_actions, startup_failure};
use zscaler_app::logging::init_logging;
use zscaler_app::{resolve_config, Overrides, StateStore, TestInput};
use zscaler_core::Connector;

/// Zscaler Connector - drive the Zscaler gateway API from a test input
#[derive(Parser, Debug)]
#[command(name = "zscaler-connector", version, about)]
struct Args {
    /// Test input JSON: {"identifier": ..., "config": {...}, "parameters": [...]}
    input: PathBuf,

    /// Asset configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// State file (defaults to the platform data directory)
    #[arg(long)]
    state: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write daily-rolling log files to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Admin portal URL, without /api/v1
    #[arg(long, env = "ZSCALER_BASE_URL")]
    base_url: Option<String>,

    /// Admin username
    #[arg(long, env = "ZSCALER_USERNAME")]
    username: Option<String>,

    /// Admin password
    #[arg(long, env = "ZSCALER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Tenant API key
    #[arg(long, env = "ZSCALER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    let input = TestInput::load(&args.input)
        .with_context(|| format!("Failed to load test input {}", args.input.display()))?;
    let config = resolve_config(args.config.as_deref(), input.config.as_ref(), &args.overrides())
        .context("Failed to resolve asset configuration")?;

    let mut state = args
        .state
        .clone()
        .or_else(StateStore::default_path)
        .map(StateStore::load);

    let results = match Connector::from_config(&config) {
        Ok(connector) => {
            let results = run_actions(&connector, &input);
            connector.finalize();
            results
        }
        Err(e) => {
            tracing::error!("Connector initialization failed: {}", e);
            vec![startup_failure(&input, &e)]
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&results).context("Failed to serialize results")?
    );

    let succeeded = all_succeeded(&results);
    if let Some(state) = state.as_mut() {
        state.record_run(&input.identifier, succeeded);
        if let Err(e) = state.save() {
            tracing::warn!("Failed to save state: {}", e);
        }
    }

    Ok(succeeded)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = init_logging(&args.log_level, args.debug, args.log_dir.as_deref());

    tracing::info!("Zscaler connector v{} starting", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
