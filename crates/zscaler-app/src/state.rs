//! Persisted state blob.
//!
//! An opaque JSON object loaded at startup and written back at shutdown.
//! The client core never reads it; the harness records the last run in it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use directories::ProjectDirs;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// File name used inside the data directory.
pub const STATE_FILE: &str = "state.json";

/// JSON state kept between runs.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    state: Map<String, Value>,
}

impl StateStore {
    /// Default state file in the platform data directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "zscaler", "zscaler-connector")
            .map(|dirs| dirs.data_dir().join(STATE_FILE))
    }

    /// Loads state from `path`. A missing or unreadable file yields empty state.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(state) => state,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring corrupt state file");
                    Map::new()
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No saved state");
                Map::new()
            }
        };

        Self { path, state }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.state
    }

    /// Notes the action and outcome of the run just finished.
    pub fn record_run(&mut self, identifier: &str, succeeded: bool) {
        self.state
            .insert("last_action".to_string(), Value::String(identifier.to_string()));
        self.state
            .insert("last_run_succeeded".to_string(), Value::Bool(succeeded));
        self.state.insert(
            "last_run_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
    }

    /// Writes the state back, creating the parent directory if needed.
    pub fn save(&self) -> Result<()> {
        let io_error = |source: std::io::Error| AppError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let text = serde_json::to_string_pretty(&self.state).map_err(|source| AppError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, text).map_err(io_error)?;

        debug!(path = %self.path.display(), "State saved");
        Ok(())
    }
}
