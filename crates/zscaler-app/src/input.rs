//! Test input files and asset configuration.
//!
//! The asset configuration is merged from three layers, later ones winning:
//! the `--config` file, the `config` object embedded in the test input, and
//! the `ZSCALER_*` environment variables / command-line overrides.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use zscaler_core::{GatewayConfig, Parameters};

use crate::error::{AppError, Result};

/// A host-style test input.
#[derive(Debug, Clone, Deserialize)]
pub struct TestInput {
    /// Action identifier, e.g. `block_url`.
    #[serde(alias = "action")]
    pub identifier: String,
    /// Asset configuration embedded in the input.
    #[serde(default)]
    pub config: Option<Value>,
    /// One parameter object per action run.
    #[serde(default)]
    pub parameters: Vec<Parameters>,
}

impl TestInput {
    /// Reads a test input file.
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }

    /// Parameter sets to run. An input without any runs once with no parameters.
    pub fn parameter_sets(&self) -> Vec<Parameters> {
        if self.parameters.is_empty() {
            vec![Parameters::new()]
        } else {
            self.parameters.clone()
        }
    }
}

/// Individual configuration fields set from the command line or environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
}

impl Overrides {
    fn apply(&self, config: &mut Map<String, Value>) {
        for (key, value) in [
            ("base_url", &self.base_url),
            ("username", &self.username),
            ("password", &self.password),
            ("api_key", &self.api_key),
        ] {
            if let Some(value) = value {
                config.insert(key.to_string(), Value::String(value.clone()));
            }
        }
    }
}

/// Merges the configuration layers into a validated [`GatewayConfig`].
pub fn resolve_config(
    file: Option<&Path>,
    embedded: Option<&Value>,
    overrides: &Overrides,
) -> Result<GatewayConfig> {
    let mut merged = Map::new();

    if let Some(path) = file {
        let value: Value = read_json(path)?;
        merge(&mut merged, &value, "config file")?;
    }
    if let Some(value) = embedded {
        merge(&mut merged, value, "embedded config")?;
    }
    overrides.apply(&mut merged);

    let config: GatewayConfig = serde_json::from_value(Value::Object(merged))
        .map_err(|e| AppError::Config(e.to_string()))?;
    config
        .validate()
        .map_err(|e| AppError::Config(e.to_string()))?;

    tracing::debug!(?config, "Resolved asset configuration");
    Ok(config)
}

fn merge(target: &mut Map<String, Value>, layer: &Value, origin: &str) -> Result<()> {
    match layer {
        Value::Object(fields) => {
            target.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            Ok(())
        }
        Value::Null => Ok(()),
        _ => Err(AppError::Config(format!("{} must be a JSON object", origin))),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })
}
