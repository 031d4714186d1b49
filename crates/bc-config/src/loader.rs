// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Layer loading and merging
//!
//! Layers are converted to JSON objects and merged in increasing precedence:
//! built-in defaults, the TOML file, then `BC_*` environment variables.

use serde_json::Value as J;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::paths::user_config_path;
use crate::ConsoleConfig;

pub const ENV_PREFIX: &str = "BC";

/// Where the effective configuration came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub file: Option<PathBuf>,
    pub env_keys: Vec<String>,
}

/// Load from the process environment and the given or default config file
pub fn load(explicit_file: Option<&Path>) -> ConfigResult<(ConsoleConfig, LoadReport)> {
    load_with_env(explicit_file, user_config_path().as_deref(), None)
}

/// Load with an explicit environment map instead of the process environment
///
/// An explicitly requested file must exist; the default file is optional.
pub fn load_with_env(
    explicit_file: Option<&Path>,
    default_file: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> ConfigResult<(ConsoleConfig, LoadReport)> {
    let mut report = LoadReport::default();
    let mut merged = serde_json::to_value(ConsoleConfig::default())?;

    let file = match explicit_file {
        Some(path) if !path.exists() => return Err(ConfigError::MissingFile(path.to_path_buf())),
        Some(path) => Some(path),
        None => default_file.filter(|path| path.exists()),
    };
    if let Some(path) = file {
        merge_two_json(&mut merged, read_toml_layer(path)?);
        report.file = Some(path.to_path_buf());
    }

    let env_layer = env_overlay(env)?;
    if let J::Object(map) = &env_layer {
        report.env_keys = map.keys().cloned().collect();
    }
    merge_two_json(&mut merged, env_layer);

    let config: ConsoleConfig = serde_json::from_value(merged)?;
    config.validate()?;
    tracing::debug!(file = ?report.file, env_keys = ?report.env_keys, "Configuration loaded");
    Ok((config, report))
}

/// Parse a TOML file into a JSON layer
pub fn read_toml_layer(path: &Path) -> ConfigResult<J> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: toml::Value = toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::to_value(value)?)
}

/// JSON layer from `BC_*` variables, `BC_POLL_INTERVAL_MS` becoming `poll-interval-ms`
pub fn env_overlay(env: Option<HashMap<String, String>>) -> ConfigResult<J> {
    let built = config::Config::builder()
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .convert_case(config::Case::Kebab)
                .source(env),
        )
        .build()?;

    Ok(serde_json::to_value(built.try_deserialize::<serde_json::Map<String, J>>()?)?)
}

/// Deep-merge `layer` into `base`; arrays and scalars replace, nulls are ignored
pub fn merge_two_json(base: &mut J, layer: J) {
    match (base, layer) {
        (J::Object(a), J::Object(b)) => {
            for (k, v) in b {
                merge_two_json(a.entry(k).or_insert(J::Null), v);
            }
        }
        (_, J::Null) => {}
        (a, b) => *a = b,
    }
}
