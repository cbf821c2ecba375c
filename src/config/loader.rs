//! Configuration file loading with precedence handling.

use crate::engine::{EngineConfig, DEFAULT_HIGH_WATER, DEFAULT_MARGIN_FACTOR};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A setting parsed but is out of range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Setting name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/vrows/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Culling margin as a multiple of the largest row extent.
    #[serde(default)]
    pub margin_factor: Option<f32>,

    /// Pooled rows kept before inactive ones are destroyed.
    #[serde(default)]
    pub pool_high_water: Option<usize>,

    /// Freeze the container layout between rebuilds.
    #[serde(default)]
    pub freeze_layout: Option<bool>,

    /// Background aggregation worker count.
    #[serde(default)]
    pub aggregation_workers: Option<usize>,

    /// Background aggregation deadline in milliseconds.
    #[serde(default)]
    pub aggregation_timeout_ms: Option<u64>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Culling margin factor.
    pub margin_factor: f32,
    /// Pool high-water mark.
    pub pool_high_water: usize,
    /// Layout freezing.
    pub freeze_layout: bool,
    /// Aggregation workers.
    pub aggregation_workers: usize,
    /// Aggregation deadline in milliseconds.
    pub aggregation_timeout_ms: u64,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            margin_factor: DEFAULT_MARGIN_FACTOR,
            pool_high_water: DEFAULT_HIGH_WATER,
            freeze_layout: true,
            aggregation_workers: 4,
            aggregation_timeout_ms: 50,
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// Engine settings.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            margin_factor: self.margin_factor,
            pool_high_water: self.pool_high_water,
            freeze_layout: self.freeze_layout,
        }
    }

    /// Aggregation deadline.
    pub fn aggregation_timeout(&self) -> Duration {
        Duration::from_millis(self.aggregation_timeout_ms)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.margin_factor.is_finite() || self.margin_factor < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "margin_factor",
                reason: format!("must be a finite non-negative number, got {}", self.margin_factor),
            });
        }
        if self.aggregation_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "aggregation_workers",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/vrows/vrows.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("vrows").join("vrows.log")
    } else {
        PathBuf::from("vrows.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/vrows/config.toml` on Unix, appropriate path on other platforms.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vrows").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `VROWS_CONFIG` environment variable
/// 3. Default path `~/.config/vrows/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var("VROWS_CONFIG") {
        if env_path.is_empty() {
            return Err(ConfigError::InvalidPath("VROWS_CONFIG is empty".to_string()));
        }
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `VROWS_MARGIN_FACTOR`: Override margin factor
/// - `VROWS_FREEZE_LAYOUT`: Override layout freezing (`true`/`false`/`1`/`0`)
///
/// Unparseable values are logged and ignored.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(raw) = std::env::var("VROWS_MARGIN_FACTOR") {
        match raw.trim().parse::<f32>() {
            Ok(factor) => config.margin_factor = factor,
            Err(_) => warn!(value = %raw, "ignoring unparseable VROWS_MARGIN_FACTOR"),
        }
    }

    if let Ok(raw) = std::env::var("VROWS_FREEZE_LAYOUT") {
        match raw.trim() {
            "1" | "true" | "TRUE" | "True" => config.freeze_layout = true,
            "0" | "false" | "FALSE" | "False" => config.freeze_layout = false,
            _ => warn!(value = %raw, "ignoring unparseable VROWS_FREEZE_LAYOUT"),
        }
    }

    config
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        margin_factor: config.margin_factor.unwrap_or(defaults.margin_factor),
        pool_high_water: config.pool_high_water.unwrap_or(defaults.pool_high_water),
        freeze_layout: config.freeze_layout.unwrap_or(defaults.freeze_layout),
        aggregation_workers: config
            .aggregation_workers
            .unwrap_or(defaults.aggregation_workers),
        aggregation_timeout_ms: config
            .aggregation_timeout_ms
            .unwrap_or(defaults.aggregation_timeout_ms),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Settings given on the command line. `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    /// `--margin-factor`
    pub margin_factor: Option<f32>,
    /// `--high-water`
    pub pool_high_water: Option<usize>,
    /// `--no-freeze` (maps to `Some(false)`)
    pub freeze_layout: Option<bool>,
    /// `--workers`
    pub aggregation_workers: Option<usize>,
}

/// Apply CLI argument overrides to resolved config.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(mut config: ResolvedConfig, cli: &CliOverrides) -> ResolvedConfig {
    if let Some(factor) = cli.margin_factor {
        config.margin_factor = factor;
    }
    if let Some(high_water) = cli.pool_high_water {
        config.pool_high_water = high_water;
    }
    if let Some(freeze) = cli.freeze_layout {
        config.freeze_layout = freeze;
    }
    if let Some(workers) = cli.aggregation_workers {
        config.aggregation_workers = workers;
    }
    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
