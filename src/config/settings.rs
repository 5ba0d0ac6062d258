//! Pipeline configuration - recognized options as typed TOML values
//!
//! Every option the pipeline consults is a field here. Each struct
//! implements `Default`, ensuring unchanged behavior when no config file
//! is present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a pipeline deployment.
///
/// Load with `PipelineConfig::load()` which searches:
/// 1. `$MINDSIGHT_CONFIG` env var
/// 2. `./mindsight.toml`
/// 3. Built-in defaults
///
/// The loaded value is passed into [`crate::pipeline::InsightPipeline`]
/// at construction; there is no global registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Analyzer path selection
    #[serde(default)]
    pub pipeline: PipelineOptions,

    /// Result cache tuning
    #[serde(default)]
    pub cache: CacheOptions,

    /// Telemetry emission
    #[serde(default)]
    pub telemetry: TelemetryOptions,
}

impl PipelineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$MINDSIGHT_CONFIG` environment variable
    /// 2. `./mindsight.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var("MINDSIGHT_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded pipeline config from MINDSIGHT_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from MINDSIGHT_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "MINDSIGHT_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./mindsight.toml
        let local = PathBuf::from("mindsight.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded pipeline config from ./mindsight.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./mindsight.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No mindsight.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate options for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.cache.ttl_ms == 0 {
            errors.push("cache.ttl_ms must be > 0".to_string());
        }
        if let Some(path) = &self.cache.path {
            if path.as_os_str().is_empty() {
                errors.push("cache.path must not be empty when set".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error ({0}): {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("config parse error ({0}): {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Pipeline Options
// ============================================================================

/// Which analyzer path `process()` is allowed to take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Capability flag backing `AI_UNIFIED_PIPELINE`. When false, every
    /// call takes the heuristic path.
    #[serde(default = "default_deep_path_enabled")]
    pub deep_path_enabled: bool,

    /// Bypass switch for verification builds: forces deterministic
    /// analyzer output (no external generator, no timing jitter in the
    /// outcome payload).
    #[serde(default)]
    pub stub_analyzers: bool,
}

fn default_deep_path_enabled() -> bool {
    true
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            deep_path_enabled: default_deep_path_enabled(),
            stub_analyzers: false,
        }
    }
}

// ============================================================================
// Cache Options
// ============================================================================

/// Result cache tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheOptions {
    /// Entry time-to-live in milliseconds. Verification builds set a
    /// short override here; production keeps the one-hour default.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// On-disk location for the sled-backed cache. Unset keeps results
    /// in an in-memory store that does not survive a restart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_ttl_ms() -> u64 {
    3_600_000
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
            path: None,
        }
    }
}

// ============================================================================
// Telemetry Options
// ============================================================================

/// Telemetry emission toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryOptions {
    /// When false, events are constructed but not delivered.
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,
}

fn default_telemetry_enabled() -> bool {
    true
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
