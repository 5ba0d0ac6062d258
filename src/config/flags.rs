//! Capability flags - the deep-path gate consulted once per call
//!
//! The orchestrator never reads configuration directly to decide which
//! analyzer runs; it asks a [`FlagReader`]. Swapping the reader (remote
//! flag service, static test double) never touches analyzer code.

use std::collections::HashMap;
use thiserror::Error;

use super::settings::PipelineConfig;

/// Flag gating the deep analysis path.
pub const AI_UNIFIED_PIPELINE: &str = "AI_UNIFIED_PIPELINE";

/// Flag backend failure. The orchestrator treats this as flag-disabled
/// and degrades to the heuristic path.
#[derive(Debug, Clone, Error)]
pub enum FlagError {
    #[error("flag backend unreachable: {0}")]
    Unavailable(String),
}

/// Capability-flag reader consumed by the orchestrator.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks.
pub trait FlagReader: Send + Sync {
    /// Whether `flag` is enabled. Unknown flags read as disabled.
    fn is_enabled(&self, flag: &str) -> Result<bool, FlagError>;

    /// Backend name for logging
    fn reader_name(&self) -> &'static str;
}

/// Reader backed by the loaded [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct ConfigFlagReader {
    deep_path_enabled: bool,
}

impl ConfigFlagReader {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            deep_path_enabled: config.pipeline.deep_path_enabled,
        }
    }
}

impl FlagReader for ConfigFlagReader {
    fn is_enabled(&self, flag: &str) -> Result<bool, FlagError> {
        match flag {
            AI_UNIFIED_PIPELINE => Ok(self.deep_path_enabled),
            _ => Ok(false),
        }
    }

    fn reader_name(&self) -> &'static str {
        "Config"
    }
}

/// Fixed flag table for tests and minimal deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticFlagReader {
    flags: HashMap<String, bool>,
}

impl StaticFlagReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(mut self, flag: &str, enabled: bool) -> Self {
        self.flags.insert(flag.to_string(), enabled);
        self
    }
}

impl FlagReader for StaticFlagReader {
    fn is_enabled(&self, flag: &str) -> Result<bool, FlagError> {
        Ok(self.flags.get(flag).copied().unwrap_or(false))
    }

    fn reader_name(&self) -> &'static str {
        "Static"
    }
}
