//! Pipeline Configuration Module
//!
//! Provides deployment configuration loaded from TOML files, plus the
//! capability-flag reader the orchestrator consults per call.
//!
//! ## Loading Order
//!
//! 1. `MINDSIGHT_CONFIG` environment variable (path to TOML file)
//! 2. `mindsight.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Load once at startup and pass the value into the pipeline constructor:
//!
//! ```ignore
//! let config = PipelineConfig::load();
//! let pipeline = InsightPipeline::builder(config)...build();
//! ```
//!
//! There is deliberately no process-global config cell; everything that
//! needs an option receives it explicitly.

mod flags;
mod settings;

pub use flags::*;
pub use settings::*;
