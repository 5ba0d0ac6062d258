//! Mindsight: Personal-Health Analysis Orchestration
//!
//! Two-speed analysis pipeline for personal mental-health tracking data.
//!
//! ## Architecture
//!
//! - **Orchestrator**: Six-step run sequence with graceful degradation
//! - **Analyzers**: Fast heuristic pass and deep statistical pass
//! - **Analytics Engines**: Per-domain statistics (mood, behavior, therapy)
//! - **Cache**: Fingerprint-keyed result cache with freshness-aware TTL
//! - **Telemetry**: Sanitized lifecycle events behind a sink boundary

pub mod analytics;
pub mod analyzers;
pub mod cache;
pub mod config;
pub mod generation;
pub mod pipeline;
pub mod quality;
pub mod telemetry;
pub mod types;

// Re-export the service object and its construction surface
pub use pipeline::{InsightPipeline, PipelineInitError, PipelineStats};

// Re-export configuration
pub use config::{FlagReader, PipelineConfig, AI_UNIFIED_PIPELINE};

// Re-export commonly used types
pub use types::{
    AnalysisContent, AnalysisOutcome, ErrorCategory, InputKind, PipelineInput, PipelineResult,
    Provenance, QualityLevel, QualityMetadata, RecordBundle, RequestContext, ResultSource,
    SourceDomain,
};

// Re-export cache surface
pub use cache::{CacheManager, CacheStats, InsightCache, MemoryCache, SledCache};

// Re-export generation and telemetry seams
pub use generation::{GeneratedInsight, GenerationContext, InsightGenerator, ScriptedGenerator};
pub use telemetry::{MemorySink, TelemetryEvent, TelemetrySink, TracingSink};

// Re-export quality estimation
pub use quality::{estimate_quality_level, QualityInputs};
