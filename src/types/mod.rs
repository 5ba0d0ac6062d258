//! Shared data structures for the analysis pipeline
//!
//! This module defines the core types flowing through an orchestrator call:
//! - Input: PipelineInput, AnalysisContent, RequestContext
//! - Domain records: MoodEntry, CompulsionRecord, TherapyRecord
//! - Analytics: AnalyticsSnapshot, Trend, DailyMoodBucket
//! - Output: PipelineResult, QualityMetadata, ErrorCategory
//!
//! Everything here is plain data: serde-serializable, with validation and
//! small derivations only. The orchestrator and analyzers own the logic.

mod analytics;
mod input;
mod records;
mod result;

pub use analytics::*;
pub use input::*;
pub use records::*;
pub use result::*;
