//! Pipeline output: outcome payload, quality metadata, error descriptor

use serde::{Deserialize, Serialize};

use super::analytics::{AnalyticsSnapshot, DailyMoodBucket};
use super::input::SourceDomain;

/// How the returned result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    /// Full deep pass computed within this call. Surfaces as the
    /// `unified` display badge.
    Fresh,
    /// Served from an unexpired cache entry.
    Cache,
    /// Heuristic-only pass (flag off, quick phase, or degraded).
    Heuristic,
    /// Equivalent tag for a full deep pass, accepted from entries
    /// serialized by other builds.
    Unified,
}

impl ResultSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Cache => "cache",
            Self::Heuristic => "heuristic",
            Self::Unified => "unified",
        }
    }
}

impl std::fmt::Display for ResultSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse origin tag surfaced to the user as a quality badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Unified,
    Cache,
    Heuristic,
}

impl Provenance {
    /// Map a stored source tag onto its display provenance.
    ///
    /// Accepts arbitrary strings because cache entries written by older
    /// builds carry tags this build no longer emits. Unrecognized tags
    /// collapse to `Heuristic`, never to `Unified`.
    pub fn from_source(source: &str) -> Self {
        match source {
            "fresh" | "unified" => Self::Unified,
            "cache" => Self::Cache,
            "heuristic" => Self::Heuristic,
            _ => Self::Heuristic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unified => "unified",
            Self::Cache => "cache",
            Self::Heuristic => "heuristic",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Three-tier quality label derived by the quality estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    High,
    Medium,
    Low,
}

impl QualityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure classification carried by results and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Content malformed for the declared kind. Terminal.
    InvalidInput,
    /// Deep or external analyzer failed or timed out. Recovered by
    /// degrading to the heuristic pass.
    AnalyzerFailure,
    /// The key/value layer failed. Non-fatal, treated as a miss.
    CacheIoError,
    /// Flag reader unreachable. Treated as flag-disabled.
    ConfigUnavailable,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::AnalyzerFailure => "ANALYZER_FAILURE",
            Self::CacheIoError => "CACHE_IO_ERROR",
            Self::ConfigUnavailable => "CONFIG_UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quality and provenance descriptor attached to every result.
///
/// `quality_level` is always derived from the other fields by the
/// quality estimator, never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetadata {
    pub source: ResultSource,
    pub quality_level: QualityLevel,
    pub confidence: f64,
    pub sample_size: usize,
    /// Age of the underlying computation in milliseconds. Unset for
    /// results computed within the current call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_ms: Option<u64>,
    pub processing_time_ms: u64,
}

impl QualityMetadata {
    /// Display provenance for this result's badge.
    pub fn provenance(&self) -> Provenance {
        Provenance::from_source(self.source.as_str())
    }
}

/// One ranked insight within the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub domain: SourceDomain,
    pub title: String,
    pub body: String,
    /// Ranking weight, higher first.
    pub score: f64,
}

/// Aggregated statistics attached to the outcome.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyticsReport {
    #[serde(default)]
    pub snapshots: Vec<AnalyticsSnapshot>,
    /// Per-day mood buckets for aggregated charts. Empty for domains
    /// without mood entries.
    #[serde(default)]
    pub daily_moods: Vec<DailyMoodBucket>,
}

/// The analyzed payload returned on success.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Ordered best-first by `score`.
    #[serde(default)]
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub analytics: AnalyticsReport,
}

/// Failure detail surfaced to the caller. Messages are short static
/// descriptions, never raw analyzer errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub category: ErrorCategory,
    pub message: String,
}

/// Return value of every orchestrator call. Immutable after return;
/// the caller re-derives display badges from `metadata` as needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    #[serde(rename = "result", default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<AnalysisOutcome>,
    pub metadata: QualityMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescriptor>,
}

impl PipelineResult {
    /// Terminal failure without an outcome. No analyzer was run, so the
    /// metadata carries floor values consistent with the estimator.
    pub fn failure(category: ErrorCategory, message: impl Into<String>, processing_time_ms: u64) -> Self {
        Self {
            success: false,
            outcome: None,
            metadata: QualityMetadata {
                source: ResultSource::Heuristic,
                quality_level: QualityLevel::Low,
                confidence: 0.0,
                sample_size: 0,
                freshness_ms: None,
                processing_time_ms,
            },
            error: Some(ErrorDescriptor {
                category,
                message: message.into(),
            }),
        }
    }
}
