//! Statistical summary types shared by the per-domain analytics engines

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::input::SourceDomain;

/// Direction of change across the analyzed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    /// Not enough points to classify.
    Unknown,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Declining => "declining",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Map a sample count onto an analysis confidence score.
///
/// Small windows are heavily discounted; confidence saturates at 0.9
/// rather than 1.0 because self-reported data always carries noise.
pub fn confidence_from_samples(samples: usize) -> f64 {
    match samples {
        0..=2 => 0.2,
        3..=6 => 0.45,
        7..=13 => 0.65,
        14..=29 => 0.8,
        _ => 0.9,
    }
}

/// One domain's statistical summary over the analyzed window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub domain: SourceDomain,
    /// Number of valid records that fed the summary.
    pub sample_size: usize,
    /// Domain-specific central tendency (median mood, mean intensity, ...).
    pub central_value: Option<f64>,
    /// Domain-specific spread (standard deviation of the series).
    pub volatility: Option<f64>,
    /// Derived from `sample_size` via [`confidence_from_samples`].
    pub confidence: f64,
    pub trend: Trend,
    /// Fraction of input records that passed validity checks, 0.0..=1.0.
    pub data_quality: f64,
}

impl AnalyticsSnapshot {
    /// Summary for a window with no usable records.
    pub fn empty(domain: SourceDomain) -> Self {
        Self {
            domain,
            sample_size: 0,
            central_value: None,
            volatility: None,
            confidence: confidence_from_samples(0),
            trend: Trend::Unknown,
            data_quality: 0.0,
        }
    }
}

/// Mood entries for one calendar day, collapsed to a median.
///
/// `median` is `None` when every entry that day sat exactly on the
/// neutral midpoint; `count_real` then reports how many entries were
/// off-neutral (zero in that case).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMoodBucket {
    pub date: NaiveDate,
    pub median: Option<f64>,
    /// Entries recorded that day, neutral ones included.
    pub count: usize,
    /// Entries that deviated from the neutral midpoint.
    pub count_real: usize,
}
