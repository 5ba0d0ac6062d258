//! Quality estimation - pure mapping from analysis evidence to a badge level
//!
//! The estimator never touches the pipeline state: it is a total function
//! of the evidence handed to it, so every caller that stores or replays a
//! result can re-derive the same badge. Downstream UI badges depend on the
//! exact boundary values here; change them only together with the
//! presentation layer.

use serde::{Deserialize, Serialize};

use crate::types::QualityLevel;

/// Decision boundaries for the quality badge.
pub mod quality_thresholds {
    /// Minimum confidence for a high badge (inclusive).
    pub const HIGH_CONFIDENCE_MIN: f64 = 0.8;
    /// Minimum sample count for a high badge (inclusive).
    pub const HIGH_SAMPLE_MIN: usize = 10;
    /// Minimum reported data quality for a high badge (inclusive).
    /// Unreported data quality does not block a high badge.
    pub const HIGH_DATA_QUALITY_MIN: f64 = 0.8;
    /// Result age at or beyond which a high badge is withheld (30 min).
    pub const HIGH_FRESHNESS_MAX_MS: u64 = 1_800_000;
    /// Below this confidence the badge is always low (exclusive).
    pub const LOW_CONFIDENCE_MAX: f64 = 0.5;
    /// At or below this sample count the badge is always low.
    pub const LOW_SAMPLE_MAX: usize = 2;
}

/// Evidence feeding one badge decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityInputs {
    pub confidence: f64,
    pub sample_size: usize,
    /// Fraction of records that passed validity checks. `None` when the
    /// path that produced the result does not measure it.
    pub data_quality: Option<f64>,
    /// Age of the underlying computation. `None` for results computed
    /// within the current call.
    pub freshness_ms: Option<u64>,
}

impl QualityInputs {
    /// Evidence for a result computed just now, with no validity measure.
    pub fn fresh(confidence: f64, sample_size: usize) -> Self {
        Self {
            confidence,
            sample_size,
            data_quality: None,
            freshness_ms: None,
        }
    }
}

/// Map evidence onto the three-tier badge. Ordered, first match wins:
///
/// 1. `High` needs high confidence AND a real sample AND (good or
///    unreported data quality) AND (unknown or young age).
/// 2. `Low` whenever confidence or sample count falls under the floor.
/// 3. `Medium` otherwise.
pub fn estimate_quality_level(inputs: &QualityInputs) -> QualityLevel {
    use quality_thresholds::*;

    let data_quality_ok = inputs
        .data_quality
        .map_or(true, |dq| dq >= HIGH_DATA_QUALITY_MIN);
    let fresh_enough = inputs
        .freshness_ms
        .map_or(true, |age| age < HIGH_FRESHNESS_MAX_MS);

    if inputs.confidence >= HIGH_CONFIDENCE_MIN
        && inputs.sample_size >= HIGH_SAMPLE_MIN
        && data_quality_ok
        && fresh_enough
    {
        return QualityLevel::High;
    }

    if inputs.confidence < LOW_CONFIDENCE_MAX || inputs.sample_size <= LOW_SAMPLE_MAX {
        return QualityLevel::Low;
    }

    QualityLevel::Medium
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(
        confidence: f64,
        sample_size: usize,
        data_quality: Option<f64>,
        freshness_ms: Option<u64>,
    ) -> QualityInputs {
        QualityInputs {
            confidence,
            sample_size,
            data_quality,
            freshness_ms,
        }
    }

    #[test]
    fn rich_fresh_evidence_is_high() {
        let q = estimate_quality_level(&inputs(0.9, 15, Some(0.85), Some(300_000)));
        assert_eq!(q, QualityLevel::High);
    }

    #[test]
    fn weak_evidence_is_low() {
        let q = estimate_quality_level(&inputs(0.4, 2, Some(0.5), None));
        assert_eq!(q, QualityLevel::Low);
    }

    #[test]
    fn middling_evidence_is_medium() {
        let q = estimate_quality_level(&inputs(0.7, 5, Some(0.75), None));
        assert_eq!(q, QualityLevel::Medium);
    }

    #[test]
    fn high_boundaries_are_inclusive() {
        let q = estimate_quality_level(&inputs(0.8, 10, Some(0.8), Some(1_799_999)));
        assert_eq!(q, QualityLevel::High);
    }

    #[test]
    fn freshness_boundary_is_exclusive() {
        // Exactly 30 minutes old no longer qualifies as high.
        let q = estimate_quality_level(&inputs(0.9, 15, Some(0.9), Some(1_800_000)));
        assert_eq!(q, QualityLevel::Medium);
    }

    #[test]
    fn unreported_fields_do_not_block_high() {
        let q = estimate_quality_level(&inputs(0.85, 12, None, None));
        assert_eq!(q, QualityLevel::High);
    }

    #[test]
    fn tiny_sample_is_low_even_with_high_confidence() {
        let q = estimate_quality_level(&inputs(0.95, 2, Some(0.95), None));
        assert_eq!(q, QualityLevel::Low);
    }

    #[test]
    fn low_confidence_is_low_even_with_large_sample() {
        let q = estimate_quality_level(&inputs(0.45, 100, Some(0.95), None));
        assert_eq!(q, QualityLevel::Low);
    }

    #[test]
    fn poor_data_quality_blocks_high_but_not_medium() {
        let q = estimate_quality_level(&inputs(0.9, 20, Some(0.6), Some(1_000)));
        assert_eq!(q, QualityLevel::Medium);
    }

    #[test]
    fn confidence_floor_is_exclusive_at_half() {
        // 0.5 exactly is not "below 0.5".
        let q = estimate_quality_level(&inputs(0.5, 5, None, None));
        assert_eq!(q, QualityLevel::Medium);
    }
}
