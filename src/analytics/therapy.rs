//! Therapy Analytics Engine
//!
//! Summarizes structured exercise sessions by their before/after rating
//! delta. A rising improvement series reads as an improving trend.

use super::stats;
use crate::types::{confidence_from_samples, AnalyticsSnapshot, SourceDomain, TherapyRecord};

/// Therapy engine output.
#[derive(Debug, Clone, PartialEq)]
pub struct TherapyAnalysis {
    pub snapshot: AnalyticsSnapshot,
    /// Mean of `after - before` across valid sessions.
    pub average_improvement: Option<f64>,
}

/// Per-domain statistics over a time-ordered therapy window.
pub struct TherapyEngine;

impl TherapyEngine {
    pub fn analyze(records: &[TherapyRecord]) -> TherapyAnalysis {
        let total = records.len();
        let valid: Vec<&TherapyRecord> = records.iter().filter(|r| r.is_valid()).collect();

        if valid.is_empty() {
            return TherapyAnalysis {
                snapshot: AnalyticsSnapshot::empty(SourceDomain::Therapy),
                average_improvement: None,
            };
        }

        let improvements: Vec<f64> = valid.iter().map(|r| r.improvement()).collect();
        let average = stats::mean(&improvements);

        let snapshot = AnalyticsSnapshot {
            domain: SourceDomain::Therapy,
            sample_size: valid.len(),
            central_value: Some(average),
            volatility: stats::std_dev(&improvements),
            confidence: confidence_from_samples(valid.len()),
            trend: stats::classify_trend(&improvements, true),
            data_quality: valid.len() as f64 / total as f64,
        };

        TherapyAnalysis {
            snapshot,
            average_improvement: Some(average),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trend;
    use chrono::{TimeZone, Utc};

    fn make_record(day: u32, before: f64, after: f64) -> TherapyRecord {
        TherapyRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, 18, 0, 0).single().unwrap(),
            exercise: "exposure".to_string(),
            mood_before: before,
            mood_after: after,
        }
    }

    #[test]
    fn average_improvement_is_mean_of_deltas() {
        let records = vec![
            make_record(1, 40.0, 55.0), // +15
            make_record(2, 45.0, 50.0), // +5
            make_record(3, 50.0, 60.0), // +10
        ];
        let analysis = TherapyEngine::analyze(&records);

        assert_eq!(analysis.average_improvement, Some(10.0));
        assert_eq!(analysis.snapshot.central_value, Some(10.0));
        assert_eq!(analysis.snapshot.sample_size, 3);
    }

    #[test]
    fn sessions_can_report_negative_improvement() {
        let records = vec![make_record(1, 60.0, 45.0), make_record(2, 55.0, 50.0)];
        let analysis = TherapyEngine::analyze(&records);
        assert_eq!(analysis.average_improvement, Some(-10.0));
    }

    #[test]
    fn growing_deltas_classify_as_improving() {
        let records: Vec<TherapyRecord> = (0..20)
            .map(|i| make_record(1 + i, 50.0, 50.0 + i as f64))
            .collect();
        let analysis = TherapyEngine::analyze(&records);
        assert_eq!(analysis.snapshot.trend, Trend::Improving);
    }

    #[test]
    fn out_of_scale_ratings_are_excluded() {
        let records = vec![
            make_record(1, 40.0, 50.0),
            make_record(2, -5.0, 50.0), // before out of range
            make_record(3, 45.0, 55.0),
        ];
        let analysis = TherapyEngine::analyze(&records);
        assert_eq!(analysis.snapshot.sample_size, 2);
        assert_eq!(analysis.average_improvement, Some(10.0));
    }

    #[test]
    fn empty_window_has_no_average() {
        let analysis = TherapyEngine::analyze(&[]);
        assert!(analysis.average_improvement.is_none());
        assert_eq!(analysis.snapshot.sample_size, 0);
    }
}
