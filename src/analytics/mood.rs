//! Mood Analytics Engine
//!
//! Window-level mood statistics plus per-day buckets for aggregated
//! charts. Bucket medians deliberately exclude the neutral midpoint:
//! untouched default sliders would otherwise drown out the entries where
//! the user actually reported something.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::stats;
use crate::types::{
    confidence_from_samples, AnalyticsSnapshot, DailyMoodBucket, MoodEntry, SourceDomain,
};

/// Mood engine output: the window snapshot plus chart buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodAnalysis {
    pub snapshot: AnalyticsSnapshot,
    /// One bucket per calendar day carrying at least one valid entry,
    /// in date order.
    pub daily: Vec<DailyMoodBucket>,
}

/// Per-domain statistics over a time-ordered mood window.
pub struct MoodEngine;

impl MoodEngine {
    /// Analyze a window of entries ordered by time.
    ///
    /// Invalid entries (out-of-range or non-finite scores) are excluded
    /// from every statistic and discount `data_quality` instead.
    pub fn analyze(entries: &[MoodEntry]) -> MoodAnalysis {
        let total = entries.len();
        let valid: Vec<&MoodEntry> = entries.iter().filter(|e| e.is_valid()).collect();

        if valid.is_empty() {
            return MoodAnalysis {
                snapshot: AnalyticsSnapshot::empty(SourceDomain::Mood),
                daily: Vec::new(),
            };
        }

        let scores: Vec<f64> = valid.iter().map(|e| e.score).collect();
        let non_neutral: Vec<f64> = valid
            .iter()
            .filter(|e| e.is_non_neutral())
            .map(|e| e.score)
            .collect();

        let snapshot = AnalyticsSnapshot {
            domain: SourceDomain::Mood,
            sample_size: valid.len(),
            central_value: stats::median(&non_neutral),
            volatility: stats::std_dev(&scores),
            confidence: confidence_from_samples(valid.len()),
            trend: stats::classify_trend(&scores, true),
            data_quality: valid.len() as f64 / total as f64,
        };

        MoodAnalysis {
            snapshot,
            daily: Self::daily_buckets(&valid),
        }
    }

    /// Collapse valid entries into per-day buckets.
    ///
    /// Per bucket: `median` over non-neutral scores only (`None` when the
    /// whole day sat on the midpoint), `count_real` counts the entries
    /// that fed the median, `count` counts every entry that day.
    fn daily_buckets(valid: &[&MoodEntry]) -> Vec<DailyMoodBucket> {
        let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for entry in valid {
            by_day
                .entry(entry.timestamp.date_naive())
                .or_default()
                .push(entry.score);
        }

        by_day
            .into_iter()
            .map(|(date, scores)| {
                let non_neutral: Vec<f64> = scores
                    .iter()
                    .copied()
                    .filter(|s| (s - crate::types::NEUTRAL_MOOD_SCORE).abs() > f64::EPSILON)
                    .collect();
                DailyMoodBucket {
                    date,
                    median: stats::median(&non_neutral),
                    count: scores.len(),
                    count_real: non_neutral.len(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trend;
    use chrono::{TimeZone, Utc};

    fn make_entry(day: u32, hour: u32, score: f64) -> MoodEntry {
        MoodEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).single().unwrap(),
            score,
            note: None,
        }
    }

    #[test]
    fn bucket_median_excludes_neutral_midpoint() {
        // 40 and 60 straddle the midpoint; the neutral 50 must not count.
        let entries = vec![
            make_entry(1, 8, 40.0),
            make_entry(1, 12, 50.0),
            make_entry(1, 20, 60.0),
        ];
        let analysis = MoodEngine::analyze(&entries);

        assert_eq!(analysis.daily.len(), 1);
        let bucket = &analysis.daily[0];
        assert_eq!(bucket.median, Some(50.0));
        assert_eq!(bucket.count_real, 2);
        assert_eq!(bucket.count, 3);
    }

    #[test]
    fn all_neutral_day_has_undefined_median() {
        let entries = vec![make_entry(1, 8, 50.0), make_entry(1, 20, 50.0)];
        let analysis = MoodEngine::analyze(&entries);

        let bucket = &analysis.daily[0];
        assert_eq!(bucket.median, None);
        assert_eq!(bucket.count_real, 0);
        assert_eq!(bucket.count, 2);
        // The window-level central value is equally undefined.
        assert_eq!(analysis.snapshot.central_value, None);
    }

    #[test]
    fn buckets_come_out_in_date_order() {
        let entries = vec![
            make_entry(3, 9, 55.0),
            make_entry(1, 9, 45.0),
            make_entry(2, 9, 60.0),
        ];
        let analysis = MoodEngine::analyze(&entries);

        let dates: Vec<_> = analysis.daily.iter().map(|b| b.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-02", "2024-03-03"]);
    }

    #[test]
    fn invalid_entries_discount_data_quality() {
        let mut entries = vec![
            make_entry(1, 8, 40.0),
            make_entry(1, 12, 70.0),
            make_entry(1, 16, 62.0),
        ];
        entries.push(make_entry(1, 18, 130.0)); // out of range

        let analysis = MoodEngine::analyze(&entries);
        assert_eq!(analysis.snapshot.sample_size, 3);
        assert!((analysis.snapshot.data_quality - 0.75).abs() < 1e-9);
    }

    #[test]
    fn rising_scores_classify_as_improving() {
        let entries: Vec<MoodEntry> = (0..28)
            .map(|i| make_entry(1 + i / 4, 6 * (i % 4), 40.0 + i as f64))
            .collect();
        let analysis = MoodEngine::analyze(&entries);

        assert_eq!(analysis.snapshot.trend, Trend::Improving);
        assert_eq!(analysis.snapshot.sample_size, 28);
        assert_eq!(analysis.snapshot.confidence, 0.8);
    }

    #[test]
    fn empty_window_yields_empty_snapshot() {
        let analysis = MoodEngine::analyze(&[]);
        assert_eq!(analysis.snapshot.sample_size, 0);
        assert_eq!(analysis.snapshot.trend, Trend::Unknown);
        assert!(analysis.daily.is_empty());
    }
}
