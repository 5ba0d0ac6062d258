//! Behavior Analytics Engine
//!
//! Aggregates compulsion records by category into frequency patterns and
//! derives a duration/intensity baseline for the window. Falling
//! intensity reads as an improving trend.

use std::collections::BTreeMap;

use super::stats;
use crate::types::{
    confidence_from_samples, AnalyticsSnapshot, CompulsionRecord, SourceDomain,
};

/// Frequency pattern for one compulsion category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPattern {
    pub category: String,
    pub occurrences: usize,
    pub total_duration_secs: f64,
    pub mean_intensity: f64,
}

/// Window-level duration/intensity baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorBaseline {
    pub mean_duration_secs: f64,
    pub mean_intensity: f64,
    /// Fraction of episodes the user resisted.
    pub resist_rate: f64,
}

/// Behavior engine output.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorAnalysis {
    pub snapshot: AnalyticsSnapshot,
    /// Most frequent categories first.
    pub patterns: Vec<CategoryPattern>,
    pub baseline: Option<BehaviorBaseline>,
}

/// Per-domain statistics over a time-ordered compulsion window.
pub struct BehaviorEngine;

impl BehaviorEngine {
    pub fn analyze(records: &[CompulsionRecord]) -> BehaviorAnalysis {
        let total = records.len();
        let valid: Vec<&CompulsionRecord> = records.iter().filter(|r| r.is_valid()).collect();

        if valid.is_empty() {
            return BehaviorAnalysis {
                snapshot: AnalyticsSnapshot::empty(SourceDomain::Behavior),
                patterns: Vec::new(),
                baseline: None,
            };
        }

        let intensities: Vec<f64> = valid.iter().map(|r| r.intensity).collect();
        let durations: Vec<f64> = valid.iter().map(|r| r.duration_secs).collect();
        let resisted = valid.iter().filter(|r| r.resisted).count();

        let snapshot = AnalyticsSnapshot {
            domain: SourceDomain::Behavior,
            sample_size: valid.len(),
            central_value: Some(stats::mean(&intensities)),
            volatility: stats::std_dev(&intensities),
            confidence: confidence_from_samples(valid.len()),
            // Lower intensity is the good direction here.
            trend: stats::classify_trend(&intensities, false),
            data_quality: valid.len() as f64 / total as f64,
        };

        let baseline = BehaviorBaseline {
            mean_duration_secs: stats::mean(&durations),
            mean_intensity: stats::mean(&intensities),
            resist_rate: resisted as f64 / valid.len() as f64,
        };

        BehaviorAnalysis {
            snapshot,
            patterns: Self::category_patterns(&valid),
            baseline: Some(baseline),
        }
    }

    /// Group the window by category, most frequent first. Ties resolve
    /// alphabetically so repeated runs stay stable.
    fn category_patterns(valid: &[&CompulsionRecord]) -> Vec<CategoryPattern> {
        let mut by_category: BTreeMap<&str, Vec<&CompulsionRecord>> = BTreeMap::new();
        for record in valid {
            by_category
                .entry(record.category.as_str())
                .or_default()
                .push(record);
        }

        let mut patterns: Vec<CategoryPattern> = by_category
            .into_iter()
            .map(|(category, records)| {
                let intensities: Vec<f64> = records.iter().map(|r| r.intensity).collect();
                CategoryPattern {
                    category: category.to_string(),
                    occurrences: records.len(),
                    total_duration_secs: records.iter().map(|r| r.duration_secs).sum::<f64>(),
                    mean_intensity: stats::mean(&intensities),
                }
            })
            .collect();

        patterns.sort_by(|a, b| {
            b.occurrences
                .cmp(&a.occurrences)
                .then_with(|| a.category.cmp(&b.category))
        });
        patterns
    }
}
