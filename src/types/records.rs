//! Domain record types: MoodEntry, CompulsionRecord, TherapyRecord, RecordBundle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Neutral mood sentinel ("no strong signal") on the 0-100 scale.
///
/// Entries at exactly this value are counted but excluded from
/// central-tendency statistics in the mood engine's daily buckets.
pub const NEUTRAL_MOOD_SCORE: f64 = 50.0;

/// Upper bound of the mood / therapy rating scale.
pub const MOOD_SCALE_MAX: f64 = 100.0;

/// Upper bound of the compulsion urge-intensity scale.
pub const INTENSITY_SCALE_MAX: f64 = 10.0;

/// A single user-logged mood entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub timestamp: DateTime<Utc>,
    /// Mood score on a 0-100 scale; 50 is the neutral sentinel.
    pub score: f64,
    /// Optional free-text note. Never leaves the pipeline unsanitized.
    #[serde(default)]
    pub note: Option<String>,
}

impl MoodEntry {
    /// Whether the score is a usable data point (finite and in range).
    pub fn is_valid(&self) -> bool {
        self.score.is_finite() && (0.0..=MOOD_SCALE_MAX).contains(&self.score)
    }

    /// Whether the score carries signal (valid and not the neutral sentinel).
    pub fn is_non_neutral(&self) -> bool {
        self.is_valid() && (self.score - NEUTRAL_MOOD_SCORE).abs() > f64::EPSILON
    }
}

/// A logged compulsion/behavior occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompulsionRecord {
    pub timestamp: DateTime<Utc>,
    /// User-facing category label (e.g. "checking", "washing").
    pub category: String,
    /// Time spent on the behavior, in seconds.
    pub duration_secs: f64,
    /// Urge intensity on a 0-10 scale.
    pub intensity: f64,
    /// Whether the user resisted acting on the urge.
    #[serde(default)]
    pub resisted: bool,
}

impl CompulsionRecord {
    pub fn is_valid(&self) -> bool {
        self.duration_secs.is_finite()
            && self.duration_secs >= 0.0
            && self.intensity.is_finite()
            && (0.0..=INTENSITY_SCALE_MAX).contains(&self.intensity)
            && !self.category.trim().is_empty()
    }
}

/// A structured therapy note with before/after mood ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapyRecord {
    pub timestamp: DateTime<Utc>,
    /// Exercise or session label (e.g. "exposure-hierarchy-3").
    pub exercise: String,
    /// Mood rating before the session, 0-100.
    pub mood_before: f64,
    /// Mood rating after the session, 0-100.
    pub mood_after: f64,
}

impl TherapyRecord {
    pub fn is_valid(&self) -> bool {
        self.mood_before.is_finite()
            && self.mood_after.is_finite()
            && (0.0..=MOOD_SCALE_MAX).contains(&self.mood_before)
            && (0.0..=MOOD_SCALE_MAX).contains(&self.mood_after)
    }

    /// Rating improvement for this session (`after - before`).
    pub fn improvement(&self) -> f64 {
        self.mood_after - self.mood_before
    }
}

/// Structured bundle of domain records supplied by the caller.
///
/// All fields default to empty so partial bundles deserialize cleanly;
/// an entirely empty bundle is rejected by input validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordBundle {
    #[serde(default)]
    pub mood_entries: Vec<MoodEntry>,
    #[serde(default)]
    pub compulsion_records: Vec<CompulsionRecord>,
    #[serde(default)]
    pub therapy_records: Vec<TherapyRecord>,
}

impl RecordBundle {
    /// Total record count across all domains.
    pub fn len(&self) -> usize {
        self.mood_entries.len() + self.compulsion_records.len() + self.therapy_records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single().unwrap()
    }

    #[test]
    fn neutral_score_is_valid_but_not_signal() {
        let entry = MoodEntry { timestamp: ts(), score: NEUTRAL_MOOD_SCORE, note: None };
        assert!(entry.is_valid());
        assert!(!entry.is_non_neutral());
    }

    #[test]
    fn out_of_range_score_is_invalid() {
        let entry = MoodEntry { timestamp: ts(), score: 140.0, note: None };
        assert!(!entry.is_valid());
        let entry = MoodEntry { timestamp: ts(), score: f64::NAN, note: None };
        assert!(!entry.is_valid());
    }

    #[test]
    fn therapy_improvement_is_after_minus_before() {
        let rec = TherapyRecord {
            timestamp: ts(),
            exercise: "exposure-1".to_string(),
            mood_before: 40.0,
            mood_after: 55.0,
        };
        assert!((rec.improvement() - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bundle_len_counts_all_domains() {
        let bundle = RecordBundle {
            mood_entries: vec![MoodEntry { timestamp: ts(), score: 60.0, note: None }],
            compulsion_records: vec![CompulsionRecord {
                timestamp: ts(),
                category: "checking".to_string(),
                duration_secs: 120.0,
                intensity: 6.0,
                resisted: false,
            }],
            therapy_records: Vec::new(),
        };
        assert_eq!(bundle.len(), 2);
        assert!(!bundle.is_empty());
        assert!(RecordBundle::default().is_empty());
    }
}
