//! Full statistical analysis
//!
//! The deep pass is the slow path: it sorts the record window, runs
//! every applicable domain engine, and optionally asks the configured
//! generator for a narrative summary built from aggregates. Any failure
//! here, including a failing generator call, surfaces as an error so
//! the orchestrator can fall back to the fast path.

use std::cmp::Ordering;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::analytics::{BehaviorEngine, MoodEngine, TherapyEngine};
use crate::analyzers::{heuristic, AnalyzerOutput};
use crate::generation::{build_insight_prompt, GenerationContext, InsightGenerator};
use crate::types::{
    confidence_from_samples, AnalysisOutcome, AnalyticsReport, AnalyticsSnapshot, Insight,
    PipelineInput, RecordBundle, SourceDomain, Trend,
};

/// Ranking weight for generator narrative. Always the top slot.
const GENERATED_SCORE: f64 = 0.95;
/// Ranking weight for the snapshot matching the request domain.
const PRIMARY_SNAPSHOT_SCORE: f64 = 0.85;
/// Ranking weight for snapshots from other domains in the bundle.
const SNAPSHOT_SCORE: f64 = 0.75;
/// Ranking weight for behavior pattern findings.
const PATTERN_SCORE: f64 = 0.7;
/// Ranking weight for lexicon hits on an attached transcript.
const TEXT_SCORE: f64 = 0.6;

/// The full statistical pass plus optional narrative generation.
pub struct DeepAnalyzer;

impl DeepAnalyzer {
    /// Run every applicable engine over the input.
    ///
    /// `generator` is consulted only when present; a generator error or
    /// an unsuccessful reply fails the whole pass.
    pub async fn analyze(
        input: &PipelineInput,
        generator: Option<&dyn InsightGenerator>,
    ) -> Result<AnalyzerOutput> {
        let mut insights = Vec::new();
        let mut suggestions = Vec::new();
        let mut snapshots = Vec::new();
        let mut daily_moods = Vec::new();

        if let Some(bundle) = input.content.records() {
            let window = sorted_window(bundle);

            if !window.mood_entries.is_empty() {
                let analysis = MoodEngine::analyze(&window.mood_entries);
                push_snapshot_findings(
                    &analysis.snapshot,
                    input.context.domain,
                    &mut insights,
                    &mut suggestions,
                );
                daily_moods = analysis.daily;
                snapshots.push(analysis.snapshot);
            }

            if !window.compulsion_records.is_empty() {
                let analysis = BehaviorEngine::analyze(&window.compulsion_records);
                push_snapshot_findings(
                    &analysis.snapshot,
                    input.context.domain,
                    &mut insights,
                    &mut suggestions,
                );
                if let Some(pattern) = analysis.patterns.first() {
                    insights.push(Insight {
                        domain: SourceDomain::Behavior,
                        title: format!("Most frequent pattern: {}", pattern.category),
                        body: format!(
                            "{} occurrences totalling {:.0} seconds, mean intensity {:.1}.",
                            pattern.occurrences,
                            pattern.total_duration_secs,
                            pattern.mean_intensity
                        ),
                        score: PATTERN_SCORE,
                    });
                }
                if let Some(baseline) = &analysis.baseline {
                    if baseline.resist_rate < 0.5 {
                        suggestions.push(
                            "Practice delaying one urge per day and log the outcome.".to_string(),
                        );
                    }
                }
                snapshots.push(analysis.snapshot);
            }

            if !window.therapy_records.is_empty() {
                let analysis = TherapyEngine::analyze(&window.therapy_records);
                push_snapshot_findings(
                    &analysis.snapshot,
                    input.context.domain,
                    &mut insights,
                    &mut suggestions,
                );
                if let Some(improvement) = analysis.average_improvement {
                    if improvement > 0.0 {
                        suggestions.push(
                            "Your exercises are paying off; keep the current cadence.".to_string(),
                        );
                    }
                }
                snapshots.push(analysis.snapshot);
            }
        }

        if let Some(text) = input.content.text() {
            for rule in heuristic::scan_transcript(text) {
                insights.push(Insight {
                    domain: rule.domain,
                    title: rule.title.to_string(),
                    body: rule.body.to_string(),
                    score: TEXT_SCORE,
                });
                suggestions.push(rule.suggestion.to_string());
            }
        }

        let sample_size: usize = snapshots.iter().map(|s| s.sample_size).sum();
        let confidence = snapshots
            .iter()
            .map(|s| s.confidence)
            .fold(confidence_from_samples(0), f64::max);
        let data_quality = aggregate_data_quality(&snapshots);

        if let Some(generator) = generator {
            let prompt = build_insight_prompt(&snapshots);
            let context = GenerationContext {
                domain: input.context.domain,
                sample_size,
                trend: primary_trend(&snapshots, input.context.domain),
            };
            debug!(
                generator = generator.generator_name(),
                domain = %context.domain,
                "requesting narrative summary"
            );
            let generated = generator
                .generate(&prompt, &context)
                .await
                .context("insight generation failed")?;
            if !generated.success {
                bail!("insight generator declined to produce content");
            }
            insights.push(Insight {
                domain: input.context.domain,
                title: "Narrative summary".to_string(),
                body: generated.content,
                score: GENERATED_SCORE,
            });
        }

        insights.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        Ok(AnalyzerOutput {
            outcome: AnalysisOutcome {
                insights,
                suggestions,
                analytics: AnalyticsReport { snapshots, daily_moods },
            },
            confidence,
            sample_size,
            data_quality,
        })
    }
}

/// Clone the bundle with every collection in time order. Engines
/// require ordered windows for trend work.
fn sorted_window(bundle: &RecordBundle) -> RecordBundle {
    let mut window = bundle.clone();
    window.mood_entries.sort_by_key(|e| e.timestamp);
    window.compulsion_records.sort_by_key(|r| r.timestamp);
    window.therapy_records.sort_by_key(|r| r.timestamp);
    window
}

/// Sample-weighted mean of per-engine data quality.
fn aggregate_data_quality(snapshots: &[AnalyticsSnapshot]) -> Option<f64> {
    let total: usize = snapshots.iter().map(|s| s.sample_size).sum();
    if total == 0 {
        return None;
    }
    let weighted: f64 = snapshots
        .iter()
        .map(|s| s.data_quality * s.sample_size as f64)
        .sum();
    Some(weighted / total as f64)
}

/// Trend of the snapshot matching the request domain, falling back to
/// the largest window, then to unknown.
fn primary_trend(snapshots: &[AnalyticsSnapshot], domain: SourceDomain) -> Trend {
    if let Some(snapshot) = snapshots.iter().find(|s| s.domain == domain) {
        return snapshot.trend;
    }
    snapshots
        .iter()
        .max_by_key(|s| s.sample_size)
        .map_or(Trend::Unknown, |s| s.trend)
}

fn fmt_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}"))
}

/// Turn one snapshot into a ranked insight and a trend-driven
/// suggestion.
fn push_snapshot_findings(
    snapshot: &AnalyticsSnapshot,
    request_domain: SourceDomain,
    insights: &mut Vec<Insight>,
    suggestions: &mut Vec<String>,
) {
    let title = match (snapshot.domain, snapshot.trend) {
        (SourceDomain::Mood, Trend::Improving) => "Mood is trending upward",
        (SourceDomain::Mood, Trend::Declining) => "Mood is trending downward",
        (SourceDomain::Mood, Trend::Stable) => "Mood is holding steady",
        (SourceDomain::Mood, Trend::Unknown) => "Not enough mood data for a trend yet",
        (SourceDomain::Behavior, Trend::Improving) => "Urge intensity is easing",
        (SourceDomain::Behavior, Trend::Declining) => "Urge intensity is climbing",
        (SourceDomain::Behavior, Trend::Stable) => "Urge intensity is steady",
        (SourceDomain::Behavior, Trend::Unknown) => "Not enough urge data for a trend yet",
        (SourceDomain::Therapy, Trend::Improving) => "Exercise gains are growing",
        (SourceDomain::Therapy, Trend::Declining) => "Exercise gains are shrinking",
        (SourceDomain::Therapy, Trend::Stable) => "Exercise gains are steady",
        (SourceDomain::Therapy, Trend::Unknown) => "Not enough session data for a trend yet",
        (SourceDomain::Journal, _) => "Journal window analyzed",
    };
    let score = if snapshot.domain == request_domain {
        PRIMARY_SNAPSHOT_SCORE
    } else {
        SNAPSHOT_SCORE
    };
    insights.push(Insight {
        domain: snapshot.domain,
        title: title.to_string(),
        body: format!(
            "Central value {} with spread {} across {} records.",
            fmt_metric(snapshot.central_value),
            fmt_metric(snapshot.volatility),
            snapshot.sample_size
        ),
        score,
    });

    match (snapshot.domain, snapshot.trend) {
        (SourceDomain::Mood, Trend::Declining) => {
            suggestions.push("Consider scheduling a therapy exercise this week.".to_string());
        }
        (SourceDomain::Behavior, Trend::Declining) => {
            suggestions.push("Revisit your delay techniques while intensity climbs.".to_string());
        }
        (SourceDomain::Therapy, Trend::Improving) => {
            suggestions.push("Recent exercises are working; repeat what you did last.".to_string());
        }
        _ => {}
    }
}
