//! Fast local analysis
//!
//! The heuristic pass runs when the deep path is gated off, as phase one
//! of a progressive request, and as the fallback when the deep path
//! fails. It must answer from what is already in memory: no awaits, no
//! network, no disk.
//!
//! Two inputs feed it. Free text is scanned against a small scenario
//! lexicon; typed records get a coarse aggregate pass well short of the
//! full statistical engines. Everything it emits carries a fixed low
//! confidence, which keeps its results in the low quality tier.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::RegexSet;
use tracing::debug;

use crate::analytics::stats;
use crate::analyzers::AnalyzerOutput;
use crate::types::{
    AnalysisOutcome, Insight, PipelineInput, RecordBundle, SourceDomain, NEUTRAL_MOOD_SCORE,
};

/// Fixed confidence attached to every heuristic result. Deliberately
/// below the medium-tier floor.
pub const HEURISTIC_CONFIDENCE: f64 = 0.35;

/// Ranking weight for lexicon hits.
const SCENARIO_SCORE: f64 = 0.6;
/// Ranking weight for coarse record findings.
const RECORD_SCORE: f64 = 0.5;
/// Distance from the neutral mood score before the coarse pass calls
/// a window high or low.
const MOOD_DELTA: f64 = 5.0;
/// Resist rate at or above which the urge pass reads as progress.
const RESIST_RATE_GOOD: f64 = 0.5;

// ============================================================================
// Scenario lexicon
// ============================================================================

/// One keyword scenario: a pattern plus the canned finding it triggers.
pub(crate) struct ScenarioRule {
    pub name: &'static str,
    pattern: &'static str,
    pub domain: SourceDomain,
    pub title: &'static str,
    pub body: &'static str,
    pub suggestion: &'static str,
}

/// Matched top to bottom; order decides tie-broken ranking, acute
/// scenarios first.
static SCENARIO_RULES: &[ScenarioRule] = &[
    ScenarioRule {
        name: "panic",
        pattern: r"(?i)\b(panic|panicky|panicking|heart racing|hyperventilating)\b",
        domain: SourceDomain::Mood,
        title: "Panic language in your check-in",
        body: "Your words point to panic-level distress.",
        suggestion: "Slow your breathing: four counts in, six counts out, for one minute.",
    },
    ScenarioRule {
        name: "anxiety",
        pattern: r"(?i)\b(anxious|anxiety|worried|overwhelmed)\b",
        domain: SourceDomain::Mood,
        title: "Anxiety language in your check-in",
        body: "Your words suggest heightened anxiety right now.",
        suggestion: "Try a two-minute grounding exercise before moving on.",
    },
    ScenarioRule {
        name: "contamination",
        pattern: r"(?i)\b(contaminated|contamination|germs|unclean|disinfecting)\b",
        domain: SourceDomain::Behavior,
        title: "Contamination worries mentioned",
        body: "Contamination concerns came up in your check-in.",
        suggestion: "Note the trigger and rate the worry from one to ten.",
    },
    ScenarioRule {
        name: "checking",
        pattern: r"(?i)\b(re[- ]?check(ing|ed)?|checking)\b",
        domain: SourceDomain::Behavior,
        title: "Checking behavior mentioned",
        body: "You mentioned checking or re-checking.",
        suggestion: "Try one deliberate check, then walk away and note the urge level.",
    },
    ScenarioRule {
        name: "intrusive_thoughts",
        pattern: r"(?i)\b(intrusive|unwanted thoughts?|disturbing thoughts?)\b",
        domain: SourceDomain::Behavior,
        title: "Intrusive thoughts mentioned",
        body: "Unwanted or intrusive thoughts came up.",
        suggestion: "Label the thought as a thought and let it pass without engaging.",
    },
    ScenarioRule {
        name: "avoidance",
        pattern: r"(?i)\b(avoid|avoids|avoided|avoiding)\b",
        domain: SourceDomain::Behavior,
        title: "Avoidance pattern in your check-in",
        body: "Your words suggest you are steering around a trigger.",
        suggestion: "List the smallest step toward the avoided situation.",
    },
    ScenarioRule {
        name: "urges",
        pattern: r"(?i)\b(urge|urges|ritual|rituals|compulsion|compulsions)\b",
        domain: SourceDomain::Behavior,
        title: "Urge-related language in your check-in",
        body: "You mentioned urges or rituals.",
        suggestion: "Delay the ritual by five minutes and note what happens.",
    },
    ScenarioRule {
        name: "low_mood",
        pattern: r"(?i)\b(sad|down|hopeless|empty|drained|exhausted)\b",
        domain: SourceDomain::Mood,
        title: "Low-mood language in your check-in",
        body: "Your words lean toward a low mood today.",
        suggestion: "A short walk or a brief journal entry can help reset.",
    },
    ScenarioRule {
        name: "sleep",
        pattern: r"(?i)\b(insomnia|sleepless|restless|awake all night)\b",
        domain: SourceDomain::Mood,
        title: "Sleep disruption mentioned",
        body: "Sleep trouble came up in your check-in.",
        suggestion: "Consider logging tonight's wind-down routine.",
    },
    ScenarioRule {
        name: "positive",
        pattern: r"(?i)\b(calm|better|proud|hopeful|grateful)\b",
        domain: SourceDomain::Mood,
        title: "Positive language in your check-in",
        body: "Your words carry a positive tone.",
        suggestion: "Note what contributed so you can repeat it.",
    },
];

#[allow(clippy::expect_used)]
fn scenario_set() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new(SCENARIO_RULES.iter().map(|rule| rule.pattern)).expect("static patterns")
    })
}

/// Match the lexicon against free text, in rule order.
pub(crate) fn scan_transcript(text: &str) -> Vec<&'static ScenarioRule> {
    scenario_set()
        .matches(text)
        .into_iter()
        .filter_map(|index| SCENARIO_RULES.get(index))
        .collect()
}

// ============================================================================
// Analyzer
// ============================================================================

/// The always-available fast pass.
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    /// Produce a coarse outcome from whatever the input carries.
    ///
    /// Deterministic for a given input, which keeps repeated degraded
    /// runs byte-identical.
    pub fn analyze(input: &PipelineInput) -> AnalyzerOutput {
        let mut insights = Vec::new();
        let mut suggestions = Vec::new();

        if let Some(text) = input.content.text() {
            let hits = scan_transcript(text);
            if !hits.is_empty() {
                let scenarios: Vec<&str> = hits.iter().map(|rule| rule.name).collect();
                debug!(?scenarios, "transcript matched scenario lexicon");
            }
            for rule in hits {
                insights.push(Insight {
                    domain: rule.domain,
                    title: rule.title.to_string(),
                    body: rule.body.to_string(),
                    score: SCENARIO_SCORE,
                });
                suggestions.push(rule.suggestion.to_string());
            }
        }

        let sample_size = match input.content.records() {
            Some(bundle) => {
                Self::scan_records(bundle, &mut insights, &mut suggestions);
                bundle.len()
            }
            None => 0,
        };

        insights.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        AnalyzerOutput {
            outcome: AnalysisOutcome {
                insights,
                suggestions,
                analytics: Default::default(),
            },
            confidence: HEURISTIC_CONFIDENCE,
            sample_size,
            data_quality: None,
        }
    }

    /// Coarse aggregate pass over typed records. Means only, no trend
    /// or significance work.
    fn scan_records(bundle: &RecordBundle, insights: &mut Vec<Insight>, suggestions: &mut Vec<String>) {
        let mood_scores: Vec<f64> = bundle
            .mood_entries
            .iter()
            .filter(|e| e.is_valid())
            .map(|e| e.score)
            .collect();
        if !mood_scores.is_empty() {
            let mean = stats::mean(&mood_scores);
            if mean < NEUTRAL_MOOD_SCORE - MOOD_DELTA {
                insights.push(Insight {
                    domain: SourceDomain::Mood,
                    title: "Mood running below your neutral line".to_string(),
                    body: format!("Average mood across this window is {mean:.1}."),
                    score: RECORD_SCORE,
                });
                suggestions.push("Schedule one small activity you usually enjoy.".to_string());
            } else if mean > NEUTRAL_MOOD_SCORE + MOOD_DELTA {
                insights.push(Insight {
                    domain: SourceDomain::Mood,
                    title: "Mood running above your neutral line".to_string(),
                    body: format!("Average mood across this window is {mean:.1}."),
                    score: RECORD_SCORE,
                });
            }
        }

        let urges = &bundle.compulsion_records;
        if !urges.is_empty() {
            let resisted = urges.iter().filter(|r| r.resisted).count();
            let rate = resisted as f64 / urges.len() as f64;
            if rate >= RESIST_RATE_GOOD {
                insights.push(Insight {
                    domain: SourceDomain::Behavior,
                    title: "Resisting more urges than not".to_string(),
                    body: format!("You resisted {resisted} of {} logged urges.", urges.len()),
                    score: RECORD_SCORE,
                });
            } else {
                insights.push(Insight {
                    domain: SourceDomain::Behavior,
                    title: "Urges are winning this window".to_string(),
                    body: format!("You resisted {resisted} of {} logged urges.", urges.len()),
                    score: RECORD_SCORE,
                });
                suggestions.push("Pick one low-stakes urge to practice delaying.".to_string());
            }
        }

        let improvements: Vec<f64> = bundle
            .therapy_records
            .iter()
            .filter(|r| r.is_valid())
            .map(|r| r.improvement())
            .collect();
        if !improvements.is_empty() {
            let mean = stats::mean(&improvements);
            if mean > 0.0 {
                insights.push(Insight {
                    domain: SourceDomain::Therapy,
                    title: "Exercises are lifting your mood".to_string(),
                    body: format!("Sessions improve mood by {mean:.1} on average."),
                    score: RECORD_SCORE,
                });
            }
        }
    }
}
