//! Insight Generation Module
//!
//! Provides a unified interface for the optional deep-insight generator.
//!
//! ## Architecture
//!
//! - [`InsightGenerator`]: trait the deep analyzer calls out through
//! - [`ScriptedGenerator`]: deterministic local backend used by
//!   verification builds and deployments without an external capability
//!
//! Prompts are built from aggregate statistics only; raw user text never
//! enters a prompt. A failing generator call degrades the whole deep
//! pass, it never partially succeeds.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{AnalyticsSnapshot, SourceDomain, Trend};

/// Context handed to the generator alongside the prompt.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub domain: SourceDomain,
    pub sample_size: usize,
    pub trend: Trend,
}

/// Generator reply. `success: false` means the backend answered but
/// declined to produce content; the caller treats it like a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedInsight {
    pub success: bool,
    pub content: String,
}

/// Unified trait for insight generator backends
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    /// Generate summary content for the given prompt and context
    async fn generate(&self, prompt: &str, context: &GenerationContext) -> Result<GeneratedInsight>;

    /// Get the backend name for logging
    fn generator_name(&self) -> &'static str;
}

// ============================================================================
// Prompt Building
// ============================================================================

const PROMPT_HEADER: &str = "You are an assistant summarizing personal wellbeing statistics.\n\
Write two short, supportive sentences grounded only in the numbers provided.\n\
Do not invent events the numbers do not show. Do not give medical advice.\n\n";

/// Build the generator prompt from aggregate statistics.
///
/// Deliberately numeric-only: transcripts and notes stay out of the
/// prompt so the generator boundary carries no personal text.
pub fn build_insight_prompt(snapshots: &[AnalyticsSnapshot]) -> String {
    let mut prompt = String::from(PROMPT_HEADER);
    prompt.push_str("Observed statistics:\n");

    for snapshot in snapshots {
        let central = snapshot
            .central_value
            .map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "n/a".to_string());
        let volatility = snapshot
            .volatility
            .map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "n/a".to_string());
        prompt.push_str(&format!(
            "- {}: {} samples, central value {}, volatility {}, trend {}\n",
            snapshot.domain,
            snapshot.sample_size,
            central,
            volatility,
            snapshot.trend,
        ));
    }

    prompt.push_str("\nSummary:");
    prompt
}

// ============================================================================
// Scripted Backend
// ============================================================================

/// Deterministic generator for verification builds and offline
/// deployments. Identical context always yields identical content.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator;

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self
    }

    fn script_for(context: &GenerationContext) -> String {
        let subject = match context.domain {
            SourceDomain::Mood => "mood entries",
            SourceDomain::Behavior => "behavior records",
            SourceDomain::Therapy => "exercise sessions",
            SourceDomain::Journal => "journal entries",
        };
        let direction = match context.trend {
            Trend::Improving => "have been moving in a positive direction",
            Trend::Declining => "have been trending downward",
            Trend::Stable => "have stayed steady",
            Trend::Unknown => "do not yet show a clear direction",
        };
        format!(
            "Your last {} {} {}. Keep logging to sharpen the picture.",
            context.sample_size, subject, direction
        )
    }
}

#[async_trait]
impl InsightGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        context: &GenerationContext,
    ) -> Result<GeneratedInsight> {
        Ok(GeneratedInsight {
            success: true,
            content: Self::script_for(context),
        })
    }

    fn generator_name(&self) -> &'static str {
        "Scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(sample_size: usize) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            domain: SourceDomain::Mood,
            sample_size,
            central_value: Some(58.5),
            volatility: Some(6.2),
            confidence: 0.8,
            trend: Trend::Improving,
            data_quality: 1.0,
        }
    }

    #[test]
    fn prompt_carries_aggregates_only() {
        let prompt = build_insight_prompt(&[snapshot(14)]);
        assert!(prompt.contains("mood: 14 samples"));
        assert!(prompt.contains("central value 58.5"));
        assert!(prompt.contains("trend improving"));
        assert!(prompt.ends_with("Summary:"));
    }

    #[test]
    fn prompt_handles_undefined_statistics() {
        let mut s = snapshot(2);
        s.central_value = None;
        s.volatility = None;
        let prompt = build_insight_prompt(&[s]);
        assert!(prompt.contains("central value n/a"));
    }

    #[tokio::test]
    async fn scripted_generator_is_deterministic() {
        let generator = ScriptedGenerator::new();
        let context = GenerationContext {
            domain: SourceDomain::Behavior,
            sample_size: 9,
            trend: Trend::Declining,
        };
        let a = generator.generate("p", &context).await.unwrap();
        let b = generator.generate("p", &context).await.unwrap();
        assert_eq!(a, b);
        assert!(a.success);
        assert!(a.content.contains("9 behavior records"));
    }

    #[tokio::test]
    async fn scripted_content_varies_with_trend() {
        let generator = ScriptedGenerator::new();
        let improving = GenerationContext {
            domain: SourceDomain::Mood,
            sample_size: 12,
            trend: Trend::Improving,
        };
        let declining = GenerationContext {
            trend: Trend::Declining,
            ..improving.clone()
        };
        let a = generator.generate("p", &improving).await.unwrap();
        let b = generator.generate("p", &declining).await.unwrap();
        assert_ne!(a.content, b.content);
    }
}
