//! Insight Pipeline Demo
//!
//! Runs synthetic tracking scenarios through the analysis pipeline and
//! prints the results plus the sanitized telemetry transcript.
//! Scenarios:
//! - mood: weeks of mood check-ins through the deep statistical pass
//! - behavior: an urge log with category patterns
//! - therapy: before/after exercise sessions
//! - voice: a free-text check-in through the scenario lexicon
//! - degraded: the deep path gated off, heuristic fallback
//! - full: all of the above, with the mood window issued as a
//!   progressive phase 1/2 pair and replayed from the cache
//!
//! # Usage
//! ```bash
//! demo --scenario mood --days 28
//! demo --print-config
//! RUST_LOG=debug demo --scenario full
//! ```

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use rand::prelude::*;

use mindsight::cache::SledCache;
use mindsight::config::ConfigFlagReader;
use mindsight::telemetry::MemorySink;
use mindsight::types::{
    AnalysisContent, CompulsionRecord, InputKind, MoodEntry, PipelineInput, RecordBundle,
    RequestContext, SourceDomain, TherapyRecord,
};
use mindsight::{InsightPipeline, PipelineConfig, PipelineResult, ScriptedGenerator};

// ============================================================================
// Scenario Constants
// ============================================================================

/// Mood score the synthetic user starts the window at.
const BASE_MOOD: f64 = 45.0;
/// Daily upward drift of the synthetic mood series.
const MOOD_DRIFT_PER_DAY: f64 = 0.4;
/// Spread of the uniform noise added to each check-in.
const MOOD_NOISE: f64 = 6.0;
/// Urge categories cycled through by the behavior scenario.
const URGE_CATEGORIES: &[&str] = &["checking", "washing", "counting"];

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "mindsight-demo")]
#[command(about = "Synthetic scenario runner for the mindsight analysis pipeline")]
struct Args {
    /// Scenario to run: mood, behavior, therapy, voice, degraded, full
    #[arg(long, short, default_value = "full", env = "MINDSIGHT_SCENARIO")]
    scenario: String,

    /// Window length in days
    #[arg(long, default_value = "28", value_parser = clap::value_parser!(u32).range(1..=60))]
    days: u32,

    /// Random seed for reproducible windows
    #[arg(long, default_value = "7")]
    seed: u64,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Print each result as pretty JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = PipelineConfig::load();
    // The demo always runs against the scripted generator.
    config.pipeline.stub_analyzers = true;

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    let sink = Arc::new(MemorySink::new());
    let pipeline = build_pipeline(&config, sink.clone(), config.pipeline.deep_path_enabled)?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    match args.scenario.as_str() {
        "mood" => {
            run_and_print(&pipeline, mood_input(&mut rng, args.days), args.json).await?;
        }
        "behavior" => {
            run_and_print(&pipeline, behavior_input(&mut rng, args.days), args.json).await?;
        }
        "therapy" => {
            run_and_print(&pipeline, therapy_input(&mut rng, args.days), args.json).await?;
        }
        "voice" => {
            run_and_print(&pipeline, voice_input(), args.json).await?;
        }
        "degraded" => {
            let gated = build_pipeline(&config, sink.clone(), false)?;
            run_and_print(&gated, mood_input(&mut rng, args.days), args.json).await?;
            println!("{}", gated.stats());
        }
        "full" => {
            // Progressive pair: instant heuristic phase, then the deep
            // phase over the same window.
            let mood = mood_input(&mut rng, args.days);
            let mut quick = mood.clone();
            quick.context.progressive = true;
            quick.context.phase = Some(1);
            run_and_print(&pipeline, quick, args.json).await?;
            let mut complete = mood.clone();
            complete.context.progressive = true;
            complete.context.phase = Some(2);
            run_and_print(&pipeline, complete, args.json).await?;

            run_and_print(&pipeline, behavior_input(&mut rng, args.days), args.json).await?;
            run_and_print(&pipeline, therapy_input(&mut rng, args.days), args.json).await?;
            run_and_print(&pipeline, voice_input(), args.json).await?;

            // Replay the mood window; phase 2 cached it, so this one
            // comes back from the cache.
            run_and_print(&pipeline, mood.clone(), args.json).await?;

            let gated = build_pipeline(&config, sink.clone(), false)?;
            run_and_print(&gated, mood, args.json).await?;
        }
        other => bail!("unknown scenario '{other}' (expected mood, behavior, therapy, voice, degraded, full)"),
    }

    println!("{}", pipeline.stats());
    print_transcript(&sink);
    Ok(())
}

/// Wire a pipeline around a throwaway sled tree and the shared sink.
fn build_pipeline(
    config: &PipelineConfig,
    sink: Arc<MemorySink>,
    deep_enabled: bool,
) -> Result<InsightPipeline> {
    let mut config = config.clone();
    config.pipeline.deep_path_enabled = deep_enabled;
    let flags = Arc::new(ConfigFlagReader::from_config(&config));
    Ok(InsightPipeline::with_components(
        config,
        Arc::new(SledCache::open_temp()?),
        flags,
        Some(Arc::new(ScriptedGenerator::new())),
        sink,
    ))
}

async fn run_and_print(pipeline: &InsightPipeline, input: PipelineInput, json: bool) -> Result<()> {
    let mut label = format!("{} / {}", input.context.domain, input.kind);
    if let Some(phase) = input.context.phase {
        label.push_str(&format!(" / phase {phase}"));
    }
    let result = pipeline.process(input).await;
    println!("=== {label} ===");
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }
    Ok(())
}

fn print_summary(result: &PipelineResult) {
    let m = &result.metadata;
    println!(
        "  provenance: {}  quality: {}  confidence: {:.2}  samples: {}  elapsed: {}ms",
        m.provenance(),
        m.quality_level,
        m.confidence,
        m.sample_size,
        m.processing_time_ms
    );
    if let Some(age) = m.freshness_ms {
        println!("  served from cache, {age}ms old");
    }
    if let Some(error) = &result.error {
        println!("  degraded: {} ({})", error.category, error.message);
    }
    if let Some(outcome) = &result.outcome {
        for insight in outcome.insights.iter().take(3) {
            println!("  [{:.2}] {}: {}", insight.score, insight.title, insight.body);
        }
        for suggestion in outcome.suggestions.iter().take(2) {
            println!("  -> {suggestion}");
        }
    }
}

fn print_transcript(sink: &MemorySink) {
    let events = sink.events();
    println!("--- telemetry transcript ({} events) ---", events.len());
    for event in events {
        let metadata = serde_json::to_string(&event.metadata).unwrap_or_default();
        println!("  {:9} {metadata}", event.event_type);
    }
}

// ============================================================================
// Synthetic Windows
// ============================================================================

/// Mood check-ins: two per day, drifting slowly upward with noise.
fn mood_input(rng: &mut StdRng, days: u32) -> PipelineInput {
    let start = Utc::now() - Duration::days(i64::from(days));
    let mut entries = Vec::new();
    for day in 0..days {
        for check_in in 0..2u32 {
            let drift = MOOD_DRIFT_PER_DAY * f64::from(day);
            let noise = rng.gen_range(-MOOD_NOISE..MOOD_NOISE);
            entries.push(MoodEntry {
                timestamp: start + Duration::days(i64::from(day)) + Duration::hours(8 + i64::from(check_in) * 9),
                score: (BASE_MOOD + drift + noise).clamp(0.0, 100.0),
                note: None,
            });
        }
    }
    data_input(
        RecordBundle { mood_entries: entries, ..Default::default() },
        SourceDomain::Mood,
    )
}

/// Urge log: one or two urges per day, resisted more often than not.
fn behavior_input(rng: &mut StdRng, days: u32) -> PipelineInput {
    let start = Utc::now() - Duration::days(i64::from(days));
    let mut records = Vec::new();
    for day in 0..days {
        let count = rng.gen_range(1..=2);
        for n in 0..count {
            let category = URGE_CATEGORIES[rng.gen_range(0..URGE_CATEGORIES.len())];
            records.push(CompulsionRecord {
                timestamp: start + Duration::days(i64::from(day)) + Duration::hours(10 + i64::from(n) * 5),
                category: category.to_string(),
                duration_secs: rng.gen_range(30.0..600.0),
                intensity: rng.gen_range(2.0..9.0),
                resisted: rng.gen_bool(0.6),
            });
        }
    }
    data_input(
        RecordBundle { compulsion_records: records, ..Default::default() },
        SourceDomain::Behavior,
    )
}

/// Exercise sessions every other day with mostly positive deltas.
fn therapy_input(rng: &mut StdRng, days: u32) -> PipelineInput {
    let start = Utc::now() - Duration::days(i64::from(days));
    let mut records = Vec::new();
    for day in (0..days).step_by(2) {
        let before = rng.gen_range(30.0..55.0);
        records.push(TherapyRecord {
            timestamp: start + Duration::days(i64::from(day)) + Duration::hours(19),
            exercise: "breathing".to_string(),
            mood_before: before,
            mood_after: (before + rng.gen_range(-2.0..14.0)).clamp(0.0, 100.0),
        });
    }
    data_input(
        RecordBundle { therapy_records: records, ..Default::default() },
        SourceDomain::Therapy,
    )
}

fn voice_input() -> PipelineInput {
    PipelineInput {
        user_id: "demo@example.com".to_string(),
        content: AnalysisContent::Voice(
            "Felt anxious this morning and the urge to re-check the door was strong, \
             but the afternoon was calmer."
                .to_string(),
        ),
        kind: InputKind::Voice,
        context: RequestContext::new(SourceDomain::Journal),
    }
}

fn data_input(bundle: RecordBundle, domain: SourceDomain) -> PipelineInput {
    PipelineInput {
        user_id: "demo@example.com".to_string(),
        content: AnalysisContent::Data(bundle),
        kind: InputKind::Data,
        context: RequestContext::new(domain),
    }
}
