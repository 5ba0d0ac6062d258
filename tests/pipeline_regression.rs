//! Pipeline Regression Tests
//!
//! Exercises the full orchestrator through its public surface: fresh
//! deep runs, cache replays with TTL expiry, the flag gate, progressive
//! phases, degradation on analyzer failure, and the telemetry contract
//! (one STARTED and one terminal event per run, nothing identifying in
//! any payload).

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use mindsight::cache::MemoryCache;
use mindsight::config::StaticFlagReader;
use mindsight::telemetry::{sanitize, MemorySink};
use mindsight::types::{
    AnalysisContent, CompulsionRecord, ErrorCategory, InputKind, MoodEntry, PipelineInput,
    Provenance, QualityLevel, RecordBundle, RequestContext, ResultSource, SourceDomain,
};
use mindsight::{
    InsightPipeline, PipelineConfig, ScriptedGenerator, AI_UNIFIED_PIPELINE,
};

/// Pipeline over an in-memory cache and a capturing sink.
fn build_pipeline(deep_enabled: bool, ttl_ms: u64) -> (InsightPipeline, Arc<MemorySink>) {
    let mut config = PipelineConfig::default();
    config.cache.ttl_ms = ttl_ms;
    let sink = Arc::new(MemorySink::new());
    let pipeline = InsightPipeline::with_components(
        config,
        Arc::new(MemoryCache::new()),
        Arc::new(StaticFlagReader::new().with_flag(AI_UNIFIED_PIPELINE, deep_enabled)),
        Some(Arc::new(ScriptedGenerator::new())),
        sink.clone(),
    );
    (pipeline, sink)
}

fn entry(day: u32, hour: u32, score: f64) -> MoodEntry {
    MoodEntry {
        timestamp: Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap(),
        score,
        note: None,
    }
}

/// Three check-ins on one day: 40, 50 (neutral), 60.
fn small_mood_input(user_id: &str) -> PipelineInput {
    PipelineInput {
        user_id: user_id.to_string(),
        content: AnalysisContent::Data(RecordBundle {
            mood_entries: vec![entry(10, 8, 40.0), entry(10, 12, 50.0), entry(10, 18, 60.0)],
            ..Default::default()
        }),
        kind: InputKind::Data,
        context: RequestContext::new(SourceDomain::Mood),
    }
}

/// Four weeks of daily check-ins, slowly improving. Big enough for the
/// high confidence tier.
fn rich_mood_input(user_id: &str) -> PipelineInput {
    let entries: Vec<MoodEntry> = (0..28u32)
        .map(|i| entry(1 + i / 4, (i % 4) * 5 + 2, 40.0 + f64::from(i) * 0.7))
        .collect();
    PipelineInput {
        user_id: user_id.to_string(),
        content: AnalysisContent::Data(RecordBundle { mood_entries: entries, ..Default::default() }),
        kind: InputKind::Data,
        context: RequestContext::new(SourceDomain::Mood),
    }
}

#[tokio::test]
async fn fresh_deep_run_reaches_the_high_tier() {
    let (pipeline, _sink) = build_pipeline(true, 3_600_000);

    let result = pipeline.process(rich_mood_input("user-1")).await;

    assert!(result.success);
    assert_eq!(result.metadata.source, ResultSource::Fresh);
    assert_eq!(result.metadata.provenance(), Provenance::Unified);
    assert_eq!(result.metadata.sample_size, 28);
    assert!(result.metadata.confidence >= 0.8);
    assert_eq!(result.metadata.quality_level, QualityLevel::High);

    let outcome = result.outcome.as_ref().unwrap();
    assert!(!outcome.insights.is_empty());
    assert_eq!(outcome.insights[0].title, "Narrative summary");
    assert!(!outcome.analytics.snapshots.is_empty());
}

#[tokio::test]
async fn cache_replay_keeps_the_payload_and_reports_age() {
    let (pipeline, _sink) = build_pipeline(true, 3_600_000);

    let first = pipeline.process(small_mood_input("user-1")).await;
    let second = pipeline.process(small_mood_input("user-1")).await;

    assert_eq!(first.metadata.source, ResultSource::Fresh);
    assert_eq!(second.metadata.source, ResultSource::Cache);
    assert_eq!(second.metadata.provenance(), Provenance::Cache);
    assert!(second.metadata.freshness_ms.is_some());
    assert_eq!(second.outcome, first.outcome);
    assert_eq!(pipeline.stats().cache.hits, 1);
    assert_eq!(pipeline.stats().deep_runs, 1);
}

#[tokio::test]
async fn expired_entries_are_recomputed() {
    let (pipeline, _sink) = build_pipeline(true, 1);

    pipeline.process(small_mood_input("user-1")).await;
    tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    let second = pipeline.process(small_mood_input("user-1")).await;

    assert_eq!(second.metadata.source, ResultSource::Fresh);
    assert_eq!(pipeline.stats().cache.hits, 0);
    assert_eq!(pipeline.stats().cache.expired_evictions, 1);
    assert_eq!(pipeline.stats().deep_runs, 2);
}

#[tokio::test]
async fn different_users_never_share_cache_entries() {
    let (pipeline, _sink) = build_pipeline(true, 3_600_000);

    pipeline.process(small_mood_input("user-1")).await;
    let other = pipeline.process(small_mood_input("user-2")).await;

    assert_eq!(other.metadata.source, ResultSource::Fresh);
    assert_eq!(pipeline.stats().cache.hits, 0);
}

#[tokio::test]
async fn gate_off_degrades_regardless_of_input_richness() {
    let (pipeline, sink) = build_pipeline(false, 3_600_000);

    let result = pipeline.process(rich_mood_input("user-1")).await;

    assert!(result.success);
    assert!(result.error.is_none());
    assert_eq!(result.metadata.source, ResultSource::Heuristic);
    assert_eq!(result.metadata.provenance(), Provenance::Heuristic);
    assert_eq!(result.metadata.quality_level, QualityLevel::Low);

    // Fast-path runs close with COMPLETED, not ERROR.
    let events = sink.events();
    assert_eq!(events.last().map(|e| e.event_type), Some("COMPLETED"));
}

#[tokio::test]
async fn progressive_phases_choose_the_path() {
    let (pipeline, _sink) = build_pipeline(true, 3_600_000);

    let mut quick = rich_mood_input("user-1");
    quick.context.progressive = true;
    quick.context.phase = Some(1);
    let quick_result = pipeline.process(quick).await;

    let mut complete = rich_mood_input("user-1");
    complete.context.progressive = true;
    complete.context.phase = Some(2);
    let complete_result = pipeline.process(complete).await;

    assert_eq!(quick_result.metadata.source, ResultSource::Heuristic);
    assert_eq!(complete_result.metadata.source, ResultSource::Fresh);
}

#[tokio::test]
async fn kind_content_mismatch_is_rejected() {
    let (pipeline, sink) = build_pipeline(true, 3_600_000);
    let input = PipelineInput {
        user_id: "user-1".to_string(),
        content: AnalysisContent::Voice("a day like any other".to_string()),
        kind: InputKind::Data,
        context: RequestContext::new(SourceDomain::Mood),
    };

    let result = pipeline.process(input).await;

    assert!(!result.success);
    assert!(result.outcome.is_none());
    assert_eq!(
        result.error.as_ref().map(|e| e.category),
        Some(ErrorCategory::InvalidInput)
    );
    assert_eq!(
        sink.events().iter().map(|e| e.event_type).collect::<Vec<_>>(),
        vec!["STARTED", "ERROR"]
    );
}

#[tokio::test]
async fn stubbed_recomputation_is_bit_identical() {
    // Two independent pipelines rule the cache out; only the scripted
    // generator and the engines decide the payload.
    let (first_pipeline, _) = build_pipeline(true, 3_600_000);
    let (second_pipeline, _) = build_pipeline(true, 3_600_000);

    let first = first_pipeline.process(rich_mood_input("user-1")).await;
    let second = second_pipeline.process(rich_mood_input("user-1")).await;

    let first_payload = serde_json::to_string(&first.outcome).unwrap();
    let second_payload = serde_json::to_string(&second.outcome).unwrap();
    assert_eq!(first_payload, second_payload);
}

#[tokio::test]
async fn every_run_emits_one_started_and_one_terminal() {
    let (pipeline, sink) = build_pipeline(true, 3_600_000);

    // Deep, cache hit, invalid, and a progressive quick run.
    pipeline.process(small_mood_input("user-1")).await;
    pipeline.process(small_mood_input("user-1")).await;
    pipeline
        .process(PipelineInput {
            user_id: String::new(),
            content: AnalysisContent::Voice("x".to_string()),
            kind: InputKind::Voice,
            context: RequestContext::new(SourceDomain::Journal),
        })
        .await;
    let mut quick = small_mood_input("user-2");
    quick.context.progressive = true;
    quick.context.phase = Some(1);
    pipeline.process(quick).await;

    let events = sink.events();
    assert_eq!(events.len(), 8);
    for pair in events.chunks(2) {
        assert_eq!(pair[0].event_type, "STARTED");
        assert!(pair[1].event_type == "COMPLETED" || pair[1].event_type == "ERROR");
    }
}

#[tokio::test]
async fn telemetry_never_carries_identifying_content() {
    let (pipeline, sink) = build_pipeline(true, 3_600_000);
    let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let input = PipelineInput {
        user_id: "person@example.com".to_string(),
        content: AnalysisContent::Mixed {
            transcript: "felt anxious, call me back at 555-0100 about the appointment".to_string(),
            records: RecordBundle {
                mood_entries: vec![MoodEntry {
                    timestamp: start,
                    score: 35.0,
                    note: Some("texted 555-0100 again".to_string()),
                }],
                compulsion_records: vec![CompulsionRecord {
                    timestamp: start + Duration::hours(2),
                    category: "checking".to_string(),
                    duration_secs: 90.0,
                    intensity: 6.0,
                    resisted: false,
                }],
                ..Default::default()
            },
        },
        kind: InputKind::Mixed,
        context: RequestContext::new(SourceDomain::Journal),
    };

    let result = pipeline.process(input).await;
    assert!(result.success);

    let events = sink.events();
    assert_eq!(events.len(), 2);
    for event in &events {
        let serialized = serde_json::to_string(event).unwrap();
        assert!(!serialized.contains("person@example.com"), "raw user id leaked");
        assert!(!serialized.contains("person"), "user id fragment leaked");
        assert!(!serialized.contains("555-0100"), "phone-like content leaked");
        assert!(!serialized.contains("anxious"), "free text leaked");

        let token = event.user_token().unwrap();
        assert!(sanitize::is_pseudonymous_token(token));
    }

    // Both events carry the same pseudonym, so runs still correlate.
    assert_eq!(events[0].user_token(), events[1].user_token());
    assert_eq!(events[0].run_id(), events[1].run_id());
}
