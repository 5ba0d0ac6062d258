//! Analysis orchestrator - six-step run sequence
//!
//! One service object owns the collaborators and walks every request
//! through the same sequence:
//!
//! ```text
//! STEP 1: Validation      (shape and domain agreement)
//! STEP 2: Cache Probe     (fingerprint lookup, lazy TTL eviction)
//! STEP 3: Flag Gate       (AI_UNIFIED_PIPELINE)
//! STEP 4: Fast Path       (gate off, or progressive quick phase)
//! STEP 5: Deep Analysis   (domain engines, optional generator)
//! STEP 6: Store + Report  (cache write, quality metadata, telemetry)
//! ```
//!
//! GUARANTEE: `process` never returns an error to the caller. Invalid
//! input yields a terminal failure result; analyzer and flag trouble
//! degrade to the heuristic pass; a broken cache only ever costs a
//! recompute.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analyzers::{AnalyzerOutput, DeepAnalyzer, HeuristicAnalyzer};
use crate::cache::{
    fingerprint, CacheEntry, CacheError, CacheManager, CacheStats, InsightCache, MemoryCache,
    SledCache,
};
use crate::config::{
    ConfigError, ConfigFlagReader, FlagReader, PipelineConfig, AI_UNIFIED_PIPELINE,
};
use crate::generation::{InsightGenerator, ScriptedGenerator};
use crate::quality::{estimate_quality_level, QualityInputs};
use crate::telemetry::{TelemetryEmitter, TelemetryEvent, TelemetrySink, TracingSink};
use crate::types::{
    ErrorCategory, ErrorDescriptor, PipelineInput, PipelineResult, QualityMetadata, ResultSource,
};

/// Construction failures. Runtime calls never surface errors.
#[derive(Debug, Error)]
pub enum PipelineInitError {
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),
    #[error("cache backend unavailable: {0}")]
    Cache(#[from] CacheError),
}

/// The analysis orchestration service.
///
/// Owns one cache abstraction, one flag reader, one optional generator,
/// and one telemetry emitter. Cheap to share behind an `Arc`; `process`
/// takes `&self`.
pub struct InsightPipeline {
    config: PipelineConfig,
    cache: CacheManager,
    flags: Arc<dyn FlagReader>,
    generator: Option<Arc<dyn InsightGenerator>>,
    telemetry: TelemetryEmitter,
    runs_started: AtomicU64,
    runs_rejected: AtomicU64,
    heuristic_runs: AtomicU64,
    deep_runs: AtomicU64,
    degraded_runs: AtomicU64,
}

impl InsightPipeline {
    /// Production wiring from configuration: a sled cache when a path
    /// is configured (in-memory otherwise), config-backed flags,
    /// tracing telemetry. The scripted generator is attached only when
    /// `stub_analyzers` is on; otherwise attach a live backend with
    /// [`Self::with_components`].
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineInitError> {
        config.validate()?;
        let backend: Arc<dyn InsightCache> = match &config.cache.path {
            Some(path) => Arc::new(SledCache::open(path)?),
            None => Arc::new(MemoryCache::new()),
        };
        let flags: Arc<dyn FlagReader> = Arc::new(ConfigFlagReader::from_config(&config));
        let generator: Option<Arc<dyn InsightGenerator>> = if config.pipeline.stub_analyzers {
            Some(Arc::new(ScriptedGenerator::new()))
        } else {
            None
        };
        let sink: Arc<dyn TelemetrySink> = Arc::new(TracingSink);
        Ok(Self::with_components(config, backend, flags, generator, sink))
    }

    /// Full injection constructor. Tests swap in the in-memory cache
    /// and sink; embedders attach their own flag source and generator.
    pub fn with_components(
        config: PipelineConfig,
        backend: Arc<dyn InsightCache>,
        flags: Arc<dyn FlagReader>,
        generator: Option<Arc<dyn InsightGenerator>>,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        info!(
            cache_backend = backend.backend_name(),
            flag_reader = flags.reader_name(),
            ttl_ms = config.cache.ttl_ms,
            generator = generator.as_ref().map_or("none", |g| g.generator_name()),
            telemetry_enabled = config.telemetry.enabled,
            "Initializing insight pipeline"
        );

        let cache = CacheManager::new(backend, config.cache.ttl_ms);
        let telemetry = TelemetryEmitter::new(sink, config.telemetry.enabled);

        Self {
            config,
            cache,
            flags,
            generator,
            telemetry,
            runs_started: AtomicU64::new(0),
            runs_rejected: AtomicU64::new(0),
            heuristic_runs: AtomicU64::new(0),
            deep_runs: AtomicU64::new(0),
            degraded_runs: AtomicU64::new(0),
        }
    }

    /// Run one request through the sequence.
    ///
    /// Emits exactly one `STARTED` and exactly one terminal telemetry
    /// event per call, whatever path the run takes.
    pub async fn process(&self, input: PipelineInput) -> PipelineResult {
        let run_start = Instant::now();
        let run_id = Uuid::new_v4();
        self.runs_started.fetch_add(1, Ordering::Relaxed);

        self.telemetry.emit(&TelemetryEvent::started(
            run_id,
            &input.user_id,
            input.kind,
            input.context.domain,
        ));

        // STEP 1: Validation
        if let Err(err) = input.validate() {
            self.runs_rejected.fetch_add(1, Ordering::Relaxed);
            warn!(run_id = %run_id, error = %err, "Step 1: input rejected");
            self.telemetry.emit(&TelemetryEvent::error(
                run_id,
                &input.user_id,
                ErrorCategory::InvalidInput,
            ));
            return PipelineResult::failure(
                ErrorCategory::InvalidInput,
                err.to_string(),
                elapsed_ms(run_start),
            );
        }
        debug!(
            run_id = %run_id,
            kind = %input.kind,
            domain = %input.context.domain,
            "Step 1: input validated"
        );

        // STEP 2: Cache Probe
        let key = fingerprint(&input.user_id, &input.content, input.context.domain);
        let now = Utc::now();
        match self.cache.fetch(&key, now) {
            Ok(Some(entry)) => {
                return self.finish_cache_hit(run_id, &input, entry, run_start);
            }
            Ok(None) => debug!(run_id = %run_id, "Step 2: cache miss"),
            // A broken cache downgrades to a miss, never to a failed run.
            Err(err) => {
                warn!(
                    run_id = %run_id,
                    error = %err,
                    category = %ErrorCategory::CacheIoError,
                    "Step 2: cache read failed, treating as miss"
                );
            }
        }

        // STEP 3: Flag Gate
        let deep_enabled = match self.flags.is_enabled(AI_UNIFIED_PIPELINE) {
            Ok(enabled) => enabled,
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "Step 3: flag source unavailable, degrading");
                return self.finish_degraded(
                    run_id,
                    &input,
                    ErrorCategory::ConfigUnavailable,
                    err.to_string(),
                    run_start,
                );
            }
        };

        // STEP 4: Fast Path
        if !deep_enabled {
            debug!(run_id = %run_id, "Step 4: deep path gated off, running heuristics");
            return self.finish_heuristic(run_id, &input, run_start);
        }
        if input.is_progressive_quick_phase() {
            debug!(run_id = %run_id, "Step 4: progressive quick phase, running heuristics");
            return self.finish_heuristic(run_id, &input, run_start);
        }

        // STEP 5: Deep Analysis
        match DeepAnalyzer::analyze(&input, self.generator.as_deref()).await {
            Ok(output) => self.finish_deep(run_id, &input, &key, output, run_start),
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "Step 5: deep analysis failed, falling back");
                self.finish_degraded(
                    run_id,
                    &input,
                    ErrorCategory::AnalyzerFailure,
                    err.to_string(),
                    run_start,
                )
            }
        }
    }

    /// Serve a stored result. Quality is re-derived because the entry
    /// aged between store and read.
    fn finish_cache_hit(
        &self,
        run_id: Uuid,
        input: &PipelineInput,
        entry: CacheEntry,
        run_start: Instant,
    ) -> PipelineResult {
        let age_ms = entry.age_ms(Utc::now());
        let mut result = entry.result;
        result.metadata.source = ResultSource::Cache;
        result.metadata.freshness_ms = Some(age_ms);
        result.metadata.quality_level = estimate_quality_level(&QualityInputs {
            confidence: result.metadata.confidence,
            sample_size: result.metadata.sample_size,
            data_quality: None,
            freshness_ms: Some(age_ms),
        });
        result.metadata.processing_time_ms = elapsed_ms(run_start);

        info!(
            run_id = %run_id,
            age_ms,
            quality = %result.metadata.quality_level,
            "Step 2: cache hit"
        );
        self.telemetry.emit(&TelemetryEvent::completed(
            run_id,
            &input.user_id,
            result.success,
            result.metadata.quality_level,
            result.metadata.sample_size,
        ));
        result
    }

    /// Finish on the fast path: gate off or progressive quick phase.
    fn finish_heuristic(
        &self,
        run_id: Uuid,
        input: &PipelineInput,
        run_start: Instant,
    ) -> PipelineResult {
        self.heuristic_runs.fetch_add(1, Ordering::Relaxed);
        let result = self.heuristic_result(input, None, run_start);

        info!(
            run_id = %run_id,
            quality = %result.metadata.quality_level,
            sample_size = result.metadata.sample_size,
            elapsed_ms = result.metadata.processing_time_ms,
            "Step 4: fast path complete"
        );
        self.telemetry.emit(&TelemetryEvent::completed(
            run_id,
            &input.user_id,
            result.success,
            result.metadata.quality_level,
            result.metadata.sample_size,
        ));
        result
    }

    /// Finish after STEP 5/6 trouble: serve heuristics, keep the error
    /// visible on the result, and close the run with an `ERROR` event.
    fn finish_degraded(
        &self,
        run_id: Uuid,
        input: &PipelineInput,
        category: ErrorCategory,
        message: String,
        run_start: Instant,
    ) -> PipelineResult {
        self.degraded_runs.fetch_add(1, Ordering::Relaxed);
        let result = self.heuristic_result(input, Some(ErrorDescriptor { category, message }), run_start);

        info!(
            run_id = %run_id,
            category = %category,
            quality = %result.metadata.quality_level,
            "Run degraded to fast path"
        );
        self.telemetry
            .emit(&TelemetryEvent::error(run_id, &input.user_id, category));
        result
    }

    /// Finish the deep path: derive quality, store, report.
    fn finish_deep(
        &self,
        run_id: Uuid,
        input: &PipelineInput,
        key: &str,
        output: AnalyzerOutput,
        run_start: Instant,
    ) -> PipelineResult {
        self.deep_runs.fetch_add(1, Ordering::Relaxed);
        let quality_level = estimate_quality_level(&QualityInputs {
            confidence: output.confidence,
            sample_size: output.sample_size,
            data_quality: output.data_quality,
            freshness_ms: None,
        });
        let result = PipelineResult {
            success: true,
            outcome: Some(output.outcome),
            metadata: QualityMetadata {
                source: ResultSource::Fresh,
                quality_level,
                confidence: output.confidence,
                sample_size: output.sample_size,
                freshness_ms: None,
                processing_time_ms: elapsed_ms(run_start),
            },
            error: None,
        };

        // STEP 6: Store + Report. A failed write costs the next call a
        // recompute, nothing more.
        if let Err(err) = self.cache.store(key, &result, Utc::now()) {
            warn!(
                run_id = %run_id,
                error = %err,
                category = %ErrorCategory::CacheIoError,
                "Step 6: cache write failed, result not stored"
            );
        }

        info!(
            run_id = %run_id,
            quality = %result.metadata.quality_level,
            sample_size = result.metadata.sample_size,
            insights = result.outcome.as_ref().map_or(0, |o| o.insights.len()),
            elapsed_ms = result.metadata.processing_time_ms,
            "Step 6: deep analysis complete"
        );
        self.telemetry.emit(&TelemetryEvent::completed(
            run_id,
            &input.user_id,
            result.success,
            result.metadata.quality_level,
            result.metadata.sample_size,
        ));
        result
    }

    /// Fast-path result shared by the gate, progressive, and degraded
    /// finishes. Heuristic results are never written to the cache.
    fn heuristic_result(
        &self,
        input: &PipelineInput,
        error: Option<ErrorDescriptor>,
        run_start: Instant,
    ) -> PipelineResult {
        let output = HeuristicAnalyzer::analyze(input);
        let quality_level =
            estimate_quality_level(&QualityInputs::fresh(output.confidence, output.sample_size));
        PipelineResult {
            success: true,
            outcome: Some(output.outcome),
            metadata: QualityMetadata {
                source: ResultSource::Heuristic,
                quality_level,
                confidence: output.confidence,
                sample_size: output.sample_size,
                freshness_ms: None,
                processing_time_ms: elapsed_ms(run_start),
            },
            error,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Run counters since construction.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            runs_started: self.runs_started.load(Ordering::Relaxed),
            runs_rejected: self.runs_rejected.load(Ordering::Relaxed),
            heuristic_runs: self.heuristic_runs.load(Ordering::Relaxed),
            deep_runs: self.deep_runs.load(Ordering::Relaxed),
            degraded_runs: self.degraded_runs.load(Ordering::Relaxed),
            cache: self.cache.stats(),
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Pipeline counters for dashboards and the demo binary.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub runs_started: u64,
    pub runs_rejected: u64,
    pub heuristic_runs: u64,
    pub deep_runs: u64,
    pub degraded_runs: u64,
    pub cache: CacheStats,
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pipeline: {} runs ({} rejected, {} heuristic, {} deep, {} degraded), cache {} hits / {} misses",
            self.runs_started,
            self.runs_rejected,
            self.heuristic_runs,
            self.deep_runs,
            self.degraded_runs,
            self.cache.hits,
            self.cache.misses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::config::{FlagError, StaticFlagReader};
    use crate::telemetry::MemorySink;
    use crate::types::{
        AnalysisContent, InputKind, MoodEntry, Provenance, QualityLevel, RecordBundle,
        RequestContext, SourceDomain,
    };

    fn make_pipeline(deep_enabled: bool) -> (InsightPipeline, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let pipeline = InsightPipeline::with_components(
            PipelineConfig::default(),
            Arc::new(MemoryCache::new()),
            Arc::new(StaticFlagReader::new().with_flag(AI_UNIFIED_PIPELINE, deep_enabled)),
            Some(Arc::new(ScriptedGenerator::new())),
            sink.clone(),
        );
        (pipeline, sink)
    }

    fn entry(hour: u32, score: f64) -> MoodEntry {
        MoodEntry {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap(),
            score,
            note: None,
        }
    }

    fn mood_input(user_id: &str) -> PipelineInput {
        PipelineInput {
            user_id: user_id.to_string(),
            content: AnalysisContent::Data(RecordBundle {
                mood_entries: vec![entry(8, 40.0), entry(12, 50.0), entry(18, 60.0)],
                ..Default::default()
            }),
            kind: InputKind::Data,
            context: RequestContext::new(SourceDomain::Mood),
        }
    }

    struct BrokenFlags;

    impl FlagReader for BrokenFlags {
        fn is_enabled(&self, _flag: &str) -> Result<bool, FlagError> {
            Err(FlagError::Unavailable("flag store offline".to_string()))
        }

        fn reader_name(&self) -> &'static str {
            "broken"
        }
    }

    /// Backend whose every operation fails, as a torn-down disk would.
    struct FailingCache;

    impl FailingCache {
        fn offline() -> CacheError {
            CacheError::Backend("store offline".to_string())
        }
    }

    impl InsightCache for FailingCache {
        fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheError> {
            Err(Self::offline())
        }

        fn put(&self, _key: &str, _entry: &CacheEntry) -> Result<(), CacheError> {
            Err(Self::offline())
        }

        fn remove(&self, _key: &str) -> Result<(), CacheError> {
            Err(Self::offline())
        }

        fn clear(&self) -> Result<(), CacheError> {
            Err(Self::offline())
        }

        fn keys(&self) -> Result<Vec<String>, CacheError> {
            Err(Self::offline())
        }

        fn len(&self) -> usize {
            0
        }

        fn backend_name(&self) -> &'static str {
            "failing"
        }
    }

    fn event_types(sink: &MemorySink) -> Vec<&'static str> {
        sink.events().iter().map(|e| e.event_type).collect()
    }

    #[test]
    fn unset_cache_path_selects_the_memory_backend() {
        let config: PipelineConfig = toml::from_str("").unwrap();
        assert!(config.cache.path.is_none());

        let pipeline = InsightPipeline::new(config).unwrap();
        assert_eq!(pipeline.cache().backend_name(), "InMemory");
    }

    #[tokio::test]
    async fn invalid_input_terminates_with_failure() {
        let (pipeline, sink) = make_pipeline(true);
        let input = PipelineInput {
            user_id: "  ".to_string(),
            content: AnalysisContent::Voice("hello".to_string()),
            kind: InputKind::Voice,
            context: RequestContext::new(SourceDomain::Mood),
        };

        let result = pipeline.process(input).await;

        assert!(!result.success);
        assert!(result.outcome.is_none());
        assert_eq!(
            result.error.as_ref().map(|e| e.category),
            Some(ErrorCategory::InvalidInput)
        );
        assert_eq!(event_types(&sink), vec!["STARTED", "ERROR"]);
        assert_eq!(pipeline.stats().runs_rejected, 1);
    }

    #[tokio::test]
    async fn deep_run_is_fresh_with_unified_badge() {
        let (pipeline, sink) = make_pipeline(true);

        let result = pipeline.process(mood_input("user-1")).await;

        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.metadata.source, ResultSource::Fresh);
        assert_eq!(result.metadata.provenance(), Provenance::Unified);
        assert!(result.metadata.freshness_ms.is_none());
        assert_eq!(result.metadata.sample_size, 3);
        assert_eq!(event_types(&sink), vec!["STARTED", "COMPLETED"]);
        assert_eq!(pipeline.stats().deep_runs, 1);
    }

    #[tokio::test]
    async fn identical_input_is_served_from_cache() {
        let (pipeline, sink) = make_pipeline(true);

        let first = pipeline.process(mood_input("user-1")).await;
        let second = pipeline.process(mood_input("user-1")).await;

        assert_eq!(second.metadata.source, ResultSource::Cache);
        assert_eq!(second.metadata.provenance(), Provenance::Cache);
        assert!(second.metadata.freshness_ms.is_some());
        assert_eq!(second.outcome, first.outcome);
        assert_eq!(pipeline.stats().cache.hits, 1);
        assert_eq!(event_types(&sink), vec!["STARTED", "COMPLETED", "STARTED", "COMPLETED"]);
    }

    #[tokio::test]
    async fn gate_off_serves_heuristics_without_error() {
        let (pipeline, sink) = make_pipeline(false);

        let result = pipeline.process(mood_input("user-1")).await;

        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.metadata.source, ResultSource::Heuristic);
        assert_eq!(result.metadata.quality_level, QualityLevel::Low);
        assert_eq!(event_types(&sink), vec!["STARTED", "COMPLETED"]);
        assert_eq!(pipeline.stats().heuristic_runs, 1);
    }

    #[tokio::test]
    async fn heuristic_results_are_not_cached() {
        let (pipeline, _sink) = make_pipeline(false);

        pipeline.process(mood_input("user-1")).await;
        let second = pipeline.process(mood_input("user-1")).await;

        assert_eq!(second.metadata.source, ResultSource::Heuristic);
        assert_eq!(pipeline.stats().cache.hits, 0);
        assert_eq!(pipeline.stats().cache.entries, 0);
    }

    #[tokio::test]
    async fn progressive_quick_phase_skips_the_deep_path() {
        let (pipeline, _sink) = make_pipeline(true);
        let mut input = mood_input("user-1");
        input.context.progressive = true;
        input.context.phase = Some(1);

        let result = pipeline.process(input).await;

        assert_eq!(result.metadata.source, ResultSource::Heuristic);
        assert_eq!(pipeline.stats().heuristic_runs, 1);
        assert_eq!(pipeline.stats().deep_runs, 0);
    }

    #[tokio::test]
    async fn progressive_second_phase_runs_deep() {
        let (pipeline, _sink) = make_pipeline(true);
        let mut input = mood_input("user-1");
        input.context.progressive = true;
        input.context.phase = Some(2);

        let result = pipeline.process(input).await;

        assert_eq!(result.metadata.source, ResultSource::Fresh);
        assert_eq!(pipeline.stats().deep_runs, 1);
    }

    struct OfflineGenerator;

    #[async_trait::async_trait]
    impl InsightGenerator for OfflineGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _context: &crate::generation::GenerationContext,
        ) -> anyhow::Result<crate::generation::GeneratedInsight> {
            anyhow::bail!("connection refused")
        }

        fn generator_name(&self) -> &'static str {
            "offline"
        }
    }

    #[tokio::test]
    async fn failed_deep_pass_degrades_to_heuristics() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = InsightPipeline::with_components(
            PipelineConfig::default(),
            Arc::new(MemoryCache::new()),
            Arc::new(StaticFlagReader::new().with_flag(AI_UNIFIED_PIPELINE, true)),
            Some(Arc::new(OfflineGenerator)),
            sink.clone(),
        );

        let result = pipeline.process(mood_input("user-1")).await;

        assert!(result.success);
        assert!(result.outcome.is_some());
        assert_eq!(result.metadata.source, ResultSource::Heuristic);
        assert_eq!(result.metadata.quality_level, QualityLevel::Low);
        assert_eq!(
            result.error.as_ref().map(|e| e.category),
            Some(ErrorCategory::AnalyzerFailure)
        );
        assert_eq!(event_types(&sink), vec!["STARTED", "ERROR"]);
        // Degraded results stay out of the cache.
        assert_eq!(pipeline.stats().cache.entries, 0);
    }

    #[tokio::test]
    async fn broken_cache_backend_never_fails_the_run() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = InsightPipeline::with_components(
            PipelineConfig::default(),
            Arc::new(FailingCache),
            Arc::new(StaticFlagReader::new().with_flag(AI_UNIFIED_PIPELINE, true)),
            Some(Arc::new(ScriptedGenerator::new())),
            sink.clone(),
        );

        // The read fault downgrades to a miss, the write fault costs
        // only the stored entry.
        let first = pipeline.process(mood_input("user-1")).await;
        assert!(first.success);
        assert!(first.error.is_none());
        assert_eq!(first.metadata.source, ResultSource::Fresh);

        // Nothing was stored, so the identical call recomputes.
        let second = pipeline.process(mood_input("user-1")).await;
        assert_eq!(second.metadata.source, ResultSource::Fresh);
        assert_eq!(pipeline.stats().deep_runs, 2);
        assert_eq!(
            event_types(&sink),
            vec!["STARTED", "COMPLETED", "STARTED", "COMPLETED"]
        );
    }

    #[tokio::test]
    async fn unavailable_flags_degrade_with_error_event() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = InsightPipeline::with_components(
            PipelineConfig::default(),
            Arc::new(MemoryCache::new()),
            Arc::new(BrokenFlags),
            None,
            sink.clone(),
        );

        let result = pipeline.process(mood_input("user-1")).await;

        assert!(result.success);
        assert!(result.outcome.is_some());
        assert_eq!(result.metadata.source, ResultSource::Heuristic);
        assert_eq!(
            result.error.as_ref().map(|e| e.category),
            Some(ErrorCategory::ConfigUnavailable)
        );
        assert_eq!(event_types(&sink), vec!["STARTED", "ERROR"]);
        assert_eq!(pipeline.stats().degraded_runs, 1);
    }

    #[tokio::test]
    async fn stats_display_covers_all_counters() {
        let (pipeline, _sink) = make_pipeline(true);
        pipeline.process(mood_input("user-1")).await;

        let line = pipeline.stats().to_string();
        assert!(line.contains("1 runs"));
        assert!(line.contains("1 deep"));
    }
}
