//! Analysis Orchestration Module
//!
//! ## Six-Step Run Sequence
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
//! GUARANTEE: a call either returns a terminal INVALID_INPUT failure or
//! a successful result; every other fault degrades the path, never the
//! reply.

mod orchestrator;

pub use orchestrator::{InsightPipeline, PipelineInitError, PipelineStats};
