//! Two-speed analysis paths
//!
//! ## Fast and Slow
//!
//! [`HeuristicAnalyzer`] is the fast path: a purely local scan that
//! answers in microseconds and never leaves the process. The
//! [`DeepAnalyzer`] is the slow path: full statistical engines over the
//! typed records plus an optional external generator call. Both produce
//! the same [`AnalyzerOutput`] so the orchestrator can treat them
//! uniformly and degrade from one to the other.

mod deep;
mod heuristic;

pub use deep::DeepAnalyzer;
pub use heuristic::{HeuristicAnalyzer, HEURISTIC_CONFIDENCE};

use crate::types::AnalysisOutcome;

/// What an analysis pass hands back to the orchestrator: the outcome
/// plus the raw signals the quality estimator feeds on.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerOutput {
    pub outcome: AnalysisOutcome,
    /// Representative confidence of the pass, in `[0, 1]`.
    pub confidence: f64,
    /// Records actually considered across all engines.
    pub sample_size: usize,
    /// Valid share of the input window, when the pass measured one.
    pub data_quality: Option<f64>,
}
