//! Domain Analytics Engines
//!
//! One engine per record domain, all sharing the statistics helpers in
//! [`stats`]. Every engine takes an ordered-by-time window of records and
//! returns an [`crate::types::AnalyticsSnapshot`] plus domain-specific
//! extras. Snapshots are recomputed fresh on every deep-path invocation
//! from the caller-supplied window and never persisted on their own.

mod behavior;
mod mood;
pub mod stats;
mod therapy;

pub use behavior::{BehaviorAnalysis, BehaviorBaseline, BehaviorEngine, CategoryPattern};
pub use mood::{MoodAnalysis, MoodEngine};
pub use therapy::{TherapyAnalysis, TherapyEngine};
