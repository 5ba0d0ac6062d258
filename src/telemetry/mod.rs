//! Telemetry events and delivery
//!
//! ## Event Model
//!
//! Every pipeline run emits exactly one `STARTED` event and exactly one
//! terminal event (`COMPLETED` or `ERROR`), correlated by a per-run id.
//! Events are plain data; emission is a [`TelemetrySink`] behind the
//! [`TelemetryEmitter`], so tests can capture events in memory while
//! production forwards them to the tracing pipeline.
//!
//! ## Sanitization
//!
//! Sinks never see raw events. The emitter serializes each event and runs
//! it through [`sanitize`] first: free text dropped, user ids rehashed,
//! contact-like fields stripped. A sink that fails to deliver is logged
//! and ignored; telemetry can never change the outcome of a run.

pub mod sanitize;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::types::{ErrorCategory, InputKind, QualityLevel, SourceDomain};

// ============================================================================
// Events
// ============================================================================

/// Per-event payload, one variant per lifecycle stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TelemetryPayload {
    Started {
        input_kind: InputKind,
        domain: SourceDomain,
    },
    Completed {
        success: bool,
        quality_level: QualityLevel,
        sample_size: usize,
    },
    Error {
        error_category: ErrorCategory,
    },
}

impl TelemetryPayload {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "STARTED",
            Self::Completed { .. } => "COMPLETED",
            Self::Error { .. } => "ERROR",
        }
    }

    /// `STARTED` opens a run; everything else closes one.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started { .. })
    }
}

/// A raw telemetry event as constructed inside the pipeline.
///
/// Carries the raw user id; it exists only in process memory and is
/// pseudonymized before any sink sees it.
#[derive(Debug, Clone)]
pub struct TelemetryEvent {
    pub run_id: Uuid,
    pub user_id: String,
    pub occurred_at: DateTime<Utc>,
    pub payload: TelemetryPayload,
}

impl TelemetryEvent {
    pub fn started(run_id: Uuid, user_id: &str, input_kind: InputKind, domain: SourceDomain) -> Self {
        Self::new(run_id, user_id, TelemetryPayload::Started { input_kind, domain })
    }

    pub fn completed(
        run_id: Uuid,
        user_id: &str,
        success: bool,
        quality_level: QualityLevel,
        sample_size: usize,
    ) -> Self {
        Self::new(
            run_id,
            user_id,
            TelemetryPayload::Completed { success, quality_level, sample_size },
        )
    }

    pub fn error(run_id: Uuid, user_id: &str, error_category: ErrorCategory) -> Self {
        Self::new(run_id, user_id, TelemetryPayload::Error { error_category })
    }

    fn new(run_id: Uuid, user_id: &str, payload: TelemetryPayload) -> Self {
        Self {
            run_id,
            user_id: user_id.to_string(),
            occurred_at: Utc::now(),
            payload,
        }
    }

    /// Produce the scrubbed form delivered to sinks.
    pub fn sanitized(&self) -> SanitizedEvent {
        let mut metadata = match serde_json::to_value(&self.payload) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!(value = %other, "telemetry payload did not serialize to an object");
                serde_json::Map::new()
            }
            Err(err) => {
                warn!(error = %err, "telemetry payload serialization failed");
                serde_json::Map::new()
            }
        };
        // The type tag lives on the envelope, not in the metadata.
        metadata.remove("event_type");
        metadata.insert("run_id".into(), Value::String(self.run_id.to_string()));
        metadata.insert(
            "user_token".into(),
            Value::String(sanitize::pseudonymize_user_id(&self.user_id)),
        );
        metadata.insert("occurred_at".into(), Value::String(self.occurred_at.to_rfc3339()));

        let mut metadata = Value::Object(metadata);
        sanitize::scrub_metadata(&mut metadata);

        SanitizedEvent {
            event_type: self.payload.event_type(),
            metadata,
        }
    }
}

/// What sinks receive: an event type tag plus scrubbed metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedEvent {
    pub event_type: &'static str,
    pub metadata: Value,
}

impl SanitizedEvent {
    /// Pseudonymous user token, when present.
    pub fn user_token(&self) -> Option<&str> {
        self.metadata.get("user_token").and_then(Value::as_str)
    }

    /// Correlation id shared by all events of one run.
    pub fn run_id(&self) -> Option<&str> {
        self.metadata.get("run_id").and_then(Value::as_str)
    }
}

// ============================================================================
// Sinks
// ============================================================================

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry delivery failed: {0}")]
    Delivery(String),
}

/// Delivery boundary for sanitized events.
pub trait TelemetrySink: Send + Sync {
    fn deliver(&self, event: &SanitizedEvent) -> Result<(), TelemetryError>;

    fn sink_name(&self) -> &'static str;
}

/// Forwards events to the tracing pipeline as structured records.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn deliver(&self, event: &SanitizedEvent) -> Result<(), TelemetryError> {
        let metadata = serde_json::to_string(&event.metadata)
            .map_err(|e| TelemetryError::Delivery(e.to_string()))?;
        info!(
            target: "mindsight::telemetry",
            event_type = event.event_type,
            metadata = %metadata,
            "telemetry event"
        );
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "tracing"
    }
}

/// Captures events in memory. Used by tests to assert on what left
/// the pipeline, and by the demo binary to print a run transcript.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SanitizedEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far, in order.
    pub fn events(&self) -> Vec<SanitizedEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl TelemetrySink for MemorySink {
    fn deliver(&self, event: &SanitizedEvent) -> Result<(), TelemetryError> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| TelemetryError::Delivery("memory sink mutex poisoned".to_string()))?;
        events.push(event.clone());
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "memory"
    }
}

// ============================================================================
// Emitter
// ============================================================================

/// Sanitizes and forwards events, absorbing sink failures.
pub struct TelemetryEmitter {
    sink: Arc<dyn TelemetrySink>,
    enabled: bool,
}

impl TelemetryEmitter {
    pub fn new(sink: Arc<dyn TelemetrySink>, enabled: bool) -> Self {
        Self { sink, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sanitize and deliver one event. Never fails the caller.
    pub fn emit(&self, event: &TelemetryEvent) {
        if !self.enabled {
            return;
        }
        let sanitized = event.sanitized();
        if let Err(err) = self.sink.deliver(&sanitized) {
            warn!(
                sink = self.sink.sink_name(),
                error = %err,
                "telemetry delivery failed, continuing"
            );
        }
    }
}
