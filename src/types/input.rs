//! Pipeline input: content union, request context, structural validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::records::RecordBundle;

/// Declared shape of the incoming content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Free text only (voice transcript or typed journal text).
    Voice,
    /// Structured domain records only.
    Data,
    /// Both free text and structured records.
    Mixed,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Data => "data",
            Self::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Originating feature area of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceDomain {
    Mood,
    Behavior,
    Therapy,
    Journal,
}

impl SourceDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mood => "mood",
            Self::Behavior => "behavior",
            Self::Therapy => "therapy",
            Self::Journal => "journal",
        }
    }
}

impl std::fmt::Display for SourceDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The content payload as a proper tagged union.
///
/// Each analyzer pattern-matches exhaustively on this enum; there is no
/// runtime shape check beyond the kind/content agreement in
/// [`PipelineInput::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisContent {
    /// Free text (voice transcript or typed entry).
    Voice(String),
    /// Structured domain records.
    Data(RecordBundle),
    /// Free text plus structured records.
    Mixed {
        transcript: String,
        records: RecordBundle,
    },
}

impl AnalysisContent {
    /// Free text carried by this content, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Voice(text) => Some(text),
            Self::Mixed { transcript, .. } => Some(transcript),
            Self::Data(_) => None,
        }
    }

    /// Structured records carried by this content, if any.
    pub fn records(&self) -> Option<&RecordBundle> {
        match self {
            Self::Data(records) | Self::Mixed { records, .. } => Some(records),
            Self::Voice(_) => None,
        }
    }
}

/// Per-call request context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Feature area the request originates from; part of the fingerprint.
    pub domain: SourceDomain,
    /// Caller-supplied request timestamp.
    pub timestamp: DateTime<Utc>,
    /// Progressive two-phase mode: phase 1 = quick heuristic pass,
    /// phase 2 (or unset) = deep analysis.
    #[serde(default)]
    pub progressive: bool,
    /// Progressive phase, `1` or `2`. Other values are rejected.
    #[serde(default)]
    pub phase: Option<u8>,
}

impl RequestContext {
    pub fn new(domain: SourceDomain) -> Self {
        Self {
            domain,
            timestamp: Utc::now(),
            progressive: false,
            phase: None,
        }
    }
}

/// Structural validation failure. Terminal: the call returns
/// `{success: false}` without running any analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("content shape does not match declared kind '{kind}'")]
    KindMismatch { kind: &'static str },
    #[error("free-text content is empty")]
    EmptyText,
    #[error("record bundle is empty")]
    EmptyBundle,
    #[error("progressive phase must be 1 or 2, got {0}")]
    BadPhase(u8),
    #[error("user id is empty")]
    EmptyUserId,
}

/// Input to a single orchestrator call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineInput {
    pub user_id: String,
    pub content: AnalysisContent,
    pub kind: InputKind,
    pub context: RequestContext,
}

impl PipelineInput {
    /// Check that `content` is structurally valid for the declared kind.
    ///
    /// Rules:
    /// - `Voice` requires `AnalysisContent::Voice` with non-blank text.
    /// - `Data` requires `AnalysisContent::Data` with a non-empty bundle.
    /// - `Mixed` requires `AnalysisContent::Mixed` with both present.
    /// - `context.phase`, when set, must be `1` or `2`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::EmptyUserId);
        }

        match (self.kind, &self.content) {
            (InputKind::Voice, AnalysisContent::Voice(text)) => {
                if text.trim().is_empty() {
                    return Err(ValidationError::EmptyText);
                }
            }
            (InputKind::Data, AnalysisContent::Data(records)) => {
                if records.is_empty() {
                    return Err(ValidationError::EmptyBundle);
                }
            }
            (InputKind::Mixed, AnalysisContent::Mixed { transcript, records }) => {
                if transcript.trim().is_empty() {
                    return Err(ValidationError::EmptyText);
                }
                if records.is_empty() {
                    return Err(ValidationError::EmptyBundle);
                }
            }
            (kind, _) => {
                return Err(ValidationError::KindMismatch { kind: kind.as_str() });
            }
        }

        if let Some(phase) = self.context.phase {
            if phase != 1 && phase != 2 {
                return Err(ValidationError::BadPhase(phase));
            }
        }

        Ok(())
    }

    /// Whether this call is the quick pass of a progressive pair.
    pub fn is_progressive_quick_phase(&self) -> bool {
        self.context.progressive && self.context.phase == Some(1)
    }
}
