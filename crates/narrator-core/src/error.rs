//! Error taxonomy for playback sessions and host ports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::BackendKind;

// ── Per-attempt failures ───────────────────────────────────────────

/// Why a backend that was tried could not produce audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// The credential was rejected.
    Unauthorized,
    /// The service is throttling requests.
    RateLimited,
    /// The remote model is still warming up.
    ModelLoading,
    /// The model or endpoint does not exist.
    NotFound,
    /// Transport error or timeout.
    Network,
    /// Any other failure.
    Unknown,
    /// The host speech engine raised an error before speaking.
    EngineError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate limited",
            Self::ModelLoading => "model loading",
            Self::NotFound => "not found",
            Self::Network => "network",
            Self::Unknown => "unknown",
            Self::EngineError => "engine error",
        };
        f.write_str(label)
    }
}

/// The non-success result of one backend attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AttemptReason {
    /// The backend is not usable on this host or for this request.
    Unsupported { reason: String },
    /// The backend was usable but failed.
    Failure { kind: FailureKind, detail: String },
}

impl fmt::Display for AttemptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { reason } => write!(f, "unsupported: {reason}"),
            Self::Failure { kind, detail } if detail.is_empty() => write!(f, "{kind}"),
            Self::Failure { kind, detail } => write!(f, "{kind}: {detail}"),
        }
    }
}

/// One entry of the fallback chain's attempt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendAttempt {
    pub backend: BackendKind,
    pub reason: AttemptReason,
}

impl fmt::Display for BackendAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.backend, self.reason)
    }
}

// ── Caller-facing errors ───────────────────────────────────────────

/// Errors surfaced to `play` callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// The text to speak was empty.
    #[error("Nothing to speak: text is empty")]
    InvalidInput,

    /// Every backend in the chain declined or failed.
    #[error("No speech backend could play the text: {}", format_attempts(.attempts))]
    ChainExhausted { attempts: Vec<BackendAttempt> },
}

fn format_attempts(attempts: &[BackendAttempt]) -> String {
    if attempts.is_empty() {
        return "no backends configured".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Port errors ────────────────────────────────────────────────────

/// Errors raised by a host speech engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine binary or service is not available.
    #[error("Speech engine unavailable: {0}")]
    Unavailable(String),

    /// The engine refused or failed the utterance.
    #[error("Speech engine failed: {0}")]
    Synthesis(String),

    /// IO error talking to the engine.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a host audio output.
#[derive(Debug, thiserror::Error)]
pub enum AudioOutputError {
    /// No player could be found or opened.
    #[error("Audio output unavailable: {0}")]
    Unavailable(String),

    /// The clip could not be decoded or loaded.
    #[error("Failed to load audio clip: {0}")]
    Load(String),

    /// Playback failed after it started.
    #[error("Audio playback failed: {0}")]
    Playback(String),

    /// IO error (spool files, player process).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors building a custom voice profile registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The registry has no profiles.
    #[error("Voice profile registry is empty")]
    Empty,

    /// Two profiles share an id.
    #[error("Duplicate voice profile id '{0}'")]
    DuplicateId(String),

    /// The default id names no profile.
    #[error("Default voice profile '{0}' is not in the registry")]
    UnknownDefault(String),
}
