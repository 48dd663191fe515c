//! Playback session types.
//!
//! A session is one `play` request. Only the session holding the current
//! [`SessionToken`] is authoritative; anything reported under an older token
//! is discarded by the controller.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AttemptReason;

// ── Session identity ───────────────────────────────────────────────

/// Monotonically increasing session identifier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionToken(pub u64);

impl SessionToken {
    /// The token that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Backends ───────────────────────────────────────────────────────

/// Which synthesis strategy is producing a session's audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Network neural synthesis.
    Remote,
    /// Host speech engine.
    Engine,
    /// Timer-based stand-in.
    Simulated,
    /// No backend has succeeded yet.
    Unassigned,
}

impl BackendKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Engine => "engine",
            Self::Simulated => "simulated",
            Self::Unassigned => "unassigned",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Session state machine ──────────────────────────────────────────

/// Lifecycle state of a playback session.
///
/// ```text
///   Starting → Playing → Completed
///      │          │
///      │          ├──→ Stopping → Completed
///      │          └──→ Failed
///      └──→ Failed (chain exhausted)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    /// The fallback chain is looking for a backend.
    Starting,
    /// A backend is producing audio.
    Playing,
    /// `stop()` is halting the active backend.
    Stopping,
    Completed,
    Failed,
}

impl SessionState {
    /// Whether this state makes the session the active one.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Playing)
    }
}

/// The controller's record of one `play` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSession {
    pub token: SessionToken,
    /// Resolved voice profile id.
    pub voice_id: String,
    pub text: String,
    pub backend: BackendKind,
    pub state: SessionState,
    /// Set while a `Playing` session is paused.
    pub paused: bool,
}

impl PlaybackSession {
    /// A freshly created session, not yet assigned a backend.
    pub fn starting(token: SessionToken, voice_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            token,
            voice_id: voice_id.into(),
            text: text.into(),
            backend: BackendKind::Unassigned,
            state: SessionState::Starting,
            paused: false,
        }
    }

    pub const fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

// ── Caller-facing results ──────────────────────────────────────────

/// Snapshot returned by `get_state()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    /// A session is starting or producing audio and is not paused.
    pub is_playing: bool,
    pub is_paused: bool,
    pub voice_id: Option<String>,
    pub backend: Option<BackendKind>,
    pub token: Option<SessionToken>,
}

impl PlaybackStatus {
    /// Status describing `session`, or the idle status when there is none.
    pub fn from_session(session: Option<&PlaybackSession>) -> Self {
        session.map_or_else(Self::default, |session| {
            let active = session.is_active();
            Self {
                is_playing: active && !session.paused,
                is_paused: active && session.paused,
                voice_id: Some(session.voice_id.clone()),
                backend: Some(session.backend),
                token: Some(session.token),
            }
        })
    }
}

/// How a `play` future settled without error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PlaybackOutcome {
    /// The backend played the text to the end.
    Completed { backend: BackendKind },
    /// `stop()` ended the session.
    Stopped,
    /// A newer `play` call replaced the session.
    Superseded,
    /// The backend reported an error after audio had started.
    Failed { backend: BackendKind, reason: String },
}

// ── Events ─────────────────────────────────────────────────────────

/// Events pushed to the application layer. Only the current session emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The current session changed state.
    StateChanged {
        token: SessionToken,
        state: SessionState,
    },
    /// A backend accepted the session.
    BackendSelected {
        token: SessionToken,
        backend: BackendKind,
    },
    /// A backend declined or failed and the chain moved on.
    BackendSkipped {
        token: SessionToken,
        backend: BackendKind,
        reason: AttemptReason,
    },
}
