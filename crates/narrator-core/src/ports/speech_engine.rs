//! Host speech engine port.
//!
//! A `SpeechEngine` is whatever local synthesizer the host offers: a
//! command-line tool, a platform speech API, or a test fake. The engine
//! adapter in `narrator-voice` drives it through this trait only.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::SessionToken;
use crate::error::EngineError;

/// A concrete voice installed on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineVoice {
    /// Identifier the engine accepts when selecting this voice.
    pub id: String,
    /// Human-readable name, matched against profile preferences.
    pub name: String,
    pub language: Option<String>,
}

impl EngineVoice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// One request to speak, tagged with the session that issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: SessionToken,
    pub text: String,
    /// `None` lets the engine pick its default voice.
    pub voice: Option<EngineVoice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Lifecycle events of a spoken utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Audio has started.
    Started,
    /// The utterance was spoken to the end.
    Finished,
    /// The engine failed while speaking.
    Error(String),
}

/// Event stream for one utterance. The sender is dropped without a
/// terminal event when the utterance is cancelled.
pub type EngineEvents = mpsc::UnboundedReceiver<EngineEvent>;

#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Voices currently installed. May be empty until the engine has loaded
    /// its voice list.
    fn list_voices(&self) -> Vec<EngineVoice>;

    /// Resolves the next time the voice list changes.
    async fn voices_changed(&self);

    /// Whether `speak` needs a voice when none is installed.
    fn requires_explicit_voice(&self) -> bool {
        false
    }

    /// Start speaking. Events for this utterance arrive on the returned
    /// receiver.
    async fn speak(&self, utterance: Utterance) -> Result<EngineEvents, EngineError>;

    /// Cancel the utterance registered under `id`, if it is still queued or
    /// speaking. Must take effect before returning.
    fn cancel(&self, id: SessionToken) {
        let _ = id;
        self.cancel_all();
    }

    /// Cancel everything queued or speaking.
    fn cancel_all(&self);

    /// Pause speech. Returns whether the engine supports it.
    fn pause(&self) -> bool {
        false
    }

    /// Resume paused speech. Returns whether the engine supports it.
    fn resume(&self) -> bool {
        false
    }
}
