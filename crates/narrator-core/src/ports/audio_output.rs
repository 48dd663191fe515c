//! Host audio output port.
//!
//! Playback is per clip: `AudioOutput::load` hands back an [`AudioElement`]
//! that owns exactly one clip, so halting an old session's element can never
//! touch a newer session's audio.

use std::path::PathBuf;

use tokio::sync::oneshot;

use crate::error::AudioOutputError;

/// A decoded audio resource on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub path: PathBuf,
    /// MIME type reported by the producer, if any.
    pub mime_type: Option<String>,
}

impl AudioClip {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mime_type: None,
        }
    }

    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Settles once when the clip plays to the end (`Ok`) or playback fails
/// (`Err`). Dropped without a value when the element is halted.
pub type PlaybackCompletion = oneshot::Receiver<Result<(), AudioOutputError>>;

/// Factory for playable audio elements.
pub trait AudioOutput: Send + Sync {
    /// Short output name for logs.
    fn name(&self) -> &str;

    /// Prepare `clip` for playback without starting it.
    fn load(&self, clip: &AudioClip) -> Result<Box<dyn AudioElement>, AudioOutputError>;
}

/// One loaded clip.
pub trait AudioElement: Send + Sync {
    /// Start playback from the current position.
    fn play(&self) -> Result<PlaybackCompletion, AudioOutputError>;

    /// Pause playback. Returns whether the element was playing.
    fn pause(&self) -> bool;

    /// Resume after [`pause`](Self::pause). Returns whether the element was paused.
    fn resume(&self) -> bool;

    /// Stop and rewind. A pending completion is dropped, never fired.
    fn reset_position(&self);
}
