//! `espeak-ng` host speech engine.
//!
//! Each utterance runs as one `espeak-ng` process speaking straight to the
//! default audio device. Only one utterance is live at a time; starting a
//! new one terminates the previous process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use narrator_core::{
    EngineError, EngineEvent, EngineEvents, EngineVoice, SessionToken, SpeechEngine, Utterance,
};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::process::{ChildExit, ManagedChild};

const CANDIDATES: [&str; 2] = ["espeak-ng", "espeak"];

/// espeak's default speaking rate in words per minute.
const BASE_WPM: f32 = 175.0;

struct ActiveUtterance {
    id: SessionToken,
    child: ManagedChild,
}

pub struct EspeakEngine {
    program: PathBuf,
    voices: Vec<EngineVoice>,
    current: Mutex<Option<ActiveUtterance>>,
}

impl EspeakEngine {
    /// Find `espeak-ng` (or `espeak`) on `PATH` and read its voice list.
    /// Voices for `language` are listed first. Blocks while probing.
    pub fn detect(language: &str) -> Option<Self> {
        let program = CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())?;

        let voices = match std::process::Command::new(&program).arg("--voices").output() {
            Ok(output) if output.status.success() => {
                parse_voice_list(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                tracing::warn!(program = %program.display(), status = %output.status, "Could not list espeak voices");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(program = %program.display(), error = %e, "Could not list espeak voices");
                Vec::new()
            }
        };

        tracing::debug!(program = %program.display(), voices = voices.len(), "Found espeak");
        Some(Self::with_voices(program, prioritize_language(voices, language)))
    }

    /// Use `program` with a known voice list.
    pub fn with_voices(program: impl Into<PathBuf>, voices: Vec<EngineVoice>) -> Self {
        Self {
            program: program.into(),
            voices,
            current: Mutex::new(None),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn current(&self) -> MutexGuard<'_, Option<ActiveUtterance>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn command_for(&self, utterance: &Utterance) -> Command {
        let mut command = Command::new(&self.program);
        if let Some(voice) = &utterance.voice {
            command.arg("-v").arg(&voice.id);
        }
        command
            .arg("-s")
            .arg(words_per_minute(utterance.rate).to_string())
            .arg("-p")
            .arg(pitch(utterance.pitch).to_string())
            .arg("-a")
            .arg(amplitude(utterance.volume).to_string())
            .arg(&utterance.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

#[async_trait]
impl SpeechEngine for EspeakEngine {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    fn list_voices(&self) -> Vec<EngineVoice> {
        self.voices.clone()
    }

    async fn voices_changed(&self) {
        // The voice list is read once at detection.
        std::future::pending::<()>().await;
    }

    async fn speak(&self, utterance: Utterance) -> Result<EngineEvents, EngineError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(EngineEvent::Started);

        let child = ManagedChild::spawn(
            self.command_for(&utterance),
            Box::new(move |exit| {
                let event = match exit {
                    ChildExit::Success => EngineEvent::Finished,
                    ChildExit::Failed(reason) => EngineEvent::Error(reason),
                    ChildExit::Killed => return,
                };
                let _ = tx.send(event);
            }),
        )?;

        tracing::debug!(utterance = %utterance.id, pid = ?child.pid(), "espeak utterance started");
        let previous = self.current().replace(ActiveUtterance {
            id: utterance.id,
            child,
        });
        if let Some(previous) = previous {
            previous.child.terminate();
        }
        Ok(rx)
    }

    fn cancel(&self, id: SessionToken) {
        let mut current = self.current();
        if current.as_ref().is_some_and(|u| u.id == id) {
            if let Some(utterance) = current.take() {
                utterance.child.terminate();
            }
        }
    }

    fn cancel_all(&self) {
        if let Some(utterance) = self.current().take() {
            utterance.child.terminate();
        }
    }

    fn pause(&self) -> bool {
        self.current().as_ref().is_some_and(|u| u.child.pause())
    }

    fn resume(&self) -> bool {
        self.current().as_ref().is_some_and(|u| u.child.resume())
    }
}

// ── Parameter mapping ──────────────────────────────────────────────

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled(value: f32, unit: f32, min: f32, max: f32) -> u32 {
    (value * unit).round().clamp(min, max) as u32
}

/// Profile rate (1.0 = normal) to espeak words per minute.
pub fn words_per_minute(rate: f32) -> u32 {
    scaled(rate, BASE_WPM, 80.0, 450.0)
}

/// Profile pitch (1.0 = normal) to espeak's 0-99 pitch.
pub fn pitch(pitch: f32) -> u32 {
    scaled(pitch, 50.0, 0.0, 99.0)
}

/// Profile volume (1.0 = full) to espeak's 0-200 amplitude.
pub fn amplitude(volume: f32) -> u32 {
    scaled(volume, 100.0, 0.0, 200.0)
}

// ── Voice list ─────────────────────────────────────────────────────

/// Parse the table printed by `espeak-ng --voices`.
pub fn parse_voice_list(output: &str) -> Vec<EngineVoice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return None;
            }
            let language = fields[1];
            let name = fields[3].replace('_', " ");
            Some(EngineVoice::new(language, name).with_language(language))
        })
        .collect()
}

/// Move voices for `language` (e.g. `en` matches `en-us`) to the front,
/// keeping their relative order.
fn prioritize_language(mut voices: Vec<EngineVoice>, language: &str) -> Vec<EngineVoice> {
    let prefix = format!("{language}-");
    voices.sort_by_key(|voice| {
        !voice
            .language
            .as_deref()
            .is_some_and(|l| l == language || l.starts_with(&prefix))
    });
    voices
}
