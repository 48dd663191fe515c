//! Audio output through a command-line player (`afplay`, `paplay`,
//! `aplay`, `ffplay`).
//!
//! Each loaded clip becomes one player process when it starts. Pause and
//! resume suspend the process on unix.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard, PoisonError};

use narrator_core::{AudioClip, AudioElement, AudioOutput, AudioOutputError, PlaybackCompletion};
use tokio::process::Command;
use tokio::sync::oneshot;

use crate::process::{ChildExit, ManagedChild};

/// Players tried in order when none is configured.
const KNOWN_PLAYERS: [(&str, &[&str]); 4] = [
    ("afplay", &[]),
    ("paplay", &[]),
    ("aplay", &["-q"]),
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
];

#[derive(Debug, Clone)]
pub struct ProcessAudioOutput {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessAudioOutput {
    /// Resolve `command` (e.g. `"ffplay -nodisp -autoexit"`) if given,
    /// otherwise the first known player on `PATH`.
    pub fn detect(command: Option<&str>) -> Option<Self> {
        if let Some(command) = command {
            let mut parts = command.split_whitespace();
            let name = parts.next()?;
            return match which::which(name) {
                Ok(program) => Some(Self::new(program, parts.map(str::to_string).collect())),
                Err(e) => {
                    tracing::warn!(player = name, error = %e, "Configured audio player not found");
                    None
                }
            };
        }

        KNOWN_PLAYERS.iter().find_map(|(name, args)| {
            which::which(name)
                .ok()
                .map(|program| Self::new(program, args.iter().map(|a| (*a).to_string()).collect()))
        })
    }

    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl AudioOutput for ProcessAudioOutput {
    fn name(&self) -> &str {
        self.program
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("player")
    }

    fn load(&self, clip: &AudioClip) -> Result<Box<dyn AudioElement>, AudioOutputError> {
        if !clip.path.is_file() {
            return Err(AudioOutputError::Load(format!(
                "{} does not exist",
                clip.path.display()
            )));
        }
        Ok(Box::new(ProcessElement {
            program: self.program.clone(),
            args: self.args.clone(),
            path: clip.path.clone(),
            child: Mutex::new(None),
        }))
    }
}

struct ProcessElement {
    program: PathBuf,
    args: Vec<String>,
    path: PathBuf,
    child: Mutex<Option<ManagedChild>>,
}

impl ProcessElement {
    fn child(&self) -> MutexGuard<'_, Option<ManagedChild>> {
        self.child.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioElement for ProcessElement {
    fn play(&self) -> Result<PlaybackCompletion, AudioOutputError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(&self.path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let (tx, rx) = oneshot::channel();
        let child = ManagedChild::spawn(
            command,
            Box::new(move |exit| match exit {
                ChildExit::Success => {
                    let _ = tx.send(Ok(()));
                }
                ChildExit::Failed(reason) => {
                    let _ = tx.send(Err(AudioOutputError::Playback(reason)));
                }
                ChildExit::Killed => {}
            }),
        )?;

        tracing::debug!(player = %self.program.display(), pid = ?child.pid(), "Audio player started");
        if let Some(previous) = self.child().replace(child) {
            previous.terminate();
        }
        Ok(rx)
    }

    fn pause(&self) -> bool {
        self.child().as_ref().is_some_and(ManagedChild::pause)
    }

    fn resume(&self) -> bool {
        self.child().as_ref().is_some_and(ManagedChild::resume)
    }

    fn reset_position(&self) {
        if let Some(child) = self.child().take() {
            child.terminate();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_clip_is_rejected() {
        let output = ProcessAudioOutput::new("true", Vec::new());
        let result = output.load(&AudioClip::new("/nonexistent/narrator.wav"));
        assert!(matches!(result, Err(AudioOutputError::Load(_))));
    }

    #[test]
    fn unknown_configured_player_is_not_detected() {
        assert!(ProcessAudioOutput::detect(Some("no-such-player-binary --flag")).is_none());
    }

    #[tokio::test]
    async fn completes_when_player_exits() {
        let mut clip = tempfile::NamedTempFile::new().unwrap();
        clip.write_all(b"RIFF").unwrap();

        let output = ProcessAudioOutput::new("true", Vec::new());
        let element = output.load(&AudioClip::new(clip.path())).unwrap();
        let completion = element.play().unwrap();
        assert!(completion.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn reset_drops_the_completion() {
        let mut clip = tempfile::NamedTempFile::new().unwrap();
        clip.write_all(b"RIFF").unwrap();

        let output = ProcessAudioOutput::new("sh", vec!["-c".to_string(), "exec sleep 30".to_string()]);
        let element = output.load(&AudioClip::new(clip.path())).unwrap();
        let completion = element.play().unwrap();

        assert!(element.pause());
        assert!(element.resume());
        element.reset_position();
        assert!(completion.await.is_err());
    }
}
