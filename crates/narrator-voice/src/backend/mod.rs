//! Speech backends: the strategies the fallback chain tries in order.
//!
//! Every backend implements [`SpeechBackend`]. A successful attempt hands
//! back a [`Playback`]: the live resource (tagged by backend) plus a future
//! that resolves when the audio ends. The session controller owns both and
//! dispatches stop/pause/resume on the resource tag.
//!
//! | Module        | Backend     | Resource                    |
//! |---------------|-------------|-----------------------------|
//! | [`remote`]    | `Remote`    | audio element + spool file  |
//! | [`engine`]    | `Engine`    | host utterance              |
//! | [`simulated`] | `Simulated` | timer task                  |

pub mod engine;
pub mod remote;
pub mod simulated;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use narrator_core::{AudioElement, BackendKind, FailureKind, SessionToken, SpeechEngine, VoiceProfile};
use tempfile::TempPath;
use tokio::task::AbortHandle;

pub use engine::EngineBackend;
pub use remote::RemoteBackend;
pub use simulated::{SimulatedBackend, simulated_duration};

// ── Requests and results ───────────────────────────────────────────

/// What a backend is asked to speak.
#[derive(Debug, Clone, Copy)]
pub struct SpeechRequest<'a> {
    pub token: SessionToken,
    pub text: &'a str,
    pub profile: &'a VoiceProfile,
}

/// How a started playback ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEnd {
    Finished,
    Errored(String),
}

/// Result of one backend attempt.
pub enum BackendResult {
    /// Audio is playing.
    Success(Playback),
    /// The backend cannot serve this host or request.
    Unsupported(String),
    /// The backend tried and failed.
    Failure(FailureKind, String),
}

impl fmt::Debug for BackendResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(playback) => f.debug_tuple("Success").field(&playback.kind()).finish(),
            Self::Unsupported(reason) => f.debug_tuple("Unsupported").field(reason).finish(),
            Self::Failure(kind, detail) => {
                f.debug_tuple("Failure").field(kind).field(detail).finish()
            }
        }
    }
}

/// A started playback: the resource to halt, and its completion.
pub struct Playback {
    resource: ActivePlayback,
    finished: BoxFuture<'static, PlaybackEnd>,
}

impl Playback {
    pub fn new(resource: ActivePlayback, finished: BoxFuture<'static, PlaybackEnd>) -> Self {
        Self { resource, finished }
    }

    pub const fn kind(&self) -> BackendKind {
        self.resource.kind()
    }

    pub fn into_parts(self) -> (ActivePlayback, BoxFuture<'static, PlaybackEnd>) {
        (self.resource, self.finished)
    }
}

// ── Active resources ───────────────────────────────────────────────

/// The live resource behind a playing session, tagged by backend.
pub enum ActivePlayback {
    Remote(RemotePlayback),
    Engine(EnginePlayback),
    Simulated(SimulatedPlayback),
}

impl ActivePlayback {
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Remote(_) => BackendKind::Remote,
            Self::Engine(_) => BackendKind::Engine,
            Self::Simulated(_) => BackendKind::Simulated,
        }
    }

    /// Silence the resource synchronously. No completion fires afterwards.
    pub fn halt(self) {
        match self {
            Self::Remote(remote) => remote.halt(),
            Self::Engine(engine) => engine.halt(),
            Self::Simulated(simulated) => simulated.halt(),
        }
    }

    /// Returns whether the pause took effect.
    pub fn pause(&self) -> bool {
        match self {
            Self::Remote(remote) => remote.element.pause(),
            Self::Engine(engine) => engine.engine.pause(),
            Self::Simulated(_) => false,
        }
    }

    /// Returns whether the resume took effect.
    pub fn resume(&self) -> bool {
        match self {
            Self::Remote(remote) => remote.element.resume(),
            Self::Engine(engine) => engine.engine.resume(),
            Self::Simulated(_) => false,
        }
    }
}

impl fmt::Debug for ActivePlayback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActivePlayback").field(&self.kind()).finish()
    }
}

/// Remote audio loaded into the host output. The spool file is deleted when
/// this value is dropped.
pub struct RemotePlayback {
    element: Box<dyn AudioElement>,
    spool: TempPath,
}

impl RemotePlayback {
    pub fn new(element: Box<dyn AudioElement>, spool: TempPath) -> Self {
        Self { element, spool }
    }

    fn halt(self) {
        self.element.pause();
        self.element.reset_position();
        tracing::debug!(spool = %self.spool.display(), "Releasing remote audio");
    }
}

/// An utterance registered with the host engine under its session token.
pub struct EnginePlayback {
    engine: Arc<dyn SpeechEngine>,
    token: SessionToken,
}

impl EnginePlayback {
    pub fn new(engine: Arc<dyn SpeechEngine>, token: SessionToken) -> Self {
        Self { engine, token }
    }

    fn halt(self) {
        self.engine.cancel(self.token);
    }
}

/// The simulated playback timer.
pub struct SimulatedPlayback {
    timer: AbortHandle,
}

impl SimulatedPlayback {
    pub const fn new(timer: AbortHandle) -> Self {
        Self { timer }
    }

    fn halt(self) {
        self.timer.abort();
    }
}

// ── Backend trait ──────────────────────────────────────────────────

/// One synthesis strategy.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Try to start speaking `request`. Resolves once audio has started or
    /// the attempt has failed; never waits for playback to finish.
    async fn try_synthesize_and_play(&self, request: &SpeechRequest<'_>) -> BackendResult;

    /// Silence anything this backend started for `token` that has not been
    /// handed back yet. Called when a session is stopped mid-attempt.
    fn silence(&self, token: SessionToken) {
        let _ = token;
    }
}
