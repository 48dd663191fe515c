//! Playback session controller.
//!
//! The controller owns the single authoritative playback session. Every
//! transition runs inside one critical section over the session record:
//!
//! ```text
//!   play(b) ──► mint token, settle a as Superseded, halt a, record b Starting,
//!               spawn driver(b)
//!   driver(b) ─► chain.run ─► activate(b) ─► await end ─► finish(b)
//!   stop() ───► halt current, Stopping → Completed, settle as Stopped
//! ```
//!
//! The driver re-checks its token at every step; once a newer session exists
//! (or the session was stopped) anything it reports is discarded and any
//! resource it still holds is halted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use narrator_core::{
    BackendAttempt, BackendKind, PlaybackError, PlaybackOutcome, PlaybackSession, PlaybackStatus,
    SessionEvent, SessionState, SessionToken, VoiceProfile, VoiceProfileRegistry,
};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::backend::{ActivePlayback, PlaybackEnd, SpeechRequest};
use crate::chain::FallbackChain;

/// Resolves when the session started by [`SessionController::play`] ends.
pub type PlaybackFuture = BoxFuture<'static, Result<PlaybackOutcome, PlaybackError>>;

type Settle = oneshot::Sender<Result<PlaybackOutcome, PlaybackError>>;

// ── Session record ─────────────────────────────────────────────────

#[derive(Default)]
struct ControllerState {
    last_token: SessionToken,
    session: Option<PlaybackSession>,
    /// Resource of the current session once a backend has started.
    active: Option<ActivePlayback>,
    /// Settles the current session's `play` future. Present until settled.
    pending: Option<Settle>,
    cancel: Option<CancellationToken>,
}

impl ControllerState {
    fn is_live(&self, token: SessionToken) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.token == token && s.is_active())
    }

    fn settle(&mut self, result: Result<PlaybackOutcome, PlaybackError>) {
        if let Some(pending) = self.pending.take() {
            let _ = pending.send(result);
        }
    }
}

struct Shared {
    chain: FallbackChain,
    state: Mutex<ControllerState>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emit a session event (best-effort).
    fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("Session event receiver dropped");
        }
    }

    fn set_state(&self, state: &mut ControllerState, new_state: SessionState) {
        let Some(session) = state.session.as_mut() else {
            return;
        };
        if session.state != new_state {
            tracing::debug!(token = %session.token, old = ?session.state, new = ?new_state, "Session state transition");
            session.state = new_state;
            if !new_state.is_active() {
                session.paused = false;
            }
            self.emit(SessionEvent::StateChanged {
                token: session.token,
                state: new_state,
            });
        }
    }

    /// Silence the current session's backend and settle its future with
    /// `outcome`. Leaves the session state to the caller.
    fn halt_current(&self, state: &mut ControllerState, outcome: PlaybackOutcome) {
        if let Some(cancel) = state.cancel.take() {
            cancel.cancel();
        }
        match state.active.take() {
            Some(resource) => {
                tracing::debug!(backend = %resource.kind(), "Halting active playback");
                resource.halt();
            }
            None if state.pending.is_some() => {
                if let Some(session) = &state.session {
                    self.chain.silence(session.token);
                }
            }
            None => {}
        }
        state.settle(Ok(outcome));
    }

    fn record_skip(&self, token: SessionToken, attempt: &BackendAttempt) {
        let state = self.lock();
        if state.is_live(token) {
            self.emit(SessionEvent::BackendSkipped {
                token,
                backend: attempt.backend,
                reason: attempt.reason.clone(),
            });
        }
    }

    /// Install `resource` as the session's active playback. Returns `false`
    /// (after halting it) when the session is no longer current.
    fn activate(&self, token: SessionToken, resource: ActivePlayback) -> bool {
        let mut state = self.lock();
        if !state.is_live(token) {
            drop(state);
            tracing::debug!(token = %token, backend = %resource.kind(), "Session no longer current, halting late playback");
            resource.halt();
            return false;
        }

        let backend = resource.kind();
        if let Some(session) = state.session.as_mut() {
            session.backend = backend;
        }
        state.active = Some(resource);
        self.emit(SessionEvent::BackendSelected { token, backend });
        self.set_state(&mut state, SessionState::Playing);
        true
    }

    fn finish(&self, token: SessionToken, backend: BackendKind, end: PlaybackEnd) {
        let mut state = self.lock();
        if !state.is_live(token) {
            tracing::debug!(token = %token, "Ignoring completion from stale session");
            return;
        }

        state.active = None;
        state.cancel = None;
        match end {
            PlaybackEnd::Finished => {
                tracing::info!(token = %token, backend = %backend, "Playback session completed");
                self.set_state(&mut state, SessionState::Completed);
                state.settle(Ok(PlaybackOutcome::Completed { backend }));
            }
            PlaybackEnd::Errored(reason) => {
                tracing::warn!(token = %token, backend = %backend, %reason, "Playback failed after it started");
                self.set_state(&mut state, SessionState::Failed);
                state.settle(Ok(PlaybackOutcome::Failed { backend, reason }));
            }
        }
    }

    fn exhaust(&self, token: SessionToken, attempts: Vec<BackendAttempt>) {
        let mut state = self.lock();
        if !state.is_live(token) {
            tracing::debug!(token = %token, "Ignoring exhausted chain from stale session");
            return;
        }

        tracing::warn!(token = %token, attempts = attempts.len(), "Every speech backend failed");
        state.cancel = None;
        self.set_state(&mut state, SessionState::Failed);
        state.settle(Err(PlaybackError::ChainExhausted { attempts }));
    }
}

// ── Controller ─────────────────────────────────────────────────────

/// Coordinates playback sessions over a [`FallbackChain`].
pub struct SessionController {
    registry: VoiceProfileRegistry,
    shared: Arc<Shared>,
}

impl SessionController {
    /// Create a controller and the receiver for its [`SessionEvent`]s.
    pub fn new(
        registry: VoiceProfileRegistry,
        chain: FallbackChain,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            chain,
            state: Mutex::new(ControllerState::default()),
            event_tx,
        });
        (Self { registry, shared }, event_rx)
    }

    pub const fn registry(&self) -> &VoiceProfileRegistry {
        &self.registry
    }

    /// Backend kinds in fallback order.
    pub fn backends(&self) -> Vec<BackendKind> {
        self.shared.chain.describe()
    }

    /// Speak `text` in the voice `voice_id`, superseding any current session.
    ///
    /// The previous session is silenced and its future settled before this
    /// returns. Empty text is rejected without touching any backend. Must be
    /// called from within a tokio runtime.
    pub fn play(&self, text: &str, voice_id: &str) -> PlaybackFuture {
        match self.begin(text, voice_id) {
            Ok(settled) => async move {
                settled
                    .await
                    .unwrap_or(Ok(PlaybackOutcome::Superseded))
            }
            .boxed(),
            Err(e) => futures_util::future::ready(Err(e)).boxed(),
        }
    }

    fn begin(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<oneshot::Receiver<Result<PlaybackOutcome, PlaybackError>>, PlaybackError> {
        if text.trim().is_empty() {
            tracing::warn!(voice_id, "Rejecting playback of empty text");
            return Err(PlaybackError::InvalidInput);
        }

        let profile = self.registry.lookup(voice_id).clone();
        let (settle_tx, settle_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let token = {
            let mut state = self.shared.lock();
            let token = state.last_token.next();
            state.last_token = token;

            if let Some(previous) = state.session.as_ref().filter(|s| s.is_active()) {
                tracing::debug!(previous = %previous.token, token = %token, "Superseding playback session");
            }
            self.shared
                .halt_current(&mut state, PlaybackOutcome::Superseded);

            state.session = Some(PlaybackSession::starting(token, &profile.id, text));
            state.pending = Some(settle_tx);
            state.cancel = Some(cancel.clone());
            self.shared.emit(SessionEvent::StateChanged {
                token,
                state: SessionState::Starting,
            });
            token
        };

        tracing::info!(token = %token, voice_id = %profile.id, chars = text.chars().count(), "Starting playback session");
        tokio::spawn(drive(
            Arc::clone(&self.shared),
            token,
            text.to_string(),
            profile,
            cancel,
        ));
        Ok(settle_rx)
    }

    /// Halt the current session. Idempotent; a no-op when nothing is
    /// starting or playing.
    pub fn stop(&self) {
        let shared = &self.shared;
        let mut state = shared.lock();
        let Some(token) = state
            .session
            .as_ref()
            .filter(|s| s.is_active())
            .map(|s| s.token)
        else {
            return;
        };

        tracing::info!(token = %token, "Stopping playback session");
        shared.set_state(&mut state, SessionState::Stopping);
        shared.halt_current(&mut state, PlaybackOutcome::Stopped);
        shared.set_state(&mut state, SessionState::Completed);
    }

    /// Pause the playing session. Returns whether playback paused.
    pub fn pause(&self) -> bool {
        let mut state = self.shared.lock();
        let Some(token) = state
            .session
            .as_ref()
            .filter(|s| s.state == SessionState::Playing && !s.paused)
            .map(|s| s.token)
        else {
            return false;
        };

        let paused = state.active.as_ref().is_some_and(ActivePlayback::pause);
        if paused {
            if let Some(session) = state.session.as_mut() {
                session.paused = true;
            }
            tracing::debug!(token = %token, "Paused playback");
        }
        paused
    }

    /// Resume a paused session. Returns whether playback resumed.
    pub fn resume(&self) -> bool {
        let mut state = self.shared.lock();
        let Some(token) = state
            .session
            .as_ref()
            .filter(|s| s.state == SessionState::Playing && s.paused)
            .map(|s| s.token)
        else {
            return false;
        };

        let resumed = state.active.as_ref().is_some_and(ActivePlayback::resume);
        if resumed {
            if let Some(session) = state.session.as_mut() {
                session.paused = false;
            }
            tracing::debug!(token = %token, "Resumed playback");
        }
        resumed
    }

    pub fn get_state(&self) -> PlaybackStatus {
        PlaybackStatus::from_session(self.shared.lock().session.as_ref())
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drive one session through the chain and report back under its token.
async fn drive(
    shared: Arc<Shared>,
    token: SessionToken,
    text: String,
    profile: VoiceProfile,
    cancel: CancellationToken,
) {
    let request = SpeechRequest {
        token,
        text: &text,
        profile: &profile,
    };
    let observer = Arc::clone(&shared);
    let attempt = shared
        .chain
        .run(&request, move |skipped| observer.record_skip(token, skipped));

    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::debug!(token = %token, "Session ended while starting");
            return;
        }
        result = attempt => result,
    };

    let playback = match result {
        Ok(playback) => playback,
        Err(attempts) => {
            shared.exhaust(token, attempts);
            return;
        }
    };

    let (resource, finished) = playback.into_parts();
    let backend = resource.kind();
    if !shared.activate(token, resource) {
        return;
    }

    let end = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        end = finished => end,
    };
    shared.finish(token, backend, end);
}
