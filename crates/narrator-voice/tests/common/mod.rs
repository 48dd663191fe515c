//! Shared fakes for narrator-voice integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use narrator_core::{
    AudioClip, AudioElement, AudioOutput, AudioOutputError, BackendKind, EngineError, EngineEvent,
    EngineEvents, EngineVoice, FailureKind, PlaybackCompletion, SessionToken, SpeechEngine,
    Utterance, VoiceProfileRegistry,
};
use narrator_voice::{
    BackendResult, RemoteSynthesisRequest, SpeechBackend, SpeechRequest, SynthesisTransport,
    TransportError, TransportResponse,
};
use tokio::sync::{Notify, mpsc, oneshot};

pub fn registry() -> VoiceProfileRegistry {
    VoiceProfileRegistry::builtin()
}

// ============================================================================
// Speech engine
// ============================================================================

#[derive(Debug, Clone)]
pub enum SpeakBehavior {
    /// Report `Started` immediately.
    Start,
    /// Report an error before starting.
    FailBeforeStart(String),
}

pub struct FakeEngine {
    voices: Mutex<Vec<EngineVoice>>,
    explicit_voice: bool,
    voices_published: Notify,
    behavior: Mutex<SpeakBehavior>,
    spoken: Mutex<Vec<(Utterance, mpsc::UnboundedSender<EngineEvent>)>>,
    cancelled: Mutex<Vec<SessionToken>>,
    paused: AtomicBool,
}

impl FakeEngine {
    pub fn with_voices(names: &[&str]) -> Arc<Self> {
        Arc::new(Self::build(voices(names), false))
    }

    pub fn without_voices(requires_explicit_voice: bool) -> Arc<Self> {
        Arc::new(Self::build(Vec::new(), requires_explicit_voice))
    }

    fn build(voices: Vec<EngineVoice>, explicit_voice: bool) -> Self {
        Self {
            voices: Mutex::new(voices),
            explicit_voice,
            voices_published: Notify::new(),
            behavior: Mutex::new(SpeakBehavior::Start),
            spoken: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            paused: AtomicBool::new(false),
        }
    }

    pub fn set_behavior(&self, behavior: SpeakBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn publish_voices(&self, names: &[&str]) {
        *self.voices.lock().unwrap() = voices(names);
        self.voices_published.notify_one();
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|(u, _)| u.clone())
            .collect()
    }

    pub fn cancelled(&self) -> Vec<SessionToken> {
        self.cancelled.lock().unwrap().clone()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Deliver `event` for utterance `id`, even if it was cancelled.
    pub fn send(&self, id: SessionToken, event: EngineEvent) {
        let spoken = self.spoken.lock().unwrap();
        if let Some((_, tx)) = spoken.iter().find(|(u, _)| u.id == id) {
            let _ = tx.send(event);
        }
    }

    pub fn finish(&self, id: SessionToken) {
        self.send(id, EngineEvent::Finished);
    }
}

fn voices(names: &[&str]) -> Vec<EngineVoice> {
    names.iter().map(|n| EngineVoice::new(*n, *n)).collect()
}

#[async_trait]
impl SpeechEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake-engine"
    }

    fn list_voices(&self) -> Vec<EngineVoice> {
        self.voices.lock().unwrap().clone()
    }

    async fn voices_changed(&self) {
        self.voices_published.notified().await;
    }

    fn requires_explicit_voice(&self) -> bool {
        self.explicit_voice
    }

    async fn speak(&self, utterance: Utterance) -> Result<EngineEvents, EngineError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            SpeakBehavior::Start => {
                let _ = tx.send(EngineEvent::Started);
            }
            SpeakBehavior::FailBeforeStart(message) => {
                let _ = tx.send(EngineEvent::Error(message));
            }
        }
        self.spoken.lock().unwrap().push((utterance, tx));
        Ok(rx)
    }

    fn cancel(&self, id: SessionToken) {
        self.cancelled.lock().unwrap().push(id);
    }

    fn cancel_all(&self) {
        let ids: Vec<_> = self.spoken().iter().map(|u| u.id).collect();
        self.cancelled.lock().unwrap().extend(ids);
    }

    fn pause(&self) -> bool {
        !self.paused.swap(true, Ordering::SeqCst)
    }

    fn resume(&self) -> bool {
        self.paused.swap(false, Ordering::SeqCst)
    }
}

// ============================================================================
// Synthesis transport
// ============================================================================

/// Returns the same canned response to every request.
pub struct FakeTransport {
    outcome: Result<TransportResponse, String>,
    delay: Option<Duration>,
    requests: Mutex<Vec<RemoteSynthesisRequest>>,
    calls: AtomicUsize,
}

impl FakeTransport {
    pub fn audio(bytes: &[u8]) -> Self {
        Self::respond(200, Some("audio/wav"), bytes)
    }

    pub fn respond(status: u16, content_type: Option<&str>, body: &[u8]) -> Self {
        Self::with_outcome(Ok(TransportResponse {
            status,
            content_type: content_type.map(str::to_string),
            body: body.to_vec(),
        }))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_outcome(Err(message.to_string()))
    }

    fn with_outcome(outcome: Result<TransportResponse, String>) -> Self {
        Self {
            outcome,
            delay: None,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RemoteSynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisTransport for FakeTransport {
    async fn synthesize(
        &self,
        request: &RemoteSynthesisRequest,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone().map_err(TransportError::Client)
    }
}

// ============================================================================
// Audio output
// ============================================================================

/// State of one clip loaded into [`FakeOutput`].
pub struct FakeClip {
    pub path: PathBuf,
    pub contents: Vec<u8>,
    completion: Mutex<Option<oneshot::Sender<Result<(), AudioOutputError>>>>,
    paused: AtomicBool,
    resets: AtomicUsize,
}

impl FakeClip {
    /// Play the clip to the end.
    pub fn finish(&self) {
        if let Some(tx) = self.completion.lock().unwrap().take() {
            let _ = tx.send(Ok(()));
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

/// Records every loaded clip and lets the test finish them.
#[derive(Default)]
pub struct FakeOutput {
    clips: Mutex<Vec<Arc<FakeClip>>>,
}

impl FakeOutput {
    pub fn clips(&self) -> Vec<Arc<FakeClip>> {
        self.clips.lock().unwrap().clone()
    }

    pub fn last(&self) -> Arc<FakeClip> {
        self.clips().pop().expect("no clip loaded")
    }
}

impl AudioOutput for FakeOutput {
    fn name(&self) -> &str {
        "fake-output"
    }

    fn load(&self, clip: &AudioClip) -> Result<Box<dyn AudioElement>, AudioOutputError> {
        let contents = std::fs::read(&clip.path)?;
        let state = Arc::new(FakeClip {
            path: clip.path.clone(),
            contents,
            completion: Mutex::new(None),
            paused: AtomicBool::new(false),
            resets: AtomicUsize::new(0),
        });
        self.clips.lock().unwrap().push(Arc::clone(&state));
        Ok(Box::new(FakeElement(state)))
    }
}

struct FakeElement(Arc<FakeClip>);

impl AudioElement for FakeElement {
    fn play(&self) -> Result<PlaybackCompletion, AudioOutputError> {
        let (tx, rx) = oneshot::channel();
        *self.0.completion.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    fn pause(&self) -> bool {
        !self.0.paused.swap(true, Ordering::SeqCst)
    }

    fn resume(&self) -> bool {
        self.0.paused.swap(false, Ordering::SeqCst)
    }

    fn reset_position(&self) {
        self.0.resets.fetch_add(1, Ordering::SeqCst);
        self.0.completion.lock().unwrap().take();
    }
}

// ============================================================================
// Scripted backend
// ============================================================================

/// A backend that always declines or fails the same way.
pub struct ScriptedBackend {
    kind: BackendKind,
    result: Result<String, (FailureKind, String)>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn unsupported(kind: BackendKind, reason: &str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            result: Ok(reason.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(kind: BackendKind, failure: FailureKind, detail: &str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            result: Err((failure, detail.to_string())),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechBackend for ScriptedBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn try_synthesize_and_play(&self, _request: &SpeechRequest<'_>) -> BackendResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Ok(reason) => BackendResult::Unsupported(reason.clone()),
            Err((kind, detail)) => BackendResult::Failure(*kind, detail.clone()),
        }
    }
}
