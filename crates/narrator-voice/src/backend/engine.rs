//! Host speech engine backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use narrator_core::{
    BackendKind, EngineEvent, EngineEvents, EngineVoice, FailureKind, SessionToken, SpeechEngine,
    Utterance,
};
use tokio::sync::OnceCell;

use super::{ActivePlayback, BackendResult, EnginePlayback, Playback, PlaybackEnd, SpeechBackend, SpeechRequest};

/// Speaks through the host [`SpeechEngine`], if there is one.
pub struct EngineBackend {
    engine: Option<Arc<dyn SpeechEngine>>,
    ready_timeout: Duration,
    /// Settles once the voice list has been published or the wait timed out.
    /// Shared by every attempt so the wait happens at most once.
    voices_ready: OnceCell<()>,
}

impl EngineBackend {
    pub fn new(engine: Option<Arc<dyn SpeechEngine>>, ready_timeout: Duration) -> Self {
        Self {
            engine,
            ready_timeout,
            voices_ready: OnceCell::new(),
        }
    }

    async fn wait_for_voices(&self, engine: &dyn SpeechEngine) {
        self.voices_ready
            .get_or_init(|| async {
                if tokio::time::timeout(self.ready_timeout, engine.voices_changed())
                    .await
                    .is_err()
                {
                    tracing::debug!(
                        engine = engine.name(),
                        timeout = ?self.ready_timeout,
                        "Engine voices not published in time, continuing"
                    );
                }
            })
            .await;
    }
}

/// Pick the engine voice for a profile: the first preferred name (in
/// priority order) that is a case-insensitive substring of an installed
/// voice name, otherwise the first installed voice.
pub fn select_engine_voice<'a>(
    voices: &'a [EngineVoice],
    preferred_names: &[String],
) -> Option<&'a EngineVoice> {
    preferred_names
        .iter()
        .map(|name| name.to_lowercase())
        .find_map(|wanted| {
            voices
                .iter()
                .find(|voice| voice.name.to_lowercase().contains(&wanted))
        })
        .or_else(|| voices.first())
}

#[async_trait]
impl SpeechBackend for EngineBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Engine
    }

    async fn try_synthesize_and_play(&self, request: &SpeechRequest<'_>) -> BackendResult {
        let Some(engine) = self.engine.as_ref() else {
            return BackendResult::Unsupported("no speech engine on this host".to_string());
        };

        let mut voices = engine.list_voices();
        if voices.is_empty() {
            self.wait_for_voices(engine.as_ref()).await;
            voices = engine.list_voices();
        }

        let profile = request.profile;
        let voice = select_engine_voice(&voices, &profile.preferred_engine_voice_names).cloned();
        if voice.is_none() && engine.requires_explicit_voice() {
            return BackendResult::Unsupported(format!(
                "{} has no voices installed",
                engine.name()
            ));
        }
        tracing::debug!(
            token = %request.token,
            engine = engine.name(),
            voice = voice.as_ref().map_or("<engine default>", |v| v.name.as_str()),
            "Selected engine voice"
        );

        let utterance = Utterance {
            id: request.token,
            text: request.text.to_string(),
            voice,
            rate: profile.rate,
            pitch: profile.pitch,
            volume: profile.volume,
        };

        let mut events = match engine.speak(utterance).await {
            Ok(events) => events,
            Err(e) => return BackendResult::Failure(FailureKind::EngineError, e.to_string()),
        };

        let finished_early = match events.recv().await {
            Some(EngineEvent::Started) => false,
            Some(EngineEvent::Finished) => true,
            Some(EngineEvent::Error(message)) => {
                engine.cancel(request.token);
                return BackendResult::Failure(FailureKind::EngineError, message);
            }
            None => {
                return BackendResult::Failure(
                    FailureKind::EngineError,
                    "utterance ended before it started".to_string(),
                );
            }
        };

        let resource = ActivePlayback::Engine(EnginePlayback::new(Arc::clone(engine), request.token));
        let finished = if finished_early {
            futures_util::future::ready(PlaybackEnd::Finished).boxed()
        } else {
            wait_for_end(events).boxed()
        };
        BackendResult::Success(Playback::new(resource, finished))
    }

    fn silence(&self, token: SessionToken) {
        if let Some(engine) = &self.engine {
            engine.cancel(token);
        }
    }
}

async fn wait_for_end(mut events: EngineEvents) -> PlaybackEnd {
    loop {
        match events.recv().await {
            Some(EngineEvent::Started) => {}
            Some(EngineEvent::Finished) => return PlaybackEnd::Finished,
            Some(EngineEvent::Error(message)) => return PlaybackEnd::Errored(message),
            None => return PlaybackEnd::Errored("utterance cancelled".to_string()),
        }
    }
}
