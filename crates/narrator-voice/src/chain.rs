//! Ordered fallback across speech backends.
//!
//! The chain is built once per process from capability checks:
//!
//! ```text
//!   [Remote if a credential is configured] → [Engine if the host has one] → Simulated
//! ```
//!
//! Each backend is tried once, in order, with no retry. The first success
//! short-circuits; if all of them decline or fail the caller gets the full
//! attempt log.

use std::sync::Arc;

use narrator_core::{
    AttemptReason, AudioOutput, BackendAttempt, BackendKind, NarratorSettings, SessionToken,
    SpeechEngine,
};

use crate::backend::{
    BackendResult, EngineBackend, Playback, RemoteBackend, SimulatedBackend, SpeechBackend,
    SpeechRequest,
};
use crate::error::TransportError;
use crate::transport::ReqwestTransport;

// ── Host capabilities ──────────────────────────────────────────────

/// What the host offers to the backends.
#[derive(Clone, Default)]
pub struct HostCapabilities {
    pub engine: Option<Arc<dyn SpeechEngine>>,
    pub audio_output: Option<Arc<dyn AudioOutput>>,
}

impl HostCapabilities {
    /// Nothing available: only simulated playback will work.
    pub fn none() -> Self {
        Self::default()
    }

    /// Probe the host for a speech engine and an audio player.
    pub fn detect(settings: &NarratorSettings) -> Self {
        let engine = if settings.disable_engine {
            None
        } else {
            crate::espeak::EspeakEngine::detect(&settings.language)
                .map(|engine| Arc::new(engine) as Arc<dyn SpeechEngine>)
        };

        let audio_output = detect_audio_output(settings);

        tracing::debug!(
            engine = engine.as_ref().map(|e| e.name().to_string()),
            audio_output = audio_output.as_ref().map(|o| o.name().to_string()),
            "Detected host capabilities"
        );
        Self {
            engine,
            audio_output,
        }
    }

    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn SpeechEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    #[must_use]
    pub fn with_audio_output(mut self, output: Arc<dyn AudioOutput>) -> Self {
        self.audio_output = Some(output);
        self
    }
}

#[cfg(feature = "rodio")]
fn detect_audio_output(settings: &NarratorSettings) -> Option<Arc<dyn AudioOutput>> {
    if settings.audio_player.is_none() {
        match crate::playback::RodioAudioOutput::new() {
            Ok(output) => return Some(Arc::new(output)),
            Err(e) => tracing::warn!(error = %e, "No rodio output device, trying player binaries"),
        }
    }
    crate::player::ProcessAudioOutput::detect(settings.audio_player.as_deref())
        .map(|output| Arc::new(output) as Arc<dyn AudioOutput>)
}

#[cfg(not(feature = "rodio"))]
fn detect_audio_output(settings: &NarratorSettings) -> Option<Arc<dyn AudioOutput>> {
    crate::player::ProcessAudioOutput::detect(settings.audio_player.as_deref())
        .map(|output| Arc::new(output) as Arc<dyn AudioOutput>)
}

// ── Chain ──────────────────────────────────────────────────────────

pub struct FallbackChain {
    backends: Vec<Arc<dyn SpeechBackend>>,
}

impl FallbackChain {
    /// A chain trying `backends` in the given order.
    pub fn new(backends: Vec<Arc<dyn SpeechBackend>>) -> Self {
        Self { backends }
    }

    /// Build the standard chain from settings and host capabilities.
    pub fn from_settings(
        settings: &NarratorSettings,
        host: &HostCapabilities,
    ) -> Result<Self, TransportError> {
        let mut backends: Vec<Arc<dyn SpeechBackend>> = Vec::with_capacity(3);

        let remote_token = if settings.disable_remote || !settings.has_remote_credential() {
            None
        } else {
            settings.api_token.as_deref()
        };

        if let Some(token) = remote_token {
            match &host.audio_output {
                Some(output) => {
                    let transport =
                        ReqwestTransport::new(settings.remote_endpoint.clone(), token)?;
                    backends.push(Arc::new(RemoteBackend::new(
                        Arc::new(transport),
                        Arc::clone(output),
                        settings,
                    )));
                }
                None => tracing::warn!("Remote synthesis configured but no audio output found, skipping"),
            }
        }

        if !settings.disable_engine {
            if let Some(engine) = &host.engine {
                backends.push(Arc::new(EngineBackend::new(
                    Some(Arc::clone(engine)),
                    settings.voice_ready_timeout,
                )));
            }
        }

        backends.push(Arc::new(SimulatedBackend));

        let chain = Self::new(backends);
        tracing::info!(backends = ?chain.describe(), "Speech fallback chain ready");
        Ok(chain)
    }

    /// Backend kinds in the order they are tried.
    pub fn describe(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    /// Try each backend once. `on_skip` sees every declined or failed
    /// attempt as it happens.
    pub async fn run<F>(
        &self,
        request: &SpeechRequest<'_>,
        mut on_skip: F,
    ) -> Result<Playback, Vec<BackendAttempt>>
    where
        F: FnMut(&BackendAttempt) + Send,
    {
        let mut attempts = Vec::with_capacity(self.backends.len());

        for backend in &self.backends {
            let kind = backend.kind();
            tracing::debug!(token = %request.token, backend = %kind, "Trying speech backend");

            let reason = match backend.try_synthesize_and_play(request).await {
                BackendResult::Success(playback) => {
                    tracing::info!(token = %request.token, backend = %kind, "Speech backend started playback");
                    return Ok(playback);
                }
                BackendResult::Unsupported(reason) => AttemptReason::Unsupported { reason },
                BackendResult::Failure(failure, detail) => AttemptReason::Failure {
                    kind: failure,
                    detail,
                },
            };

            tracing::warn!(token = %request.token, backend = %kind, %reason, "Speech backend failed, falling through");
            let attempt = BackendAttempt {
                backend: kind,
                reason,
            };
            on_skip(&attempt);
            attempts.push(attempt);
        }

        Err(attempts)
    }

    /// Silence anything a backend started for `token` during an attempt
    /// that has not finished.
    pub fn silence(&self, token: SessionToken) {
        for backend in &self.backends {
            backend.silence(token);
        }
    }
}
