//! Timer-based stand-in used when no real synthesis is available.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use narrator_core::BackendKind;

use super::{ActivePlayback, BackendResult, Playback, PlaybackEnd, SimulatedPlayback, SpeechBackend, SpeechRequest};

const MILLIS_PER_CHAR: u64 = 50;
const MAX_DURATION: Duration = Duration::from_secs(10);

/// How long simulated playback of `text` lasts: 50 ms per character, capped
/// at 10 s.
pub fn simulated_duration(text: &str) -> Duration {
    let chars = u64::try_from(text.chars().count()).unwrap_or(u64::MAX);
    Duration::from_millis(chars.saturating_mul(MILLIS_PER_CHAR)).min(MAX_DURATION)
}

/// Always succeeds. Terminal entry of every fallback chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedBackend;

#[async_trait]
impl SpeechBackend for SimulatedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Simulated
    }

    async fn try_synthesize_and_play(&self, request: &SpeechRequest<'_>) -> BackendResult {
        let duration = simulated_duration(request.text);
        tracing::debug!(token = %request.token, ?duration, "Simulating playback");

        let timer = tokio::spawn(tokio::time::sleep(duration));
        let resource = ActivePlayback::Simulated(SimulatedPlayback::new(timer.abort_handle()));
        let finished = async move {
            match timer.await {
                Ok(()) => PlaybackEnd::Finished,
                Err(e) => PlaybackEnd::Errored(e.to_string()),
            }
        }
        .boxed();

        BackendResult::Success(Playback::new(resource, finished))
    }
}
