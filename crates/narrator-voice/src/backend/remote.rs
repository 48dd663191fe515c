//! Remote neural synthesis backend.
//!
//! Posts the text to the synthesis service, spools the returned audio to a
//! temporary file, loads it into the host [`AudioOutput`] and starts it.
//! The spool file lives exactly as long as the session's
//! [`RemotePlayback`](super::RemotePlayback) resource.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use narrator_core::{
    AudioClip, AudioOutput, BackendKind, FailureKind, NarratorSettings, SamplingParams,
};
use serde_json::Value;
use tempfile::TempPath;

use super::{ActivePlayback, BackendResult, Playback, PlaybackEnd, RemotePlayback, SpeechBackend, SpeechRequest};
use crate::transport::{RemoteSynthesisRequest, SynthesisTransport, TransportResponse};

pub struct RemoteBackend {
    transport: Arc<dyn SynthesisTransport>,
    output: Arc<dyn AudioOutput>,
    language: String,
    sampling: SamplingParams,
    timeout: Duration,
}

impl RemoteBackend {
    pub fn new(
        transport: Arc<dyn SynthesisTransport>,
        output: Arc<dyn AudioOutput>,
        settings: &NarratorSettings,
    ) -> Self {
        Self {
            transport,
            output,
            language: settings.language.clone(),
            sampling: settings.sampling,
            timeout: settings.request_timeout,
        }
    }

    async fn fetch(&self, body: &RemoteSynthesisRequest) -> Result<TransportResponse, (FailureKind, String)> {
        match tokio::time::timeout(self.timeout, self.transport.synthesize(body)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err((FailureKind::Network, e.to_string())),
            Err(_) => Err((FailureKind::Network, "timeout".to_string())),
        }
    }

    fn start(&self, response: &TransportResponse) -> Result<Playback, String> {
        let spool = spool_audio(&response.body).map_err(|e| format!("failed to spool audio: {e}"))?;

        let mut clip = AudioClip::new(spool.to_path_buf());
        if let Some(mime) = &response.content_type {
            clip = clip.with_mime_type(mime.clone());
        }

        let element = self.output.load(&clip).map_err(|e| e.to_string())?;
        let completion = element.play().map_err(|e| e.to_string())?;

        let finished = async move {
            match completion.await {
                Ok(Ok(())) => PlaybackEnd::Finished,
                Ok(Err(e)) => PlaybackEnd::Errored(e.to_string()),
                Err(_) => PlaybackEnd::Errored("audio playback halted".to_string()),
            }
        }
        .boxed();

        let resource = ActivePlayback::Remote(RemotePlayback::new(element, spool));
        Ok(Playback::new(resource, finished))
    }
}

#[async_trait]
impl SpeechBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn try_synthesize_and_play(&self, request: &SpeechRequest<'_>) -> BackendResult {
        let body = RemoteSynthesisRequest::new(
            request.text,
            request.profile.remote_reference.as_deref(),
            &self.language,
            &self.sampling,
        );

        let response = match self.fetch(&body).await {
            Ok(response) => response,
            Err((kind, detail)) => return BackendResult::Failure(kind, detail),
        };

        if let Some((kind, detail)) = failure_from_response(&response) {
            return BackendResult::Failure(kind, detail);
        }

        tracing::debug!(
            token = %request.token,
            bytes = response.body.len(),
            output = self.output.name(),
            "Playing remote audio"
        );
        match self.start(&response) {
            Ok(playback) => BackendResult::Success(playback),
            Err(detail) => BackendResult::Failure(FailureKind::Unknown, detail),
        }
    }
}

fn spool_audio(bytes: &[u8]) -> io::Result<TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix("narrator-")
        .suffix(".wav")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file.into_temp_path())
}

/// Classify a synthesis response. `None` means the body is playable audio.
pub fn failure_from_response(response: &TransportResponse) -> Option<(FailureKind, String)> {
    let status = response.status;
    let service_error = parse_service_error(&response.body);

    if (200..300).contains(&status) {
        if response.body.is_empty() {
            return Some((FailureKind::Unknown, "empty audio payload".to_string()));
        }
        let is_json = response
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/json"));
        return match service_error {
            Some(error) if is_json => Some(error.into_failure(status)),
            _ => None,
        };
    }

    let failure = match (status, service_error) {
        (401, _) => (FailureKind::Unauthorized, "invalid API token".to_string()),
        (429, _) => (FailureKind::RateLimited, "rate limit exceeded".to_string()),
        (503, Some(error)) => error.into_failure(status),
        (503, None) => (FailureKind::ModelLoading, "model is loading".to_string()),
        (404, _) => (FailureKind::NotFound, "model not found".to_string()),
        (_, Some(error)) => error.into_failure(status),
        (_, None) => (FailureKind::Unknown, format!("HTTP {status}")),
    };
    Some(failure)
}

/// Error document returned by the synthesis service.
struct ServiceError {
    message: String,
    estimated_time: Option<f64>,
}

impl ServiceError {
    fn is_loading(&self) -> bool {
        self.message.to_lowercase().contains("loading") || self.estimated_time.is_some()
    }

    fn into_failure(self, status: u16) -> (FailureKind, String) {
        if status == 503 || self.is_loading() {
            let detail = self.estimated_time.map_or(self.message, |secs| {
                format!("estimated time {secs:.0}s")
            });
            return (FailureKind::ModelLoading, detail);
        }
        (FailureKind::Unknown, format!("HTTP {status}: {}", self.message))
    }
}

fn parse_service_error(body: &[u8]) -> Option<ServiceError> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let message = match value.get("error")? {
        Value::String(message) => message.clone(),
        Value::Array(messages) => messages
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    };
    let estimated_time = value.get("estimated_time").and_then(Value::as_f64);
    Some(ServiceError {
        message,
        estimated_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, content_type: Option<&str>, body: &[u8]) -> TransportResponse {
        TransportResponse {
            status,
            content_type: content_type.map(str::to_string),
            body: body.to_vec(),
        }
    }

    fn kind_of(status: u16, body: &[u8]) -> Option<FailureKind> {
        failure_from_response(&response(status, Some("application/json"), body)).map(|f| f.0)
    }

    #[test]
    fn audio_payload_is_playable() {
        assert!(failure_from_response(&response(200, Some("audio/wav"), b"RIFF....")).is_none());
        assert!(failure_from_response(&response(200, None, b"RIFF....")).is_none());
    }

    #[test]
    fn empty_payload_is_unknown_failure() {
        let failure = failure_from_response(&response(200, Some("audio/wav"), b"")).unwrap();
        assert_eq!(failure, (FailureKind::Unknown, "empty audio payload".to_string()));
    }

    #[test]
    fn maps_statuses() {
        assert_eq!(kind_of(401, b""), Some(FailureKind::Unauthorized));
        assert_eq!(kind_of(429, b""), Some(FailureKind::RateLimited));
        assert_eq!(kind_of(404, b""), Some(FailureKind::NotFound));
        assert_eq!(kind_of(503, b""), Some(FailureKind::ModelLoading));
        assert_eq!(kind_of(500, b"oops"), Some(FailureKind::Unknown));
    }

    #[test]
    fn loading_body_carries_estimated_time() {
        let body = br#"{"error":"Model coqui/XTTS-v2 is currently loading","estimated_time":20.4}"#;
        let failure = failure_from_response(&response(503, Some("application/json"), body)).unwrap();
        assert_eq!(failure, (FailureKind::ModelLoading, "estimated time 20s".to_string()));
    }

    #[test]
    fn loading_message_without_503_is_still_loading() {
        let body = br#"{"error":"Model is loading"}"#;
        assert_eq!(kind_of(500, body), Some(FailureKind::ModelLoading));
        assert_eq!(kind_of(200, body), Some(FailureKind::ModelLoading));
    }

    #[test]
    fn other_status_reports_code() {
        let failure = failure_from_response(&response(418, None, b"")).unwrap();
        assert_eq!(failure, (FailureKind::Unknown, "HTTP 418".to_string()));
    }
}
