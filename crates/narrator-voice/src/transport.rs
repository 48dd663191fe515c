//! Transport for the remote neural synthesis service.
//!
//! The remote backend talks to the service through [`SynthesisTransport`] so
//! tests can substitute canned responses. [`ReqwestTransport`] is the
//! production implementation.

use std::time::Duration;

use async_trait::async_trait;
use narrator_core::SamplingParams;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;

use crate::error::TransportError;

// ============================================================================
// Wire types
// ============================================================================

/// Request body posted to the synthesis endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteSynthesisRequest {
    pub inputs: String,
    pub parameters: SynthesisParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisParameters {
    /// Reference sample for voice cloning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_wav: Option<String>,
    pub language: String,
    pub temperature: f32,
    pub length_penalty: f32,
    pub repetition_penalty: f32,
    pub top_k: u32,
    pub top_p: f32,
}

impl RemoteSynthesisRequest {
    pub fn new(
        text: &str,
        speaker_wav: Option<&str>,
        language: &str,
        sampling: &SamplingParams,
    ) -> Self {
        Self {
            inputs: text.to_string(),
            parameters: SynthesisParameters {
                speaker_wav: speaker_wav.map(str::to_string),
                language: language.to_string(),
                temperature: sampling.temperature,
                length_penalty: sampling.length_penalty,
                repetition_penalty: sampling.repetition_penalty,
                top_k: sampling.top_k,
                top_p: sampling.top_p,
            },
        }
    }
}

/// Raw response from the synthesis endpoint, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

// ============================================================================
// Transport trait
// ============================================================================

#[async_trait]
pub trait SynthesisTransport: Send + Sync {
    /// Post `request` and return the response. Non-2xx statuses are returned
    /// as responses, not errors.
    async fn synthesize(
        &self,
        request: &RemoteSynthesisRequest,
    ) -> Result<TransportResponse, TransportError>;
}

// ============================================================================
// Reqwest transport
// ============================================================================

/// Connection bound only. The request deadline is enforced by the remote
/// backend.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts synthesis requests with a bearer credential.
pub struct ReqwestTransport {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl ReqwestTransport {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("narrator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SynthesisTransport for ReqwestTransport {
    async fn synthesize(
        &self,
        request: &RemoteSynthesisRequest,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header(ACCEPT, "audio/wav, audio/*, application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        tracing::debug!(status, bytes = body.len(), "Remote synthesis responded");
        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}
