//! Narrator configuration.
//!
//! Settings are resolved once at startup, either from the environment with
//! [`NarratorSettings::from_env`] or with the builder methods.
//!
//! # Example
//!
//! ```
//! use narrator_core::NarratorSettings;
//! use std::time::Duration;
//!
//! let settings = NarratorSettings::new()
//!     .with_api_token("hf_xxx")
//!     .with_request_timeout(Duration::from_secs(10));
//! assert!(settings.has_remote_credential());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Remote neural synthesis endpoint used when none is configured.
pub const DEFAULT_REMOTE_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/coqui/XTTS-v2";

/// Language sent to the remote synthesizer.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Upper bound on one remote synthesis call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on waiting for the host engine to publish its voices.
pub const DEFAULT_VOICE_READY_TIMEOUT: Duration = Duration::from_millis(3000);

const ENV_TOKEN: &str = "NARRATOR_TTS_TOKEN";
const ENV_TOKEN_FALLBACK: &str = "HUGGINGFACE_API_KEY";
const ENV_ENDPOINT: &str = "NARRATOR_TTS_URL";
const ENV_LANGUAGE: &str = "NARRATOR_LANGUAGE";
const ENV_AUDIO_PLAYER: &str = "NARRATOR_AUDIO_PLAYER";

/// Sampling parameters forwarded to the remote synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub length_penalty: f32,
    pub repetition_penalty: f32,
    pub top_k: u32,
    pub top_p: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            length_penalty: 1.0,
            repetition_penalty: 1.1,
            top_k: 50,
            top_p: 0.8,
        }
    }
}

/// Configuration shared by the fallback chain and its backends.
#[derive(Debug, Clone, PartialEq)]
pub struct NarratorSettings {
    /// Remote synthesis endpoint.
    pub remote_endpoint: String,
    /// Bearer credential. The remote backend is only enabled when set.
    pub api_token: Option<String>,
    /// Remote call timeout.
    pub request_timeout: Duration,
    /// Engine voice-list readiness timeout.
    pub voice_ready_timeout: Duration,
    pub language: String,
    pub sampling: SamplingParams,
    /// Leave the remote backend out of the chain even with a credential.
    pub disable_remote: bool,
    /// Leave the host engine out of the chain.
    pub disable_engine: bool,
    /// Command line used to play remote audio (e.g. `"ffplay -nodisp -autoexit"`).
    pub audio_player: Option<String>,
}

impl Default for NarratorSettings {
    fn default() -> Self {
        Self {
            remote_endpoint: DEFAULT_REMOTE_ENDPOINT.to_string(),
            api_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            voice_ready_timeout: DEFAULT_VOICE_READY_TIMEOUT,
            language: DEFAULT_LANGUAGE.to_string(),
            sampling: SamplingParams::default(),
            disable_remote: false,
            disable_engine: false,
            audio_player: None,
        }
    }
}

impl NarratorSettings {
    /// Create settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut settings = Self::default();
        settings.api_token = get(ENV_TOKEN).or_else(|| get(ENV_TOKEN_FALLBACK));
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            settings.remote_endpoint = endpoint;
        }
        if let Some(language) = get(ENV_LANGUAGE) {
            settings.language = language;
        }
        settings.audio_player = get(ENV_AUDIO_PLAYER);
        settings
    }

    /// Whether the remote backend has a credential to work with.
    pub fn has_remote_credential(&self) -> bool {
        self.api_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_remote_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.remote_endpoint = endpoint.into();
        self
    }

    /// Set the remote call timeout.
    ///
    /// Defaults to 30 seconds.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set how long the engine backend waits for the host voice list.
    ///
    /// Defaults to 3 seconds.
    #[must_use]
    pub const fn with_voice_ready_timeout(mut self, timeout: Duration) -> Self {
        self.voice_ready_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub const fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    #[must_use]
    pub const fn without_remote(mut self) -> Self {
        self.disable_remote = true;
        self
    }

    #[must_use]
    pub const fn without_engine(mut self) -> Self {
        self.disable_engine = true;
        self
    }

    #[must_use]
    pub fn with_audio_player(mut self, command: impl Into<String>) -> Self {
        self.audio_player = Some(command.into());
        self
    }
}
