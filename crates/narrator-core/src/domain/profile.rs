//! Voice profiles: the personas a caller can ask for by id.

use serde::{Deserialize, Serialize};

/// A voice persona and the synthesis parameters used to render it.
///
/// `rate`, `pitch` and `volume` are normalised around `1.0` the way host
/// speech engines usually expose them; each backend maps them onto its own
/// scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceProfile {
    /// Stable identifier (e.g. `"morgan_freeman"`).
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Speaking rate multiplier.
    pub rate: f32,
    /// Pitch multiplier.
    pub pitch: f32,
    /// Volume in `0.0..=1.0`.
    pub volume: f32,
    /// Host engine voice names to try, most preferred first. Matched as
    /// case-insensitive substrings.
    pub preferred_engine_voice_names: Vec<String>,
    /// Opaque reference sample handed to the remote synthesizer.
    pub remote_reference: Option<String>,
    /// Short persona description.
    pub description: String,
    /// Tagline suited to demo playback.
    pub sample_line: String,
    /// Description of the remote reference sample.
    pub remote_description: Option<String>,
}

impl VoiceProfile {
    /// Create a profile with neutral synthesis parameters.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            preferred_engine_voice_names: Vec::new(),
            remote_reference: None,
            description: String::new(),
            sample_line: String::new(),
            remote_description: None,
        }
    }

    #[must_use]
    pub const fn with_prosody(mut self, rate: f32, pitch: f32, volume: f32) -> Self {
        self.rate = rate;
        self.pitch = pitch;
        self.volume = volume;
        self
    }

    #[must_use]
    pub fn with_preferred_voices<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_engine_voice_names = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_remote_reference(
        mut self,
        reference: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.remote_reference = Some(reference.into());
        self.remote_description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_description(
        mut self,
        description: impl Into<String>,
        sample_line: impl Into<String>,
    ) -> Self {
        self.description = description.into();
        self.sample_line = sample_line.into();
        self
    }
}
