//! Voice profile catalog.
//!
//! The registry is built once at startup and never mutated. Lookups are
//! total: an unknown id resolves to the default profile so a stale id from a
//! caller never fails a `play` request.

use std::collections::HashSet;

use crate::domain::VoiceProfile;
use crate::error::RegistryError;

/// Id of the default profile in the built-in catalog.
pub const DEFAULT_VOICE_ID: &str = "morgan_freeman";

/// Immutable, insertion-ordered set of voice profiles.
#[derive(Debug, Clone)]
pub struct VoiceProfileRegistry {
    profiles: Vec<VoiceProfile>,
    default_index: usize,
}

impl VoiceProfileRegistry {
    /// Build a registry from `profiles`, falling back to `default_id` for
    /// unknown lookups.
    pub fn new(profiles: Vec<VoiceProfile>, default_id: &str) -> Result<Self, RegistryError> {
        if profiles.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::with_capacity(profiles.len());
        for profile in &profiles {
            if !seen.insert(profile.id.as_str()) {
                return Err(RegistryError::DuplicateId(profile.id.clone()));
            }
        }

        let default_index = profiles
            .iter()
            .position(|p| p.id == default_id)
            .ok_or_else(|| RegistryError::UnknownDefault(default_id.to_string()))?;

        Ok(Self {
            profiles,
            default_index,
        })
    }

    /// The built-in celebrity-style catalog.
    pub fn builtin() -> Self {
        Self {
            profiles: builtin_profiles(),
            default_index: 0,
        }
    }

    /// All profiles in insertion order.
    pub fn list(&self) -> &[VoiceProfile] {
        &self.profiles
    }

    /// Resolve `id`, returning the default profile when it is unknown.
    pub fn lookup(&self, id: &str) -> &VoiceProfile {
        self.get(id).unwrap_or_else(|| {
            tracing::debug!(voice_id = %id, fallback = %self.default_profile().id, "Unknown voice id, using default");
            self.default_profile()
        })
    }

    /// Resolve `id` without falling back.
    pub fn get(&self, id: &str) -> Option<&VoiceProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn default_profile(&self) -> &VoiceProfile {
        &self.profiles[self.default_index]
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for VoiceProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn reference_sample(id: &str) -> String {
    format!("https://example.com/{id}_sample.wav")
}

fn builtin_profiles() -> Vec<VoiceProfile> {
    vec![
        VoiceProfile::new(DEFAULT_VOICE_ID, "Morgan Freeman")
            .with_prosody(0.8, 0.7, 1.0)
            .with_preferred_voices(["Microsoft David", "Google US English", "Daniel"])
            .with_description(
                "Smooth, authoritative voice",
                "The voice of wisdom and experience",
            )
            .with_remote_reference(
                reference_sample(DEFAULT_VOICE_ID),
                "Deep, authoritative voice with gravitas",
            ),
        VoiceProfile::new("david_attenborough", "David Attenborough")
            .with_prosody(0.9, 0.8, 1.0)
            .with_preferred_voices(["Microsoft George", "Google UK English Male", "Daniel"])
            .with_description(
                "Nature documentary narrator",
                "Perfect for nature and science news",
            )
            .with_remote_reference(
                reference_sample("david_attenborough"),
                "Clear, engaging nature documentary style",
            ),
        VoiceProfile::new("samuel_jackson", "Samuel L. Jackson")
            .with_prosody(1.0, 0.6, 1.0)
            .with_preferred_voices(["Microsoft David", "Google US English", "Aaron"])
            .with_description(
                "Powerful, commanding presence",
                "Dynamic delivery for breaking news",
            )
            .with_remote_reference(
                reference_sample("samuel_jackson"),
                "Powerful, commanding presence",
            ),
        VoiceProfile::new("emma_stone", "Emma Stone")
            .with_prosody(1.1, 1.2, 1.0)
            .with_preferred_voices(["Microsoft Zira", "Google US English Female", "Samantha"])
            .with_description("Clear, engaging voice", "Perfect for entertainment news")
            .with_remote_reference(
                reference_sample("emma_stone"),
                "Clear, warm female voice",
            ),
        VoiceProfile::new("benedict_cumberbatch", "Benedict Cumberbatch")
            .with_prosody(0.9, 0.9, 1.0)
            .with_preferred_voices(["Microsoft George", "Google UK English Male", "Daniel"])
            .with_description(
                "Sophisticated British accent",
                "Ideal for technology and business news",
            )
            .with_remote_reference(
                reference_sample("benedict_cumberbatch"),
                "Sophisticated British accent",
            ),
    ]
}
