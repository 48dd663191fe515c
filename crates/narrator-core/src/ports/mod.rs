//! Port definitions for host capabilities.
//!
//! # Design Rules
//!
//! - Ports describe what the host offers, not how a backend uses it.
//! - Implementations live in `narrator-voice` (or in tests); this crate never
//!   spawns processes or opens devices.

mod audio_output;
mod speech_engine;

pub use audio_output::{AudioClip, AudioElement, AudioOutput, PlaybackCompletion};
pub use speech_engine::{EngineEvent, EngineEvents, EngineVoice, SpeechEngine, Utterance};
