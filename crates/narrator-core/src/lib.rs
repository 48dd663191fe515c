#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod error;
pub mod ports;
pub mod registry;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    BackendKind, PlaybackOutcome, PlaybackSession, PlaybackStatus, SessionEvent, SessionState,
    SessionToken, VoiceProfile,
};
pub use error::{
    AttemptReason, AudioOutputError, BackendAttempt, EngineError, FailureKind, PlaybackError,
    RegistryError,
};
pub use ports::{
    AudioClip, AudioElement, AudioOutput, EngineEvent, EngineEvents, EngineVoice,
    PlaybackCompletion, SpeechEngine, Utterance,
};
pub use registry::{DEFAULT_VOICE_ID, VoiceProfileRegistry};
pub use settings::{
    DEFAULT_LANGUAGE, DEFAULT_REMOTE_ENDPOINT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_VOICE_READY_TIMEOUT,
    NarratorSettings, SamplingParams,
};
