#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod backend;
pub mod chain;
pub mod controller;
pub mod error;
pub mod espeak;
#[cfg(feature = "rodio")]
pub mod playback;
pub mod player;
mod process;
pub mod transport;

// Re-export key types for convenience
pub use backend::{
    ActivePlayback, BackendResult, EngineBackend, Playback, PlaybackEnd, RemoteBackend,
    SimulatedBackend, SpeechBackend, SpeechRequest,
};
pub use chain::{FallbackChain, HostCapabilities};
pub use controller::{PlaybackFuture, SessionController};
pub use error::TransportError;
pub use espeak::EspeakEngine;
#[cfg(feature = "rodio")]
pub use playback::RodioAudioOutput;
pub use player::ProcessAudioOutput;
pub use transport::{
    RemoteSynthesisRequest, ReqwestTransport, SynthesisParameters, SynthesisTransport,
    TransportResponse,
};

// Silence unused dev-dependency warnings
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio_test as _;
