//! Error types internal to the voice adapters.
//!
//! Adapter errors never reach `play` callers directly; the remote backend
//! maps them onto `FailureKind` at the chain boundary.

use thiserror::Error;

/// Errors raised by a [`SynthesisTransport`](crate::transport::SynthesisTransport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The transport could not be configured.
    #[error("HTTP client error: {0}")]
    Client(String),
}
