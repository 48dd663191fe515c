//! CLI error type and exit codes.

use narrator_core::PlaybackError;
use narrator_voice::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Argument or input validation error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// The session could not be played.
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Playback started but broke off.
    #[error("Playback failed on {backend}: {reason}")]
    Interrupted { backend: String, reason: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Map error to an exit code (sysexits.h where one fits).
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Arguments(_) | Self::Playback(PlaybackError::InvalidInput) => 2,
            Self::Playback(PlaybackError::ChainExhausted { .. }) => 69, // EX_UNAVAILABLE
            Self::Interrupted { .. } => 1,
            Self::Config(_) => 78, // EX_CONFIG
            Self::Io(_) => 74,     // EX_IOERR
        }
    }
}

impl From<TransportError> for CliError {
    fn from(err: TransportError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
