//! Subcommands and their shared backend options.

use clap::{Args, Subcommand};
use narrator_core::{DEFAULT_VOICE_ID, NarratorSettings};

#[derive(Subcommand)]
pub enum Commands {
    /// List the built-in voice profiles
    Voices {
        /// Print the profiles as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the fallback chain and engine voices for this host
    Backends {
        #[command(flatten)]
        backends: BackendArgs,
    },

    /// Speak text and wait until playback ends
    Speak {
        /// Text to speak
        text: String,
        /// Voice profile id (see `narrator voices`)
        #[arg(long, default_value = DEFAULT_VOICE_ID)]
        voice: String,
        #[command(flatten)]
        backends: BackendArgs,
    },

    /// Speak a voice's sample line
    Sample {
        /// Voice profile id
        voice: String,
        #[command(flatten)]
        backends: BackendArgs,
    },
}

/// Options narrowing which backends the fallback chain may use.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendArgs {
    /// Never call the remote synthesis service
    #[arg(long)]
    pub no_remote: bool,

    /// Never use the host speech engine
    #[arg(long)]
    pub no_engine: bool,

    /// Player command for remote audio (e.g. "ffplay -nodisp -autoexit")
    #[arg(long, value_name = "CMD")]
    pub player: Option<String>,
}

impl BackendArgs {
    /// Layer these options over settings read from the environment.
    #[must_use]
    pub fn apply(&self, mut settings: NarratorSettings) -> NarratorSettings {
        if self.no_remote {
            settings = settings.without_remote();
        }
        if self.no_engine {
            settings = settings.without_engine();
        }
        if let Some(player) = &self.player {
            settings = settings.with_audio_player(player.clone());
        }
        settings
    }
}
