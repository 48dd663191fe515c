//! CLI bootstrap - the composition root.
//!
//! The only place where concrete adapters are wired together: host
//! capability probing (espeak-ng, audio players), the remote transport, the
//! fallback chain and the session controller.

use narrator_core::{NarratorSettings, SessionEvent, VoiceProfileRegistry};
use narrator_voice::{FallbackChain, HostCapabilities, SessionController};
use tokio::sync::mpsc;

use crate::error::CliError;

/// Fully composed context for the playback commands.
pub struct CliContext {
    pub settings: NarratorSettings,
    pub host: HostCapabilities,
    pub controller: SessionController,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

/// Probe the host and compose a context from `settings`.
pub fn bootstrap(settings: NarratorSettings) -> Result<CliContext, CliError> {
    let host = HostCapabilities::detect(&settings);
    compose(settings, host)
}

/// Compose a context over already-known host capabilities.
pub fn compose(settings: NarratorSettings, host: HostCapabilities) -> Result<CliContext, CliError> {
    let chain = FallbackChain::from_settings(&settings, &host)?;
    let (controller, events) = SessionController::new(VoiceProfileRegistry::builtin(), chain);
    Ok(CliContext {
        settings,
        host,
        controller,
        events,
    })
}
