//! `narrator backends`: show what this host can speak with.

use std::io::Write;

use anyhow::Result;

use crate::bootstrap::CliContext;

/// Engine voices listed before the rest are summarized.
const MAX_LISTED_VOICES: usize = 10;

pub fn execute(ctx: &CliContext, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Fallback chain:")?;
    for (position, backend) in ctx.controller.backends().iter().enumerate() {
        writeln!(out, "  {}. {backend}", position + 1)?;
    }

    let remote = if ctx.settings.has_remote_credential() {
        ctx.settings.remote_endpoint.as_str()
    } else {
        "no API token configured"
    };
    writeln!(out, "\nRemote endpoint: {remote}")?;

    match &ctx.host.audio_output {
        Some(output) => writeln!(out, "Audio output:    {}", output.name())?,
        None => writeln!(out, "Audio output:    none found")?,
    }

    let Some(engine) = &ctx.host.engine else {
        writeln!(out, "Speech engine:   none found")?;
        return Ok(());
    };
    let voices = engine.list_voices();
    writeln!(out, "Speech engine:   {} ({} voices)", engine.name(), voices.len())?;
    for voice in voices.iter().take(MAX_LISTED_VOICES) {
        match &voice.language {
            Some(language) => writeln!(out, "  {:<32} {language}", voice.name)?,
            None => writeln!(out, "  {}", voice.name)?,
        }
    }
    if voices.len() > MAX_LISTED_VOICES {
        writeln!(out, "  ... and {} more", voices.len() - MAX_LISTED_VOICES)?;
    }
    Ok(())
}
