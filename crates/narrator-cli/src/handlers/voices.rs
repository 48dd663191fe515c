//! `narrator voices`: list the voice profile catalog.

use std::io::Write;

use anyhow::Result;
use narrator_core::VoiceProfileRegistry;

pub fn execute(registry: &VoiceProfileRegistry, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, registry.list())?;
        writeln!(out)?;
        return Ok(());
    }

    let default_id = &registry.default_profile().id;
    writeln!(out, "{:<22} {:<22} Description", "ID", "Name")?;
    for profile in registry.list() {
        let marker = if &profile.id == default_id { " *" } else { "" };
        writeln!(
            out,
            "{:<22} {:<22} {}",
            format!("{}{marker}", profile.id),
            profile.display_name,
            profile.description
        )?;
    }
    writeln!(out, "\n* default voice")?;
    Ok(())
}
