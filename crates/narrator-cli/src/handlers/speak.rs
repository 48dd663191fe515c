//! `narrator speak` and `narrator sample`: play one session to the end.

use std::future::Future;
use std::io::Write;

use anyhow::Result;
use narrator_core::{PlaybackOutcome, SessionEvent};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Speak `text` until it finishes or the user presses Ctrl-C.
pub async fn execute(
    ctx: &mut CliContext,
    text: &str,
    voice_id: &str,
    out: &mut impl Write,
) -> Result<PlaybackOutcome> {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    run(ctx, text, voice_id, interrupt, out).await
}

/// Speak the sample line of `voice_id`.
pub async fn sample(
    ctx: &mut CliContext,
    voice_id: &str,
    out: &mut impl Write,
) -> Result<PlaybackOutcome> {
    let Some(profile) = ctx.controller.registry().get(voice_id) else {
        return Err(CliError::Arguments(format!(
            "unknown voice '{voice_id}' (see `narrator voices`)"
        ))
        .into());
    };
    let line = profile.sample_line.clone();
    writeln!(out, "{}: \"{line}\"", profile.display_name)?;
    execute(ctx, &line, voice_id, out).await
}

/// Play one session, reporting backend events, and stop it when
/// `interrupt` resolves.
pub async fn run<F>(
    ctx: &mut CliContext,
    text: &str,
    voice_id: &str,
    interrupt: F,
    out: &mut impl Write,
) -> Result<PlaybackOutcome>
where
    F: Future<Output = ()>,
{
    let registry = ctx.controller.registry();
    if !registry.contains(voice_id) {
        writeln!(
            out,
            "Unknown voice '{voice_id}', using {}",
            registry.default_profile().id
        )?;
    }

    let mut playing = ctx.controller.play(text, voice_id);
    tokio::pin!(interrupt);
    let mut interrupted = false;

    let result = loop {
        tokio::select! {
            result = &mut playing => break result,
            Some(event) = ctx.events.recv() => report(&event, &mut *out)?,
            () = &mut interrupt, if !interrupted => {
                interrupted = true;
                writeln!(out, "Stopping...")?;
                ctx.controller.stop();
            }
        }
    };
    while let Ok(event) = ctx.events.try_recv() {
        report(&event, &mut *out)?;
    }

    let outcome = result.map_err(CliError::from)?;
    match &outcome {
        PlaybackOutcome::Completed { backend } => writeln!(out, "Done ({backend})")?,
        PlaybackOutcome::Stopped => writeln!(out, "Stopped")?,
        PlaybackOutcome::Superseded => writeln!(out, "Superseded")?,
        PlaybackOutcome::Failed { backend, reason } => {
            return Err(CliError::Interrupted {
                backend: backend.to_string(),
                reason: reason.clone(),
            }
            .into());
        }
    }
    Ok(outcome)
}

fn report(event: &SessionEvent, out: &mut impl Write) -> Result<()> {
    match event {
        SessionEvent::BackendSkipped {
            backend, reason, ..
        } => writeln!(out, "  {backend} unavailable: {reason}")?,
        SessionEvent::BackendSelected { backend, .. } => {
            writeln!(out, "Speaking with {backend}")?;
        }
        SessionEvent::StateChanged { token, state } => {
            tracing::debug!(token = %token, ?state, "Session state changed");
        }
    }
    Ok(())
}
