//! CLI entry point.
//!
//! Loads `.env`, installs logging, then dispatches to handlers. Playback
//! commands are wired through `bootstrap`.

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use narrator_cli::{Cli, CliError, Commands, bootstrap, handlers};
use narrator_core::{NarratorSettings, VoiceProfileRegistry};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    let settings = NarratorSettings::from_env();

    match command {
        Commands::Voices { json } => {
            handlers::voices::execute(&VoiceProfileRegistry::builtin(), json, &mut stdout)?;
        }
        Commands::Backends { backends } => {
            let ctx = bootstrap(backends.apply(settings))?;
            handlers::backends::execute(&ctx, &mut stdout)?;
        }
        Commands::Speak {
            text,
            voice,
            backends,
        } => {
            let mut ctx = bootstrap(backends.apply(settings))?;
            handlers::speak::execute(&mut ctx, &text, &voice, &mut stdout).await?;
        }
        Commands::Sample { voice, backends } => {
            let mut ctx = bootstrap(backends.apply(settings))?;
            handlers::speak::sample(&mut ctx, &voice, &mut stdout).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        return match Cli::command().print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        };
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(e.downcast_ref::<CliError>().map_or(1, CliError::exit_code))
        }
    }
}
