//! Root CLI parser and global options.

use clap::Parser;

use crate::commands::Commands;

/// Speak text through the best speech backend this host offers.
#[derive(Parser)]
#[command(name = "narrator")]
#[command(about = "Speak text in a choice of narrator voices")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
