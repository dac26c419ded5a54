//! Lexiforge CLI
//!
//! # Commands
//!
//! - `run`: execute the full pipeline against a config file
//! - `validate`: check a config file and its vocabulary source, making no
//!   external calls
//!
//! Configuration and vocabulary errors exit with code 2 and are reported
//! before any external call is made; other pipeline failures exit 1.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod exit;

/// Lexiforge - vocabulary-to-image dataset pipeline
#[derive(Parser)]
#[command(name = "lexiforge")]
#[command(version = "0.1.0")]
#[command(about = "Turn a vocabulary list into a labeled image-prompt-score dataset")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline against a config file
    Run(commands::run::RunArgs),
    /// Validate a config file and its vocabulary source without running
    Validate(commands::validate::ValidateArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Run(args) => commands::run::handle_run(args).await,
        Commands::Validate(args) => commands::validate::handle_validate(args).await,
    };

    std::process::exit(exit_code);
}
