//! Validate command: check config and vocabulary without running.

use std::path::PathBuf;

use clap::Args;
use tracing::{error, info};

use lexiforge_core::{load_vocabulary, PipelineConfig};

use crate::exit::{exit_code_for_error, EXIT_SUCCESS};

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the TOML config file
    #[arg(long, short)]
    pub config: PathBuf,
}

/// Load and validate the config and vocabulary source. No external calls.
pub async fn handle_validate(args: ValidateArgs) -> i32 {
    let config = match PipelineConfig::from_file(&args.config).and_then(|c| {
        c.validate()?;
        Ok(c)
    }) {
        Ok(config) => config,
        Err(e) => {
            error!("invalid config: {e}");
            return exit_code_for_error(&e);
        }
    };

    match load_vocabulary(&config.paths.vocab) {
        Ok(vocab) => {
            info!(
                entries = vocab.len(),
                backend = %config.generation.backend,
                "config and vocabulary are valid"
            );
            println!("ok: {} vocabulary entries", vocab.len());
            EXIT_SUCCESS
        }
        Err(e) => {
            error!("invalid vocabulary: {e}");
            exit_code_for_error(&e)
        }
    }
}
