//! Run command: execute the full pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::{error, info};

use lexiforge_backends::{resolve_image_backend, LlmPromptClient};
use lexiforge_core::{load_vocabulary, Pipeline, PipelineConfig, PipelineResult, RunSummary};
use lexiforge_scoring::ClipScorer;

use crate::exit::{exit_code_for_error, EXIT_SUCCESS};

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the TOML config file
    #[arg(long, short)]
    pub config: PathBuf,
}

/// Execute the pipeline. Setup errors (config, vocabulary, backend
/// resolution) surface before any external call is made.
pub async fn handle_run(args: RunArgs) -> i32 {
    match run_pipeline(&args.config).await {
        Ok(summary) => {
            info!(
                entries = summary.entries,
                records = summary.records,
                csv = %summary.csv_path.display(),
                "pipeline complete"
            );
            println!(
                "done: {} entries, {} score records -> {}",
                summary.entries,
                summary.records,
                summary.csv_path.display()
            );
            EXIT_SUCCESS
        }
        Err(e) => {
            error!("pipeline failed: {e}");
            exit_code_for_error(&e)
        }
    }
}

async fn run_pipeline(config_path: &PathBuf) -> PipelineResult<RunSummary> {
    let config = PipelineConfig::from_file(config_path)?;
    config.validate()?;
    let vocab = load_vocabulary(&config.paths.vocab)?;

    let prompter = Arc::new(LlmPromptClient::new(&config.llm)?);
    let generator = resolve_image_backend(&config.generation)?;
    let scorer = Arc::new(ClipScorer::new(&config.scoring.model_dir));

    info!(
        entries = vocab.len(),
        backend = %config.generation.backend,
        concurrency = config.generation.concurrency,
        "starting pipeline"
    );

    let pipeline = Pipeline::new(config, vocab, prompter, generator, scorer)?;
    pipeline.run().await
}
