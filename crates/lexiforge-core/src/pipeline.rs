//! Pipeline orchestrator.
//!
//! Owns the validated configuration, the vocabulary, the stage cache, and
//! the three external capabilities. Stages run strictly in order - prompt,
//! then generation, then scoring - with no overlap; any stage failure is
//! fatal to the run. Resume across invocations comes only from the stage
//! cache.

use std::sync::Arc;

use crate::capability::{ImageGenerator, PromptGenerator, SimilarityScorer};
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::export;
use crate::stage;
use crate::types::Vocabulary;
use crate::StageCache;

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Vocabulary entries processed.
    pub entries: usize,
    /// Score records exported (`n_images * entries` when nothing is cached
    /// from a run with different settings).
    pub records: usize,
    /// Path of the CSV export.
    pub csv_path: std::path::PathBuf,
}

/// Sequences the three stages and performs the final export.
pub struct Pipeline {
    config: PipelineConfig,
    vocab: Vocabulary,
    cache: StageCache,
    prompter: Arc<dyn PromptGenerator>,
    generator: Arc<dyn ImageGenerator>,
    scorer: Arc<dyn SimilarityScorer>,
}

impl Pipeline {
    /// Assemble a pipeline. Creates the output and cache directories; the
    /// cache directory is owned exclusively by this run.
    pub fn new(
        config: PipelineConfig,
        vocab: Vocabulary,
        prompter: Arc<dyn PromptGenerator>,
        generator: Arc<dyn ImageGenerator>,
        scorer: Arc<dyn SimilarityScorer>,
    ) -> PipelineResult<Self> {
        std::fs::create_dir_all(&config.paths.output_dir)?;
        let cache = StageCache::new(&config.paths.cache_dir)?;
        Ok(Self {
            config,
            vocab,
            cache,
            prompter,
            generator,
            scorer,
        })
    }

    /// Execute prompt -> generation -> scoring -> export.
    ///
    /// The scorer is loaded eagerly after the generation stage completes and
    /// released after scoring, so model-load latency is paid at a defined
    /// point instead of inside the first score call.
    pub async fn run(&self) -> PipelineResult<RunSummary> {
        let prompts =
            stage::prompt::run(&self.vocab, Arc::clone(&self.prompter), &self.cache).await?;

        let images = stage::generate::run(
            &self.vocab,
            &prompts,
            Arc::clone(&self.generator),
            &self.cache,
            &self.config.images_dir(),
            self.config.generation.concurrency,
        )
        .await?;

        self.scorer.load().await?;
        let score_result =
            stage::score::run(&self.vocab, &prompts, &images, Arc::clone(&self.scorer)).await;
        if let Err(e) = self.scorer.release().await {
            tracing::warn!(error = %e, "scorer release failed");
        }
        let records = score_result?;

        export::write_score_table(&records, &self.config.paths.output_dir)?;
        let csv_path = export::write_csv_export(&records, &self.config.paths.output_dir)?;

        Ok(RunSummary {
            entries: self.vocab.len(),
            records: records.len(),
            csv_path,
        })
    }
}
