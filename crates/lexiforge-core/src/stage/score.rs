//! Scoring stage: similarity per (prompt, artifact) pair, then run-global
//! normalization.
//!
//! This stage always executes - scores are recomputed every run while the
//! prompt and generation stages short-circuit through the cache. Scoring is
//! sequential per record; each call is pure given its inputs, so this is a
//! performance choice, not a correctness requirement.
//!
//! Normalization is linear rescaling to [0, 100] using the run's observed
//! minimum and maximum raw scores. When every raw score is equal the rescale
//! is undefined; the defined fallback is all-zero normalized scores plus a
//! warning.

use std::sync::Arc;

use crate::capability::SimilarityScorer;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{ImageMap, PromptMap, ScoreRecord, Vocabulary};

/// Run the scoring stage.
pub async fn run(
    vocab: &Vocabulary,
    prompts: &PromptMap,
    images: &ImageMap,
    scorer: Arc<dyn SimilarityScorer>,
) -> PipelineResult<Vec<ScoreRecord>> {
    let mut records = Vec::new();
    for entry in vocab {
        let prompt = prompts
            .get(&entry.word)
            .ok_or_else(|| PipelineError::scoring(&entry.word, "no prompt for entry"))?;
        let paths = images
            .get(&entry.word)
            .ok_or_else(|| PipelineError::scoring(&entry.word, "no artifacts for entry"))?;

        for path in paths {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| PipelineError::scoring(&entry.word, format!("{}: {e}", path.display())))?;
            let raw = scorer
                .score(prompt, &bytes)
                .await
                .map_err(|e| attribute(&entry.word, e))?;
            records.push(ScoreRecord {
                word: entry.word.clone(),
                image: path.clone(),
                raw,
                normalized: 0.0,
            });
        }
    }

    normalize_scores(&mut records);
    tracing::info!(count = records.len(), "scoring stage complete");
    Ok(records)
}

/// Rescale raw scores to [0, 100] in place using the run-global min/max.
///
/// All-equal raw scores leave every normalized score at 0.0 (logged).
pub fn normalize_scores(records: &mut [ScoreRecord]) {
    let Some(first) = records.first() else {
        return;
    };
    let mut min = first.raw;
    let mut max = first.raw;
    for record in records.iter() {
        min = min.min(record.raw);
        max = max.max(record.raw);
    }
    if max > min {
        let span = max - min;
        for record in records.iter_mut() {
            record.normalized = (record.raw - min) / span * 100.0;
        }
    } else {
        tracing::warn!(raw = min, "all raw scores equal; normalized scores set to 0");
        for record in records.iter_mut() {
            record.normalized = 0.0;
        }
    }
}

fn attribute(word: &str, err: PipelineError) -> PipelineError {
    match err {
        PipelineError::Scoring { message, .. } => PipelineError::scoring(word, message),
        PipelineError::ScorerNotLoaded => PipelineError::ScorerNotLoaded,
        other => PipelineError::scoring(word, other.to_string()),
    }
}
