//! Generation stage: N image artifacts per prompt, bounded fan-out.
//!
//! Cache key `"images"`. On a hit the stage returns the cached word-to-paths
//! mapping and performs no generation calls or disk writes. On a miss, one
//! task per entry is spawned behind a shared [`Semaphore`] with `concurrency`
//! permits, so at most that many generation calls are outstanding at any
//! moment, globally across the stage invocation. Each completed call's byte
//! buffers are written to `{word}_{index}.png` under the images directory.
//!
//! Failure policy: the first failure fails the entire stage and no cache
//! entry is published. Artifacts already written by completed siblings stay
//! on disk; filenames are deterministic, so the next run overwrites them.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::capability::ImageGenerator;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{ImageMap, PromptMap, Vocabulary};
use crate::StageCache;

/// Cache key for this stage.
pub const STAGE_NAME: &str = "images";

/// Run the generation stage.
pub async fn run(
    vocab: &Vocabulary,
    prompts: &PromptMap,
    generator: Arc<dyn ImageGenerator>,
    cache: &StageCache,
    images_dir: &Path,
    concurrency: usize,
) -> PipelineResult<ImageMap> {
    if let Some(cached) = super::consult_cache::<ImageMap>(cache, STAGE_NAME)? {
        return Ok(cached);
    }

    // Key-completeness invariant: every entry must already have a prompt.
    let mut work = Vec::with_capacity(vocab.len());
    for entry in vocab {
        let prompt = prompts
            .get(&entry.word)
            .ok_or_else(|| PipelineError::generation(&entry.word, "no prompt for entry"))?;
        work.push((entry.word.clone(), prompt.clone()));
    }

    tokio::fs::create_dir_all(images_dir).await?;

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let completed = Arc::new(AtomicUsize::new(0));
    let total = work.len();

    let mut handles = Vec::with_capacity(total);
    for (word, prompt) in work {
        let generator = Arc::clone(&generator);
        let semaphore = Arc::clone(&semaphore);
        let completed = Arc::clone(&completed);
        let images_dir = images_dir.to_path_buf();
        handles.push(tokio::spawn(async move {
            // Permit is held until this entry's artifacts are on disk.
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::generation(&word, e.to_string()))?;

            let buffers = generator
                .generate(&prompt)
                .await
                .map_err(|e| attribute(&word, e))?;

            let mut paths = Vec::with_capacity(buffers.len());
            for (index, bytes) in buffers.iter().enumerate() {
                let path = images_dir.join(format!("{word}_{index}.png"));
                tokio::fs::write(&path, bytes)
                    .await
                    .map_err(|e| PipelineError::generation(&word, e.to_string()))?;
                paths.push(path);
            }

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::info!(word = %word, done, total, "entry generated");
            Ok::<(String, Vec<PathBuf>), PipelineError>((word, paths))
        }));
    }

    // Await everything before deciding the outcome, so a failed run leaves no
    // task still writing in the background; the first error in vocabulary
    // order wins.
    let mut images = ImageMap::new();
    let mut first_error = None;
    for handle in handles {
        match handle.await {
            Ok(Ok((word, paths))) => {
                images.insert(word, paths);
            }
            Ok(Err(e)) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            Err(join_err) => {
                if first_error.is_none() {
                    first_error =
                        Some(PipelineError::generation("generation task", join_err.to_string()));
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    cache.save(STAGE_NAME, &images)?;
    tracing::info!(count = images.len(), "generation stage complete");
    Ok(images)
}

fn attribute(word: &str, err: PipelineError) -> PipelineError {
    match err {
        PipelineError::Generation { message, .. } => PipelineError::generation(word, message),
        other => PipelineError::generation(word, other.to_string()),
    }
}
