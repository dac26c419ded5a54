//! Prompt stage: one refined generation prompt per vocabulary entry.
//!
//! Cache key `"prompts"`. On a hit the stage returns the cached mapping and
//! performs zero generation calls. On a miss, one call per entry is submitted
//! concurrently with no explicit cap (the capability may impose its own);
//! results land in a word-keyed map, so completion order is irrelevant. The
//! first failure aborts the whole stage and nothing is cached.

use std::sync::Arc;

use crate::capability::PromptGenerator;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{PromptMap, Vocabulary};
use crate::StageCache;

/// Cache key for this stage.
pub const STAGE_NAME: &str = "prompts";

/// Run the prompt stage.
pub async fn run(
    vocab: &Vocabulary,
    generator: Arc<dyn PromptGenerator>,
    cache: &StageCache,
) -> PipelineResult<PromptMap> {
    if let Some(cached) = super::consult_cache::<PromptMap>(cache, STAGE_NAME)? {
        return Ok(cached);
    }

    let mut handles = Vec::with_capacity(vocab.len());
    for entry in vocab.iter().cloned() {
        let generator = Arc::clone(&generator);
        handles.push(tokio::spawn(async move {
            let result = generator.generate(&entry).await;
            (entry.word, result)
        }));
    }

    let mut prompts = PromptMap::new();
    for handle in handles {
        let (word, result) = handle
            .await
            .map_err(|e| PipelineError::generation("prompt task", e.to_string()))?;
        let prompt = result.map_err(|e| attribute(&word, e))?;
        prompts.insert(word, prompt);
    }

    cache.save(STAGE_NAME, &prompts)?;
    tracing::info!(count = prompts.len(), "prompt stage complete");
    Ok(prompts)
}

/// Re-attribute a capability error to the entry that triggered it.
fn attribute(word: &str, err: PipelineError) -> PipelineError {
    match err {
        PipelineError::Generation { message, .. } => PipelineError::generation(word, message),
        other => PipelineError::generation(word, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VocabEntry;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct StubPrompter {
        calls: AtomicUsize,
        fail_word: Option<String>,
    }

    impl StubPrompter {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_word: None,
            }
        }

        fn failing_on(word: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_word: Some(word.to_string()),
            }
        }
    }

    #[async_trait]
    impl PromptGenerator for StubPrompter {
        async fn generate(&self, entry: &VocabEntry) -> PipelineResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_word.as_deref() == Some(entry.word.as_str()) {
                return Err(PipelineError::generation("llm", "refused"));
            }
            Ok(format!("P:{}", entry.definition))
        }
    }

    fn vocab() -> Vocabulary {
        vec![
            VocabEntry {
                word: "猫".into(),
                pos: "noun".into(),
                definition: "cat".into(),
                category: "animal".into(),
            },
            VocabEntry {
                word: "跑".into(),
                pos: "verb".into(),
                definition: "run".into(),
                category: "action".into(),
            },
        ]
    }

    #[tokio::test]
    async fn test_produces_prompt_per_entry() {
        let dir = TempDir::new().unwrap();
        let cache = StageCache::new(dir.path()).unwrap();
        let prompts = run(&vocab(), Arc::new(StubPrompter::new()), &cache)
            .await
            .unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts["猫"], "P:cat");
        assert_eq!(prompts["跑"], "P:run");
    }

    #[tokio::test]
    async fn test_cache_hit_makes_zero_calls() {
        let dir = TempDir::new().unwrap();
        let cache = StageCache::new(dir.path()).unwrap();
        let first = run(&vocab(), Arc::new(StubPrompter::new()), &cache)
            .await
            .unwrap();

        let stub = Arc::new(StubPrompter::new());
        let second = run(&vocab(), Arc::clone(&stub) as Arc<dyn PromptGenerator>, &cache)
            .await
            .unwrap();
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_failure_aborts_stage_and_names_entry() {
        let dir = TempDir::new().unwrap();
        let cache = StageCache::new(dir.path()).unwrap();
        let err = run(&vocab(), Arc::new(StubPrompter::failing_on("跑")), &cache)
            .await
            .unwrap_err();
        match err {
            PipelineError::Generation { word, .. } => assert_eq!(word, "跑"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!cache.has(STAGE_NAME), "failed stage must not publish cache");
    }

    #[tokio::test]
    async fn test_corrupt_cache_reruns_stage() {
        let dir = TempDir::new().unwrap();
        let cache = StageCache::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("prompts.json"), b"]broken").unwrap();

        let stub = Arc::new(StubPrompter::new());
        let prompts = run(&vocab(), Arc::clone(&stub) as Arc<dyn PromptGenerator>, &cache)
            .await
            .unwrap();
        assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
        assert_eq!(prompts.len(), 2);
        // the re-run repaired the cache file
        let reloaded: PromptMap = cache.load(STAGE_NAME).unwrap();
        assert_eq!(reloaded, prompts);
    }
}
