//! External capability traits.
//!
//! The pipeline invokes these but does not implement them; adapters live in
//! `lexiforge-backends` (HTTP clients) and `lexiforge-scoring` (local CLIP).
//! Every implementation is expected to enforce its own per-call timeout - a
//! stalled call without one stalls its whole stage.

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::types::VocabEntry;

/// Drafts one refined generation prompt from a vocabulary entry.
#[async_trait]
pub trait PromptGenerator: Send + Sync {
    /// Produce a prompt string for `entry` (from its definition and
    /// part-of-speech).
    async fn generate(&self, entry: &VocabEntry) -> PipelineResult<String>;
}

/// Produces a fixed-count ordered sequence of image byte buffers per prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate the configured number of images for `prompt`.
    async fn generate(&self, prompt: &str) -> PipelineResult<Vec<Vec<u8>>>;
}

/// Scores prompt/image similarity in a bounded real range.
///
/// Lifecycle is explicit: `load()` before the scoring stage, `release()`
/// after the run. `score()` on an unloaded scorer is an error, never a
/// hidden lazy load.
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    /// Load model state. Idempotent.
    async fn load(&self) -> PipelineResult<()>;

    /// Raw similarity between `prompt` and the encoded `image` bytes.
    async fn score(&self, prompt: &str, image: &[u8]) -> PipelineResult<f64>;

    /// Drop model state. Idempotent.
    async fn release(&self) -> PipelineResult<()>;
}
