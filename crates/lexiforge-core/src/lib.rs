//! Lexiforge pipeline core.
//!
//! Turns a vocabulary list into a labeled image-prompt-score dataset through
//! three sequential, independently cacheable stages:
//!
//! ```text
//! +-------------+    +-------------+    +-------------+    +-------------+
//! | Vocabulary  | -> |   Prompt    | -> | Generation  | -> |   Scoring   |
//! |   (CSV)     |    |   Stage     |    |   Stage     |    |   Stage     |
//! +-------------+    +-------------+    +-------------+    +-------------+
//!                          |                  |                  |
//!                          v                  v                  v
//!                    prompts.json       images.json        scores.json
//!                      (cache)        (cache) + PNGs       scores.csv
//! ```
//!
//! Each stage consults the [`cache::StageCache`] first; a hit short-circuits
//! the stage entirely, including its side effects. The scoring stage is the
//! deliberate exception: it always recomputes, so score normalization always
//! reflects the current run.
//!
//! # Concurrency
//!
//! A single control task drives cooperatively scheduled I/O-bound tasks. The
//! prompt stage fans out uncapped; the generation stage is gated by a
//! [`tokio::sync::Semaphore`] so at most `concurrency` external calls are in
//! flight at once, globally across the stage. Stage outputs are keyed by
//! vocabulary word, so completion order never affects results.
//!
//! # Error Behavior
//!
//! - Config and vocabulary errors surface before any external call is made
//! - A stage fails on the first unrecovered capability failure
//! - Cache corruption is a miss, never a fatal error
//! - An unknown generation backend fails fast, never a silent fallback

pub mod cache;
pub mod capability;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod stage;
pub mod types;
pub mod vocab;

pub use cache::StageCache;
pub use capability::{ImageGenerator, PromptGenerator, SimilarityScorer};
pub use config::{GenerationConfig, LlmConfig, PathsConfig, PipelineConfig, ScoringConfig};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, RunSummary};
pub use types::{ImageMap, PromptMap, ScoreRecord, VocabEntry, Vocabulary};
pub use vocab::load_vocabulary;
