//! Core data model: vocabulary entries and stage outputs.
//!
//! Stage outputs are `BTreeMap`s keyed by vocabulary word, so cache payloads
//! and exports serialize in a deterministic order regardless of the
//! completion order of concurrent stage tasks.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One vocabulary item. Immutable once loaded.
///
/// The `word` field is the unique key every downstream prompt, artifact, and
/// score record is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabEntry {
    /// Unique word key, e.g. "猫".
    pub word: String,
    /// Part-of-speech tag, e.g. "noun".
    pub pos: String,
    /// Definition text the prompt is drafted from.
    pub definition: String,
    /// Semantic class tag, e.g. "animal".
    pub category: String,
}

/// The full ordered entry sequence for a run, loaded once.
pub type Vocabulary = Vec<VocabEntry>;

/// Prompt stage output: word -> refined generation prompt.
pub type PromptMap = BTreeMap<String, String>;

/// Generation stage output: word -> ordered artifact file paths.
pub type ImageMap = BTreeMap<String, Vec<PathBuf>>;

/// One scored (word, artifact) pair.
///
/// `normalized` is only meaningful after the run-global normalization pass;
/// see [`crate::stage::score`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Owning vocabulary word.
    pub word: String,
    /// Path of the scored artifact.
    pub image: PathBuf,
    /// Raw similarity as reported by the scorer.
    pub raw: f64,
    /// Linearly rescaled score in [0, 100].
    pub normalized: f64,
}
