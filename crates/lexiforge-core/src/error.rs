//! Error taxonomy for the lexiforge pipeline.
//!
//! # Error Categories
//!
//! | Category | Variants | Surfaced |
//! |----------|----------|----------|
//! | Setup | Config, VocabLoad, UnsupportedBackend | before any external call |
//! | Stage | Generation, Scoring, ScorerNotLoaded | fails the owning stage |
//! | Storage | CacheCorruption, Export, Io | CacheCorruption degrades to a miss |
//!
//! Stage errors name the vocabulary entry that triggered them whenever one is
//! identifiable. Errors propagate; nothing here is silently recovered except
//! `CacheCorruption`, which stage code treats as a cache miss.

use thiserror::Error;

/// Result alias used throughout the pipeline crates.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// All failure modes of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    // === Setup Errors ===
    /// Malformed or missing configuration. Fatal before the pipeline starts.
    #[error("Config error: {message}")]
    Config { message: String },

    /// Malformed vocabulary source. Fatal; never a per-row skip.
    #[error("Vocabulary load error: {message}")]
    VocabLoad { message: String },

    /// The selected generation backend has no implementation.
    #[error("Unsupported generation backend: {backend:?}")]
    UnsupportedBackend { backend: String },

    // === Stage Errors ===
    /// External prompt or image generation call failed for an entry.
    #[error("Generation failed for {word:?}: {message}")]
    Generation { word: String, message: String },

    /// External scoring call failed for an entry.
    #[error("Scoring failed for {word:?}: {message}")]
    Scoring { word: String, message: String },

    /// `score()` was called before the scorer's explicit `load()`.
    #[error("Scorer not loaded: call load() before score()")]
    ScorerNotLoaded,

    // === Storage Errors ===
    /// A cache file exists but cannot be parsed. Stages treat this as a miss.
    #[error("Cache corruption in stage {stage:?}: {message}")]
    CacheCorruption { stage: String, message: String },

    /// Score table or CSV export failed.
    #[error("Export error: {message}")]
    Export { message: String },

    /// Filesystem failure (artifact writes, cache publication, reads).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Generation-call failure attributed to `word`.
    ///
    /// Adapters that only see the request (not the vocabulary entry) pass
    /// their backend tag; the owning stage re-attributes to the entry.
    pub fn generation(word: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            word: word.into(),
            message: message.into(),
        }
    }

    /// Scoring-call failure attributed to `word`.
    pub fn scoring(word: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scoring {
            word: word.into(),
            message: message.into(),
        }
    }

    /// True for errors that must be reported before any external call.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::VocabLoad { .. } | Self::UnsupportedBackend { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_failing_word() {
        let err = PipelineError::Generation {
            word: "猫".to_string(),
            message: "timeout".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("猫"));
        assert!(rendered.contains("timeout"));
    }

    #[test]
    fn test_setup_errors_classified() {
        assert!(PipelineError::Config { message: "x".into() }.is_setup_error());
        assert!(PipelineError::VocabLoad { message: "x".into() }.is_setup_error());
        assert!(PipelineError::UnsupportedBackend { backend: "dalle".into() }.is_setup_error());
        assert!(!PipelineError::ScorerNotLoaded.is_setup_error());
    }

    #[test]
    fn test_io_error_converts() {
        fn fails() -> PipelineResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(PipelineError::Io(_))));
    }
}
