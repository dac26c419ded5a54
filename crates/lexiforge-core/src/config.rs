//! Root configuration for a pipeline run.
//!
//! # Loading Configuration
//!
//! ```rust,ignore
//! use lexiforge_core::PipelineConfig;
//!
//! let config = PipelineConfig::from_file("lexiforge.toml")?;
//! config.validate()?;
//! ```
//!
//! # TOML Structure
//!
//! ```toml
//! [paths]                # mandatory, no defaults
//! vocab = "vocab.csv"
//! output_dir = "out"
//! cache_dir = "out/cache"
//!
//! [generation]
//! backend = "sdwebui"
//! n_images = 4
//! width = 512
//! height = 512
//! steps = 30
//! concurrency = 3
//!
//! [llm]
//! model = "gpt-4o-mini"
//! temperature = 0.7
//! max_tokens = 120
//! ```
//!
//! # Design Principles
//!
//! - Invalid config returns an error, never silently defaults
//! - File not found or parse error returns immediately
//! - The mandatory `[paths]` fields carry no serde defaults, so omitting one
//!   is a parse error, not a late runtime surprise

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

// ============================================================================
// PATHS CONFIG
// ============================================================================

/// Mandatory filesystem locations. None of these have defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// CSV vocabulary source with columns word,pos,definition,category.
    pub vocab: PathBuf,
    /// Directory receiving artifacts, the score table, and the CSV export.
    pub output_dir: PathBuf,
    /// Directory holding per-stage cache files. Owned exclusively by one run.
    pub cache_dir: PathBuf,
}

// ============================================================================
// GENERATION CONFIG
// ============================================================================

/// Image generation backend selection and request shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Backend tag resolved at startup. Unknown tags fail fast with
    /// `UnsupportedBackend`; there is no fallback backend.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Artifacts generated per prompt.
    #[serde(default = "default_n_images")]
    pub n_images: usize,

    /// Image width in pixels.
    #[serde(default = "default_dimension")]
    pub width: u32,

    /// Image height in pixels.
    #[serde(default = "default_dimension")]
    pub height: u32,

    /// Diffusion step count passed to the backend.
    #[serde(default = "default_steps")]
    pub steps: u32,

    /// Maximum simultaneously outstanding generation calls, globally across
    /// the stage.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Backend base URL.
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    /// Per-call timeout, seconds.
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend() -> String {
    "sdwebui".to_string()
}

fn default_n_images() -> usize {
    4
}

fn default_dimension() -> u32 {
    512
}

fn default_steps() -> u32 {
    30
}

fn default_concurrency() -> usize {
    3
}

fn default_generation_base_url() -> String {
    "http://127.0.0.1:7860".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    300
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            n_images: default_n_images(),
            width: default_dimension(),
            height: default_dimension(),
            steps: default_steps(),
            concurrency: default_concurrency(),
            base_url: default_generation_base_url(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

// ============================================================================
// LLM CONFIG
// ============================================================================

/// Prompt-drafting language model selection.
///
/// The API key is read from the `LEXIFORGE_API_KEY` environment variable by
/// the adapter, never from this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature in [0, 2].
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Completion token limit per prompt draft.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-call timeout, seconds.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    120
}

fn default_llm_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

// ============================================================================
// SCORING CONFIG
// ============================================================================

/// Similarity scorer model location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Directory containing `model.safetensors` and `tokenizer.json`.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models/clip-vit-base-patch32")
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
        }
    }
}

// ============================================================================
// ROOT CONFIG
// ============================================================================

/// Top-level configuration aggregating all pipeline sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Mandatory filesystem locations.
    pub paths: PathsConfig,

    /// Image generation section.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Prompt-drafting LLM section.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Scorer section.
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl PipelineConfig {
    /// Load and parse a TOML config file.
    ///
    /// # Errors
    /// `PipelineError::Config` if the file is missing or unparsable.
    pub fn from_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| PipelineError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse a TOML string.
    pub fn from_toml_str(toml: &str) -> PipelineResult<Self> {
        toml::from_str(toml).map_err(|e| PipelineError::Config {
            message: format!("TOML parse error: {}", e),
        })
    }

    /// Serialize back to TOML (config introspection).
    pub fn to_toml_string(&self) -> PipelineResult<String> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::Config {
            message: format!("TOML serialize error: {}", e),
        })
    }

    /// Validate field ranges. Fails fast on the first violation.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.generation.backend.trim().is_empty() {
            return Err(config_err("generation.backend must not be empty"));
        }
        if self.generation.n_images == 0 {
            return Err(config_err("generation.n_images must be at least 1"));
        }
        if self.generation.width == 0 || self.generation.height == 0 {
            return Err(config_err("generation.width/height must be nonzero"));
        }
        if self.generation.steps == 0 {
            return Err(config_err("generation.steps must be at least 1"));
        }
        if self.generation.concurrency == 0 {
            return Err(config_err("generation.concurrency must be at least 1"));
        }
        if self.generation.timeout_secs == 0 || self.llm.timeout_secs == 0 {
            return Err(config_err("timeout_secs must be nonzero"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(config_err("llm.temperature must be within [0, 2]"));
        }
        if self.llm.max_tokens == 0 {
            return Err(config_err("llm.max_tokens must be at least 1"));
        }
        Ok(())
    }

    /// Directory artifacts are written into: `<output_dir>/images`.
    pub fn images_dir(&self) -> PathBuf {
        self.paths.output_dir.join("images")
    }
}

fn config_err(message: &str) -> PipelineError {
    PipelineError::Config {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [paths]
        vocab = "vocab.csv"
        output_dir = "out"
        cache_dir = "out/cache"
    "#;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = PipelineConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.generation.backend, "sdwebui");
        assert_eq!(config.generation.n_images, 4);
        assert_eq!(config.generation.concurrency, 3);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!((config.llm.temperature - 0.7).abs() < f64::EPSILON);
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_mandatory_paths_fails_parse() {
        let toml = r#"
            [generation]
            backend = "sdwebui"
        "#;
        let err = PipelineConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, PipelineError::Config { .. }));
    }

    #[test]
    fn test_partial_paths_fails_parse() {
        let toml = r#"
            [paths]
            vocab = "vocab.csv"
        "#;
        assert!(PipelineConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_images() {
        let mut config = PipelineConfig::from_toml_str(MINIMAL).unwrap();
        config.generation.n_images = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = PipelineConfig::from_toml_str(MINIMAL).unwrap();
        config.generation.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let mut config = PipelineConfig::from_toml_str(MINIMAL).unwrap();
        config.llm.temperature = 2.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_survive_roundtrip() {
        let toml = r#"
            [paths]
            vocab = "v.csv"
            output_dir = "o"
            cache_dir = "c"

            [generation]
            n_images = 2
            concurrency = 8
        "#;
        let config = PipelineConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.generation.n_images, 2);
        assert_eq!(config.generation.concurrency, 8);
        let back = PipelineConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
        assert_eq!(back.generation.concurrency, 8);
    }

    #[test]
    fn test_from_file_reports_missing_file() {
        let err = PipelineConfig::from_file("/nonexistent/lexiforge.toml").unwrap_err();
        assert!(matches!(err, PipelineError::Config { .. }));
    }

    #[test]
    fn test_images_dir_is_under_output() {
        let config = PipelineConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.images_dir(), PathBuf::from("out/images"));
    }
}
