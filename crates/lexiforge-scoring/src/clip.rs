//! CLIP scorer implementation.
//!
//! Loads `model.safetensors` and `tokenizer.json` from the configured model
//! directory, runs both encoders on CPU, and reports cosine similarity in
//! the shared embedding space.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use candle_core::{DType, Device, IndexOp, Result as CandleResult, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use tokenizers::Tokenizer;

use lexiforge_core::{PipelineError, PipelineResult, SimilarityScorer};

use crate::preprocess::image_to_tensor;

/// Weights, tokenizer, and device for a loaded model.
struct LoadedClip {
    model: ClipModel,
    tokenizer: Tokenizer,
    device: Device,
    context_length: usize,
}

/// CLIP vit-base-patch32 similarity scorer.
///
/// Not loaded after construction; call [`SimilarityScorer::load`] before
/// scoring. One process-wide instance per run; the loaded state is shared
/// behind a `RwLock` so concurrent callers read the same weights.
pub struct ClipScorer {
    model_dir: PathBuf,
    state: RwLock<Option<LoadedClip>>,
    loaded: AtomicBool,
}

impl ClipScorer {
    /// Create a scorer pointing at a directory containing
    /// `model.safetensors` and `tokenizer.json`.
    pub fn new(model_dir: impl AsRef<Path>) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
            state: RwLock::new(None),
            loaded: AtomicBool::new(false),
        }
    }

    /// Whether `load()` has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    fn load_inner(&self) -> PipelineResult<LoadedClip> {
        let device = Device::Cpu;

        let tokenizer_path = self.model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            PipelineError::scoring(
                "clip",
                format!("tokenizer load failed at {}: {e}", tokenizer_path.display()),
            )
        })?;

        let safetensors_path = self.model_dir.join("model.safetensors");
        if !safetensors_path.exists() {
            return Err(PipelineError::scoring(
                "clip",
                format!("safetensors not found at {}", safetensors_path.display()),
            ));
        }

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&safetensors_path], DType::F32, &device)
                .map_err(|e| {
                    PipelineError::scoring("clip", format!("safetensors load failed: {e}"))
                })?
        };

        let config = ClipConfig::vit_base_patch32();
        let context_length = config.text_config.max_position_embeddings;
        let model = ClipModel::new(vb, &config)
            .map_err(|e| PipelineError::scoring("clip", format!("model build failed: {e}")))?;

        tracing::info!(model_dir = %self.model_dir.display(), "CLIP scorer loaded");
        Ok(LoadedClip {
            model,
            tokenizer,
            device,
            context_length,
        })
    }

    fn encode_prompt(loaded: &LoadedClip, prompt: &str) -> PipelineResult<Tensor> {
        let encoding = loaded
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| PipelineError::scoring("clip", format!("tokenize failed: {e}")))?;
        let mut ids = encoding.get_ids().to_vec();
        ids.truncate(loaded.context_length);
        Tensor::new(ids.as_slice(), &loaded.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| PipelineError::scoring("clip", e.to_string()))
    }

    fn similarity(loaded: &LoadedClip, input_ids: &Tensor, pixels: &Tensor) -> CandleResult<f64> {
        let text_features = loaded.model.get_text_features(input_ids)?;
        let image_features = loaded.model.get_image_features(pixels)?;
        cosine(&text_features.i(0)?, &image_features.i(0)?)
    }
}

/// Cosine similarity of two 1-D feature vectors.
fn cosine(a: &Tensor, b: &Tensor) -> CandleResult<f64> {
    let dot: f32 = (a * b)?.sum_all()?.to_scalar()?;
    let norm_a: f32 = a.sqr()?.sum(D::Minus1)?.sqrt()?.to_scalar()?;
    let norm_b: f32 = b.sqr()?.sum(D::Minus1)?.sqrt()?.to_scalar()?;
    Ok(f64::from(dot / (norm_a * norm_b)))
}

#[async_trait]
impl SimilarityScorer for ClipScorer {
    async fn load(&self) -> PipelineResult<()> {
        if self.is_loaded() {
            return Ok(());
        }
        let loaded = self.load_inner()?;
        *self
            .state
            .write()
            .map_err(|_| PipelineError::scoring("clip", "scorer lock poisoned"))? = Some(loaded);
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    async fn score(&self, prompt: &str, image: &[u8]) -> PipelineResult<f64> {
        let guard = self
            .state
            .read()
            .map_err(|_| PipelineError::scoring("clip", "scorer lock poisoned"))?;
        let loaded = guard.as_ref().ok_or(PipelineError::ScorerNotLoaded)?;

        let input_ids = Self::encode_prompt(loaded, prompt)?;
        let pixels = image_to_tensor(image, &loaded.device)
            .map_err(|e| PipelineError::scoring("clip", format!("preprocess failed: {e}")))?;
        Self::similarity(loaded, &input_ids, &pixels)
            .map_err(|e| PipelineError::scoring("clip", format!("inference failed: {e}")))
    }

    async fn release(&self) -> PipelineResult<()> {
        *self
            .state
            .write()
            .map_err(|_| PipelineError::scoring("clip", "scorer lock poisoned"))? = None;
        self.loaded.store(false, Ordering::Release);
        tracing::debug!("CLIP scorer released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_of_known_vectors() {
        let device = Device::Cpu;
        let a = Tensor::new(&[3f32, 4.0], &device).unwrap();
        let b = Tensor::new(&[4f32, 3.0], &device).unwrap();
        let similarity = cosine(&a, &b).unwrap();
        assert!((similarity - 0.96).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_identical_vectors_is_one() {
        let device = Device::Cpu;
        let a = Tensor::new(&[1f32, 2.0, 3.0], &device).unwrap();
        let similarity = cosine(&a, &a).unwrap();
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_vectors_is_zero() {
        let device = Device::Cpu;
        let a = Tensor::new(&[1f32, 0.0], &device).unwrap();
        let b = Tensor::new(&[0f32, 1.0], &device).unwrap();
        let similarity = cosine(&a, &b).unwrap();
        assert!(similarity.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_score_before_load_is_explicit_error() {
        let scorer = ClipScorer::new("/nonexistent/model/dir");
        let err = scorer.score("a cat", &[0u8; 4]).await.unwrap_err();
        assert!(matches!(err, PipelineError::ScorerNotLoaded));
    }

    #[tokio::test]
    async fn test_load_reports_missing_model_dir() {
        let scorer = ClipScorer::new("/nonexistent/model/dir");
        let err = scorer.load().await.unwrap_err();
        assert!(matches!(err, PipelineError::Scoring { .. }));
        assert!(!scorer.is_loaded());
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let scorer = ClipScorer::new("/nonexistent/model/dir");
        scorer.release().await.unwrap();
        scorer.release().await.unwrap();
        assert!(!scorer.is_loaded());
    }
}
