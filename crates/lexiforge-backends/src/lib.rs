//! HTTP capability adapters for the lexiforge pipeline.
//!
//! Two thin clients around external services, plus the backend resolver:
//!
//! - [`LlmPromptClient`]: OpenAI-compatible chat-completions client that
//!   drafts one refined image prompt per vocabulary entry
//! - [`SdWebUiClient`]: Stable Diffusion WebUI `txt2img` client producing a
//!   fixed-count batch of PNG byte buffers per prompt
//! - [`resolve_image_backend`]: string-tag to implementation factory; an
//!   unknown tag fails fast with `UnsupportedBackend`, never a fallback
//!
//! Every client builds its `reqwest::Client` with the configured timeout, so
//! a stalled remote call cannot stall a stage indefinitely.

pub mod llm;
pub mod sdwebui;

use std::sync::Arc;

use lexiforge_core::{GenerationConfig, ImageGenerator, PipelineError, PipelineResult};

pub use llm::LlmPromptClient;
pub use sdwebui::SdWebUiClient;

/// Resolve the configured generation backend tag to an implementation.
///
/// Resolved once at startup by the CLI; the orchestrator holds the returned
/// trait object for the run's lifetime.
///
/// # Errors
/// `PipelineError::UnsupportedBackend` for any tag other than `"sdwebui"`.
pub fn resolve_image_backend(
    config: &GenerationConfig,
) -> PipelineResult<Arc<dyn ImageGenerator>> {
    match config.backend.as_str() {
        "sdwebui" => Ok(Arc::new(SdWebUiClient::new(config)?)),
        other => Err(PipelineError::UnsupportedBackend {
            backend: other.to_string(),
        }),
    }
}
