//! The three pipeline stages.
//!
//! Each stage is a free async function taking its inputs, its external
//! capability, and the [`crate::StageCache`]. Stages own their cache
//! consult/publish protocol; the orchestrator owns only their ordering.

pub mod generate;
pub mod prompt;
pub mod score;

use crate::error::{PipelineError, PipelineResult};
use crate::StageCache;

/// Consult the cache for `stage`, degrading corruption to a miss.
///
/// Returns `Ok(Some(payload))` on a clean hit, `Ok(None)` on a miss or a
/// corrupt file (logged), and propagates nothing else.
pub(crate) fn consult_cache<T: serde::de::DeserializeOwned>(
    cache: &StageCache,
    stage: &str,
) -> PipelineResult<Option<T>> {
    if !cache.has(stage) {
        return Ok(None);
    }
    match cache.load::<T>(stage) {
        Ok(payload) => {
            tracing::info!(stage, "stage served from cache");
            Ok(Some(payload))
        }
        Err(PipelineError::CacheCorruption { stage, message }) => {
            tracing::warn!(stage = %stage, message = %message, "corrupt cache entry, re-running stage");
            Ok(None)
        }
        Err(other) => Err(other),
    }
}
