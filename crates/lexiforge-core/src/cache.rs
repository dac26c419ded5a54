//! On-disk stage cache with existence-based invalidation.
//!
//! One JSON file per stage under the configured cache directory. Presence of
//! the file is the sole hit signal - no TTL, no content hash. Payloads are
//! published atomically: `save` writes to a `.tmp` sibling and renames it
//! into place, so a crash mid-write can never leave a file that `has`
//! reports present but `load` cannot parse.
//!
//! A single run owns the cache directory exclusively; concurrent runs
//! against the same cache path are undefined behavior.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};

/// Maps a stage name to a previously persisted payload.
#[derive(Debug, Clone)]
pub struct StageCache {
    root: PathBuf,
}

impl StageCache {
    /// Create a cache rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> PipelineResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Whether a payload for `stage` has been persisted.
    pub fn has(&self, stage: &str) -> bool {
        self.path_for(stage).is_file()
    }

    /// Load the persisted payload for `stage`.
    ///
    /// # Errors
    /// `CacheCorruption` if the file exists but cannot be parsed; callers
    /// treat that as a miss and re-run the stage.
    pub fn load<T: DeserializeOwned>(&self, stage: &str) -> PipelineResult<T> {
        let path = self.path_for(stage);
        let bytes = fs::read(&path).map_err(|e| PipelineError::CacheCorruption {
            stage: stage.to_string(),
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| PipelineError::CacheCorruption {
            stage: stage.to_string(),
            message: format!("cannot parse {}: {}", path.display(), e),
        })
    }

    /// Persist `payload` for `stage`, atomically.
    pub fn save<T: Serialize>(&self, stage: &str, payload: &T) -> PipelineResult<()> {
        let path = self.path_for(stage);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(payload).map_err(|e| PipelineError::Export {
            message: format!("serialize cache stage {:?}: {}", stage, e),
        })?;
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(stage, path = %path.display(), "cache saved");
        Ok(())
    }

    fn path_for(&self, stage: &str) -> PathBuf {
        self.root.join(format!("{stage}.json"))
    }
}
