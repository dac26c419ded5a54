//! Score table persistence and CSV export.
//!
//! Two artifacts per run: `scores.json`, the full record set (word, image,
//! raw, normalized), and `scores.csv`, the denormalized export with the
//! normalized column renamed `clip`. Both are written only after every
//! record in the run exists, so the CSV always reflects run-global
//! normalization.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::types::ScoreRecord;

/// CSV export row: `word,image,clip`.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    word: &'a str,
    image: &'a Path,
    clip: f64,
}

/// Write the full score table to `<output_dir>/scores.json`.
pub fn write_score_table(records: &[ScoreRecord], output_dir: &Path) -> PipelineResult<PathBuf> {
    let path = output_dir.join("scores.json");
    let bytes = serde_json::to_vec_pretty(records).map_err(|e| PipelineError::Export {
        message: format!("serialize score table: {e}"),
    })?;
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Write the denormalized export to `<output_dir>/scores.csv`.
pub fn write_csv_export(records: &[ScoreRecord], output_dir: &Path) -> PipelineResult<PathBuf> {
    let path = output_dir.join("scores.csv");
    let mut writer = csv::Writer::from_path(&path).map_err(|e| PipelineError::Export {
        message: format!("open {}: {e}", path.display()),
    })?;
    for record in records {
        writer
            .serialize(ExportRow {
                word: &record.word,
                image: &record.image,
                clip: record.normalized,
            })
            .map_err(|e| PipelineError::Export {
                message: format!("write row for {:?}: {e}", record.word),
            })?;
    }
    writer.flush().map_err(|e| PipelineError::Export {
        message: format!("flush {}: {e}", path.display()),
    })?;
    tracing::info!(count = records.len(), path = %path.display(), "CSV export written");
    Ok(path)
}
