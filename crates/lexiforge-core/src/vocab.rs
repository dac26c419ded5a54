//! CSV vocabulary loading.
//!
//! The vocabulary is loaded once, fully, before the pipeline starts. A
//! malformed record fails the whole load with `VocabLoad` - there is no
//! per-row skip, so a run never silently operates on a subset of its input.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{VocabEntry, Vocabulary};

/// Load the full vocabulary from a CSV file with headers
/// `word,pos,definition,category`.
///
/// # Errors
/// `PipelineError::VocabLoad` on a missing file, a malformed record, an
/// empty word field, or a duplicate word key.
pub fn load_vocabulary(path: impl AsRef<Path>) -> PipelineResult<Vocabulary> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| PipelineError::VocabLoad {
        message: format!("cannot open {}: {}", path.display(), e),
    })?;

    let mut entries = Vocabulary::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (index, record) in reader.deserialize::<VocabEntry>().enumerate() {
        let entry = record.map_err(|e| PipelineError::VocabLoad {
            message: format!("record {}: {}", index + 1, e),
        })?;
        if entry.word.trim().is_empty() {
            return Err(PipelineError::VocabLoad {
                message: format!("record {}: empty word key", index + 1),
            });
        }
        if !seen.insert(entry.word.clone()) {
            return Err(PipelineError::VocabLoad {
                message: format!("record {}: duplicate word {:?}", index + 1, entry.word),
            });
        }
        entries.push(entry);
    }

    if entries.is_empty() {
        return Err(PipelineError::VocabLoad {
            message: format!("{} contains no vocabulary entries", path.display()),
        });
    }

    tracing::debug!(count = entries.len(), "vocabulary loaded");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_loads_ordered_entries() {
        let file = write_csv("word,pos,definition,category\n猫,noun,cat,animal\n跑,verb,run,action\n");
        let vocab = load_vocabulary(file.path()).unwrap();
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab[0].word, "猫");
        assert_eq!(vocab[1].pos, "verb");
        assert_eq!(vocab[1].category, "action");
    }

    #[test]
    fn test_malformed_record_fails_whole_load() {
        let file = write_csv("word,pos,definition,category\n猫,noun,cat,animal\n跑,verb\n");
        let err = load_vocabulary(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::VocabLoad { .. }));
    }

    #[test]
    fn test_duplicate_word_fails() {
        let file = write_csv("word,pos,definition,category\n猫,noun,cat,animal\n猫,noun,cat,animal\n");
        let err = load_vocabulary(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("duplicate"));
    }

    #[test]
    fn test_empty_word_fails() {
        let file = write_csv("word,pos,definition,category\n,noun,cat,animal\n");
        assert!(load_vocabulary(file.path()).is_err());
    }

    #[test]
    fn test_empty_file_fails() {
        let file = write_csv("word,pos,definition,category\n");
        assert!(load_vocabulary(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(load_vocabulary("/nonexistent/vocab.csv").is_err());
    }
}
