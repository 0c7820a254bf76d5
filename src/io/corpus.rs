//! Labeled corpus layout
//!
//! A corpus directory holds one sub-directory per raga, named by its label,
//! with one JSON file per clip:
//!
//! ```text
//! <corpus>/<label>/<clip>.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RecognitionError;

/// One clip file of a labeled corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusFile {
    /// Clip identifier (`<label>/<file stem>`)
    pub id: String,

    /// Raga label (the parent directory name)
    pub label: String,

    /// Path of the clip file
    pub path: PathBuf,
}

/// List every `*.json` clip file under `dir`, sorted by label then file name
///
/// Files directly under `dir` and non-UTF-8 names are ignored.
///
/// # Errors
///
/// Returns `PersistenceError` if a directory cannot be read.
pub fn scan_corpus<P: AsRef<Path>>(dir: P) -> Result<Vec<CorpusFile>, RecognitionError> {
    let mut label_dirs: Vec<PathBuf> = fs::read_dir(dir.as_ref())?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    label_dirs.sort();

    let mut files = Vec::new();
    for label_dir in label_dirs {
        let Some(label) = label_dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(&label_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            files.push(CorpusFile {
                id: format!("{}/{}", label, stem),
                label: label.clone(),
                path,
            });
        }
    }

    log::debug!("Corpus {}: {} clip files", dir.as_ref().display(), files.len());
    Ok(files)
}
