//! Per-clip feature records
//!
//! Extraction can run once per clip and be persisted; aggregation then reads
//! the records back. A record is a JSON [`LabeledFeatures`] whose
//! `features.schema` tag is checked before decoding.

use std::fs;
use std::path::Path;

use super::versioned::{decode_versioned, read_json};
use crate::error::RecognitionError;
use crate::features::LabeledFeatures;

/// Write one clip's features to `path`
///
/// # Errors
///
/// Returns `PersistenceError` if writing fails.
pub fn save_clip_features<P: AsRef<Path>>(
    record: &LabeledFeatures,
    path: P,
) -> Result<(), RecognitionError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(record)?)?;
    log::debug!("Saved features of '{}' to {}", record.id, path.display());
    Ok(())
}

/// Read one clip's features from `path`
///
/// # Errors
///
/// - `SchemaVersionMismatch` if the record was built under another schema
/// - `PersistenceError` if the file is unreadable, malformed or untagged
/// - `InvalidInput` / `NumericalError` if the decoded features are inconsistent
pub fn load_clip_features<P: AsRef<Path>>(path: P) -> Result<LabeledFeatures, RecognitionError> {
    let path = path.as_ref();
    let value = read_json(path)?;
    let tag = value.get("features").and_then(|f| f.get("schema")).cloned();
    let record: LabeledFeatures = decode_versioned(value, tag.as_ref(), path)?;
    record.features.validate()?;
    Ok(record)
}
