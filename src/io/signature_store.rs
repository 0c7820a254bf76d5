//! Signature persistence
//!
//! A signature set is a directory:
//!
//! ```text
//! <dir>/aggregation_metadata.json
//! <dir>/signatures/<label>.json
//! ```
//!
//! Every label listed in the metadata is loaded. A missing file excludes that
//! raga from comparison and is reported through
//! [`SignatureSet::missing_labels`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use super::versioned::{decode_versioned, read_json};
use crate::error::RecognitionError;
use crate::signatures::{AggregationMetadata, RagaSignature, SignatureSet};

/// Metadata file name inside a signature directory
pub const METADATA_FILE: &str = "aggregation_metadata.json";

/// Sub-directory holding one file per raga
pub const SIGNATURE_DIR: &str = "signatures";

/// Write a signature set to `dir`, creating it if needed
///
/// # Errors
///
/// Returns `InvalidInput` for a label that cannot be used as a file name and
/// `PersistenceError` if writing fails.
pub fn save_signature_set<P: AsRef<Path>>(
    set: &SignatureSet,
    dir: P,
) -> Result<(), RecognitionError> {
    let dir = dir.as_ref();
    let sig_dir = dir.join(SIGNATURE_DIR);
    fs::create_dir_all(&sig_dir)?;

    fs::write(
        dir.join(METADATA_FILE),
        serde_json::to_string_pretty(set.metadata())?,
    )?;

    for signature in set.iter() {
        let path = signature_path(&sig_dir, signature.label())?;
        fs::write(path, serde_json::to_string_pretty(signature)?)?;
    }

    log::info!("Saved {} signatures to {}", set.len(), dir.display());
    Ok(())
}

/// Load a signature set from `dir`
///
/// # Errors
///
/// - `PersistenceError` if the metadata cannot be read or a file is malformed
/// - `SchemaVersionMismatch` if the metadata or a signature carries an
///   unsupported schema tag, or a signature disagrees with the metadata
/// - `MissingSignature` if no signature file could be loaded
pub fn load_signature_set<P: AsRef<Path>>(dir: P) -> Result<SignatureSet, RecognitionError> {
    let dir = dir.as_ref();
    let metadata: AggregationMetadata = read_versioned(&dir.join(METADATA_FILE))?;
    let sig_dir = dir.join(SIGNATURE_DIR);

    let mut signatures = Vec::with_capacity(metadata.labels.len());
    let mut missing = Vec::new();
    for label in &metadata.labels {
        let path = signature_path(&sig_dir, label)?;
        if !path.is_file() {
            log::warn!("Missing signature for '{}' ({})", label, path.display());
            missing.push(label.clone());
            continue;
        }
        let signature: RagaSignature = read_versioned(&path)?;
        if signature.label() != label {
            return Err(RecognitionError::InvalidInput(format!(
                "{} holds signature '{}', expected '{}'",
                path.display(),
                signature.label(),
                label
            )));
        }
        signatures.push(signature);
    }

    if signatures.is_empty() {
        return Err(RecognitionError::MissingSignature(format!(
            "no signature files found under {}",
            sig_dir.display()
        )));
    }

    log::info!(
        "Loaded {} signatures from {} ({} missing)",
        signatures.len(),
        dir.display(),
        missing.len()
    );
    Ok(SignatureSet::new(metadata, signatures)?.with_missing(missing))
}

fn signature_path(sig_dir: &Path, label: &str) -> Result<PathBuf, RecognitionError> {
    if label.is_empty() || label.contains(['/', '\\']) || label == "." || label == ".." {
        return Err(RecognitionError::InvalidInput(format!(
            "label '{}' is not a valid file name",
            label
        )));
    }
    Ok(sig_dir.join(format!("{}.json", label)))
}

/// Read a JSON record, checking its top-level `schema` tag before full decoding
fn read_versioned<T: DeserializeOwned>(path: &Path) -> Result<T, RecognitionError> {
    let value = read_json(path)?;
    let tag = value.get("schema").cloned();
    decode_versioned(value, tag.as_ref(), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signatures::signature::tests::{flat_signature, metadata};

    fn sample_set() -> SignatureSet {
        SignatureSet::new(
            metadata(4, &["bhairavi", "yaman"]),
            vec![flat_signature("yaman", 4), flat_signature("bhairavi", 4)],
        )
        .unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let set = sample_set();
        save_signature_set(&set, dir.path()).unwrap();

        assert!(dir.path().join(METADATA_FILE).is_file());
        assert!(dir.path().join("signatures/yaman.json").is_file());

        let loaded = load_signature_set(dir.path()).unwrap();
        assert_eq!(loaded, set);
        assert!(loaded.missing_labels().is_empty());
    }

    #[test]
    fn test_missing_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        save_signature_set(&sample_set(), dir.path()).unwrap();
        fs::remove_file(dir.path().join("signatures/yaman.json")).unwrap();

        let loaded = load_signature_set(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.missing_labels(), &["yaman".to_string()]);
        assert!(matches!(
            loaded.get("yaman"),
            Err(RecognitionError::MissingSignature(_))
        ));
    }

    #[test]
    fn test_all_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        save_signature_set(&sample_set(), dir.path()).unwrap();
        fs::remove_dir_all(dir.path().join(SIGNATURE_DIR)).unwrap();
        assert!(matches!(
            load_signature_set(dir.path()),
            Err(RecognitionError::MissingSignature(_))
        ));
    }

    #[test]
    fn test_old_schema_rejected() {
        let dir = tempfile::tempdir().unwrap();
        save_signature_set(&sample_set(), dir.path()).unwrap();
        let path = dir.path().join("signatures/bhairavi.json");
        let text = fs::read_to_string(&path).unwrap().replace("\"v1.2\"", "\"v1.1\"");
        fs::write(&path, text).unwrap();

        assert_eq!(
            load_signature_set(dir.path()).unwrap_err(),
            RecognitionError::SchemaVersionMismatch {
                expected: "v1.2".to_string(),
                found: "v1.1".to_string(),
            }
        );
    }

    #[test]
    fn test_no_metadata() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_signature_set(dir.path()),
            Err(RecognitionError::PersistenceError(_))
        ));
    }

    #[test]
    fn test_bad_label_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(signature_path(dir.path(), "../escape").is_err());
    }
}
