//! Schema-tagged JSON records
//!
//! Persisted records carry a `schema` tag. The tag is checked on the raw JSON
//! value before typed decoding, so a record from another feature schema
//! surfaces as `SchemaVersionMismatch` instead of a decode error.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::FeatureSchema;
use crate::error::RecognitionError;

/// Read a JSON file into an untyped value
pub(crate) fn read_json(path: &Path) -> Result<Value, RecognitionError> {
    let data = fs::read_to_string(path)
        .map_err(|e| RecognitionError::PersistenceError(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&data)
        .map_err(|e| RecognitionError::PersistenceError(format!("{}: {}", path.display(), e)))
}

/// Check the schema tag found at `tag` (a JSON string), then decode `value`
pub(crate) fn decode_versioned<T: DeserializeOwned>(
    value: Value,
    tag: Option<&Value>,
    path: &Path,
) -> Result<T, RecognitionError> {
    match tag.and_then(|t| t.as_str()) {
        Some(tag) => {
            FeatureSchema::from_tag(tag)?;
        }
        None => {
            return Err(RecognitionError::PersistenceError(format!(
                "{}: no schema tag",
                path.display()
            )))
        }
    }
    serde_json::from_value(value)
        .map_err(|e| RecognitionError::PersistenceError(format!("{}: {}", path.display(), e)))
}
