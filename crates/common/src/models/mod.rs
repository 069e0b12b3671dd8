//! Domain models
//!
//! Immutable value types for the retrieval corpus:
//! - Exercises and theorems, each deriving its searchable term set
//! - The category/subtype taxonomy
//! - Per-query classification and retrieval results

mod exercise;
mod theorem;
mod taxonomy;
mod results;

pub use exercise::{Exercise, ExerciseCollection};
pub use theorem::{Theorem, TheoremCollection};
pub use taxonomy::{Category, Subtype, Taxonomy};
pub use results::{ClassificationResult, ContentType, RagResult, TheoremResult};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::ValidationError;

/// Metadata carried by every corpus document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusMetadata {
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub last_updated: String,
}

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept informational labels written as strings or bare numbers.
///
/// Numbers are kept in their JSON spelling; anything else reads as empty.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    })
}

/// Required text fields must contain something besides whitespace.
pub(crate) fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_accepts_numbers() {
        let metadata: CorpusMetadata =
            serde_json::from_str(r#"{"version": 1.2, "last_updated": 20240901}"#).unwrap();
        assert_eq!(metadata.version, "1.2");
        assert_eq!(metadata.last_updated, "20240901");
    }

    #[test]
    fn test_metadata_ignores_other_shapes() {
        let metadata: CorpusMetadata =
            serde_json::from_str(r#"{"version": null, "last_updated": ["x"]}"#).unwrap();
        assert!(metadata.version.is_empty());
        assert!(metadata.last_updated.is_empty());
    }
}
