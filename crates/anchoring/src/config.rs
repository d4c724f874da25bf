//! Codec configuration

use serde::{Deserialize, Serialize};

/// Settings for selector encoding
///
/// Deserializable with every field optional, so a host can embed it in its
/// own settings file:
///
/// ```
/// let config: anchoring::CodecConfig =
///     serde_json::from_str(r#"{"verify_unique_ids": true}"#).unwrap();
/// assert_eq!(config.id_attribute, "id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Attribute treated as a document-unique identifier
    pub id_attribute: String,

    /// Only take the id shortcut when exactly one element carries the id.
    /// Off by default: ids are trusted to be unique, which keeps paths short
    /// and matches what browsers produce.
    pub verify_unique_ids: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            id_attribute: "id".to_string(),
            verify_unique_ids: false,
        }
    }
}
