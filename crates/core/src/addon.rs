//! Addon domain types shared across crates.

use serde::{Deserialize, Serialize};

/// Maximum number of preview images per addon.
pub const MAX_IMAGES_PER_ADDON: usize = 5;

/// Author recorded when an upload does not name one.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Addon kind recorded when an upload does not declare one.
pub const DEFAULT_KIND: &str = "complete";

/// Reference to a stored preview image.
///
/// `key` addresses the artifact in the image bucket of the artifact store.
/// Image references are persisted as a JSON array on the addon row and are
/// decoded back into this type at the store boundary; serialized strings
/// never cross into business logic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Stored file name of the image.
    pub filename: String,
    /// Storage key of the image artifact.
    pub key: String,
}

/// Free-form metadata supplied with an upload.
///
/// `name` and `description` are mandatory; the others fall back to defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AddonMetadata {
    pub name: String,
    pub author: Option<String>,
    pub description: String,
    pub kind: Option<String>,
}

impl AddonMetadata {
    /// Author to record, falling back to the default.
    pub fn author_or_default(&self) -> String {
        match self.author.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => a.to_string(),
            _ => DEFAULT_AUTHOR.to_string(),
        }
    }

    /// Kind to record, falling back to the default.
    pub fn kind_or_default(&self) -> String {
        match self.kind.as_deref().map(str::trim) {
            Some(k) if !k.is_empty() => k.to_string(),
            _ => DEFAULT_KIND.to_string(),
        }
    }
}
