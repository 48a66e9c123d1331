//! Database models mapping to the catalog schema.

use crate::error::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;
use workshop_core::ImageRef;

/// Raw addon row as persisted.
///
/// `images` holds the JSON-encoded image reference list; it is decoded into
/// structured values by [`AddonRow::into_record`] at the store boundary and
/// never leaves this crate as a string.
#[derive(Debug, Clone, FromRow)]
pub struct AddonRow {
    pub addon_id: Uuid,
    pub name: String,
    pub author: String,
    pub description: String,
    pub kind: String,
    pub file_hash: String,
    pub file_name: String,
    pub original_name: String,
    pub file_key: String,
    pub size_bytes: i64,
    pub images: String,
    pub uploaded_at: OffsetDateTime,
    pub downloads: i64,
    pub views: i64,
}

impl AddonRow {
    /// Decode the row into the public record type.
    pub fn into_record(self) -> CatalogResult<AddonRecord> {
        let images: Vec<ImageRef> = serde_json::from_str(&self.images).map_err(|e| {
            CatalogError::Serialization(format!(
                "invalid images column for addon {}: {e}",
                self.addon_id
            ))
        })?;
        Ok(AddonRecord {
            id: self.addon_id,
            name: self.name,
            author: self.author,
            description: self.description,
            kind: self.kind,
            file_hash: self.file_hash,
            file_name: self.file_name,
            original_name: self.original_name,
            file_key: self.file_key,
            size: self.size_bytes,
            images,
            uploaded_at: self.uploaded_at,
            downloads: self.downloads,
            views: self.views,
        })
    }
}

/// A cataloged addon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonRecord {
    pub id: Uuid,
    pub name: String,
    pub author: String,
    pub description: String,
    pub kind: String,
    /// Lowercase hex SHA-256 of the package content; unique across live records.
    pub file_hash: String,
    /// Generated stored file name of the package.
    pub file_name: String,
    /// File name the client uploaded.
    pub original_name: String,
    /// Storage key of the package artifact.
    pub file_key: String,
    pub size: i64,
    pub images: Vec<ImageRef>,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    pub downloads: i64,
    pub views: i64,
}

impl AddonRecord {
    /// Encode the image list for persistence.
    pub(crate) fn images_json(&self) -> CatalogResult<String> {
        encode_images(&self.images)
    }
}

/// Encode image references as the persisted JSON form.
pub(crate) fn encode_images(images: &[ImageRef]) -> CatalogResult<String> {
    serde_json::to_string(images)
        .map_err(|e| CatalogError::Serialization(format!("failed to encode images: {e}")))
}
