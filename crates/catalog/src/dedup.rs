//! Content-addressed duplicate detection.

use crate::error::CatalogResult;
use crate::models::AddonRecord;
use crate::store::CatalogStore;
use workshop_core::ContentHash;

/// Detects re-uploads of identical content by querying the catalog by hash.
///
/// A hit is a definitive rejection: the caller refuses the upload with a
/// conflict and removes any artifact bytes already written for the attempt.
/// Detection alone has no side effect on the catalog.
pub struct DuplicateDetector<'a> {
    catalog: &'a dyn CatalogStore,
}

impl<'a> DuplicateDetector<'a> {
    /// Create a detector over the given catalog.
    pub fn new(catalog: &'a dyn CatalogStore) -> Self {
        Self { catalog }
    }

    /// Look up a live record with the same content hash.
    pub async fn check(&self, hash: &ContentHash) -> CatalogResult<Option<AddonRecord>> {
        self.catalog.get_by_hash(&hash.to_hex()).await
    }
}
