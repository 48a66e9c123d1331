//! Upload ingest and delete orchestration.
//!
//! The artifact bytes are already on disk when ingest runs (the transport
//! layer places them while parsing the request body). Every rejection path
//! therefore ends with the placed artifacts deleted again: a refused upload
//! leaves zero orphaned files and zero partial records.

use crate::dedup::DuplicateDetector;
use crate::error::{CatalogError, CatalogResult};
use crate::models::AddonRecord;
use crate::store::CatalogStore;
use futures::StreamExt;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;
use workshop_core::{AddonMetadata, ContentHash, ImageRef, MAX_IMAGES_PER_ADDON};
use workshop_storage::{ArtifactStore, StorageError, StoredArtifact};

/// A fully received upload, ready for cataloging.
#[derive(Debug)]
pub struct IngestRequest {
    /// The placed main package artifact.
    pub main: StoredArtifact,
    /// File name the client uploaded the package under.
    pub original_name: String,
    /// Supplied metadata fields.
    pub metadata: AddonMetadata,
    /// Placed preview images, in upload order.
    pub images: Vec<StoredArtifact>,
}

/// Ingest failure modes.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required fields: {0}")]
    MissingFields(String),

    #[error("an addon with identical content already exists (hash {hash})")]
    Duplicate { hash: String },

    #[error("too many preview images: {0} (maximum {MAX_IMAGES_PER_ADDON})")]
    TooManyImages(usize),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Catalog a received upload.
///
/// Order matters: metadata validation, then the streaming content hash, then
/// the duplicate check, then the insert. The pre-insert duplicate check is
/// the fast path; the UNIQUE constraint behind [`CatalogStore::insert`] is
/// what actually closes the race between two concurrent uploads of identical
/// bytes, and the loser cleans up its own artifacts here.
pub async fn ingest_addon(
    catalog: &dyn CatalogStore,
    artifacts: &dyn ArtifactStore,
    request: IngestRequest,
) -> Result<AddonRecord, IngestError> {
    match try_ingest(catalog, artifacts, &request).await {
        Ok(record) => Ok(record),
        Err(e) => {
            discard_artifacts(artifacts, &request).await;
            Err(e)
        }
    }
}

async fn try_ingest(
    catalog: &dyn CatalogStore,
    artifacts: &dyn ArtifactStore,
    request: &IngestRequest,
) -> Result<AddonRecord, IngestError> {
    let metadata = &request.metadata;
    if metadata.name.trim().is_empty() || metadata.description.trim().is_empty() {
        return Err(IngestError::MissingFields(
            "name and description are required".to_string(),
        ));
    }
    if request.images.len() > MAX_IMAGES_PER_ADDON {
        return Err(IngestError::TooManyImages(request.images.len()));
    }

    let hash = hash_artifact(artifacts, &request.main.key).await?;

    if let Some(existing) = DuplicateDetector::new(catalog).check(&hash).await? {
        tracing::info!(
            addon_id = %existing.id,
            hash = %hash,
            "rejecting upload of already-cataloged content"
        );
        return Err(IngestError::Duplicate {
            hash: hash.to_hex(),
        });
    }

    let record = AddonRecord {
        id: Uuid::now_v7(),
        name: metadata.name.trim().to_string(),
        author: metadata.author_or_default(),
        description: metadata.description.trim().to_string(),
        kind: metadata.kind_or_default(),
        file_hash: hash.to_hex(),
        file_name: request.main.file_name.clone(),
        original_name: request.original_name.clone(),
        file_key: request.main.key.clone(),
        size: request.main.size as i64,
        images: request
            .images
            .iter()
            .map(|img| ImageRef {
                filename: img.file_name.clone(),
                key: img.key.clone(),
            })
            .collect(),
        uploaded_at: OffsetDateTime::now_utc(),
        downloads: 0,
        views: 0,
    };

    match catalog.insert(&record).await {
        Ok(()) => Ok(record),
        // Lost the race against a concurrent upload of the same content.
        Err(CatalogError::DuplicateHash(hash)) => Err(IngestError::Duplicate { hash }),
        Err(e) => Err(e.into()),
    }
}

/// Delete an addon and its artifacts.
///
/// Returns false when the id is unknown; deleting an absent addon is a
/// no-op, not an error (a concurrent delete or reconciliation purge may have
/// gotten there first). Artifact deletion is best-effort: a file that is
/// already gone does not fail the cascade.
pub async fn delete_addon(
    catalog: &dyn CatalogStore,
    artifacts: &dyn ArtifactStore,
    id: Uuid,
) -> CatalogResult<bool> {
    let Some(record) = catalog.get_by_id(id).await? else {
        return Ok(false);
    };

    delete_best_effort(artifacts, &record.file_key).await;
    for image in &record.images {
        delete_best_effort(artifacts, &image.key).await;
    }

    catalog.delete_record(id).await
}

/// Stream an artifact through the content hasher.
async fn hash_artifact(
    artifacts: &dyn ArtifactStore,
    key: &str,
) -> Result<ContentHash, StorageError> {
    let mut stream = artifacts.read_stream(key).await?;
    let mut hasher = ContentHash::hasher();
    while let Some(chunk) = stream.next().await {
        hasher.update(&chunk?);
    }
    Ok(hasher.finalize())
}

/// Remove every artifact placed for a rejected upload attempt.
async fn discard_artifacts(artifacts: &dyn ArtifactStore, request: &IngestRequest) {
    delete_best_effort(artifacts, &request.main.key).await;
    for image in &request.images {
        delete_best_effort(artifacts, &image.key).await;
    }
}

async fn delete_best_effort(artifacts: &dyn ArtifactStore, key: &str) {
    match artifacts.delete(key).await {
        Ok(()) | Err(StorageError::NotFound(_)) => {}
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "failed to delete artifact");
        }
    }
}
