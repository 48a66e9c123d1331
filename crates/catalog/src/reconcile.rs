//! Read-time reconciliation between the catalog and the artifact store.

use crate::error::CatalogResult;
use crate::models::AddonRecord;
use crate::store::CatalogStore;
use workshop_storage::ArtifactStore;

/// Reconcile the catalog against the artifact store, then return the
/// consistent listing (newest upload first).
///
/// This is the side-effecting read: records whose main artifact no longer
/// exists are purged permanently, and image references whose files vanished
/// are dropped from their records, with the shrunk list persisted. Both are
/// intentionally lossy and irreversible; a purged record can only come back
/// as a fresh upload with a new id.
///
/// A probe that fails with an I/O error (as opposed to a definite "not
/// found") keeps the record and logs; one unreadable entry never aborts the
/// listing for the rest of the catalog.
pub async fn reconcile_and_list(
    catalog: &dyn CatalogStore,
    artifacts: &dyn ArtifactStore,
) -> CatalogResult<Vec<AddonRecord>> {
    let records = catalog.list_all().await?;

    for record in records {
        match artifacts.exists(&record.file_key).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    addon_id = %record.id,
                    file = %record.file_name,
                    "main artifact missing, purging catalog record"
                );
                // A concurrent delete may have already removed the row; a
                // zero-row delete is fine either way.
                if let Err(e) = catalog.delete_record(record.id).await {
                    tracing::error!(addon_id = %record.id, error = %e, "failed to purge record");
                }
                continue;
            }
            Err(e) => {
                tracing::error!(
                    addon_id = %record.id,
                    key = %record.file_key,
                    error = %e,
                    "could not probe main artifact, keeping record"
                );
                continue;
            }
        }

        // Drop references to preview images whose files vanished.
        let mut kept = Vec::with_capacity(record.images.len());
        for image in &record.images {
            match artifacts.exists(&image.key).await {
                Ok(true) => kept.push(image.clone()),
                Ok(false) => {
                    tracing::warn!(
                        addon_id = %record.id,
                        image = %image.key,
                        "preview image missing, dropping reference"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        addon_id = %record.id,
                        image = %image.key,
                        error = %e,
                        "could not probe preview image, keeping reference"
                    );
                    kept.push(image.clone());
                }
            }
        }

        if kept.len() != record.images.len()
            && let Err(e) = catalog.update_images(record.id, &kept).await
        {
            tracing::error!(addon_id = %record.id, error = %e, "failed to persist trimmed image list");
        }
    }

    // Re-read the now-consistent set.
    catalog.list_all().await
}
