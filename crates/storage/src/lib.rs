//! Artifact storage abstraction and backend for Workshop.
//!
//! This crate provides:
//! - Placement, naming, and deletion of addon packages and preview images
//! - Two logical buckets routed by declared artifact kind
//! - Extension/content-type allow-lists and a per-artifact size cap
//! - Backend: local filesystem with atomic writes

pub mod error;
pub mod filesystem;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use filesystem::FilesystemStore;
pub use store::{ArtifactKind, ArtifactStore, ArtifactUpload, ByteStream, StoredArtifact};

use std::sync::Arc;
use workshop_core::config::{StorageConfig, UploadConfig};

/// Create an artifact store from configuration.
pub async fn from_config(
    storage: &StorageConfig,
    upload: &UploadConfig,
) -> StorageResult<Arc<dyn ArtifactStore>> {
    match storage {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemStore::new(path, upload).await?;
            Ok(Arc::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::tempdir;

    #[tokio::test]
    async fn from_config_filesystem_ok() {
        let temp = tempdir().unwrap();
        let config = StorageConfig::Filesystem {
            path: temp.path().join("artifacts"),
        };

        let store = from_config(&config, &UploadConfig::default())
            .await
            .unwrap();
        let placed = store
            .place(
                ArtifactKind::Package,
                "hello.zip",
                None,
                Bytes::from_static(b"hi"),
            )
            .await
            .unwrap();
        assert!(store.exists(&placed.key).await.unwrap());
    }
}
