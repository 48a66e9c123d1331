//! Common fixtures for catalog integration tests.

use bytes::Bytes;
use std::sync::Arc;
use tempfile::TempDir;
use workshop_catalog::{CatalogStore, IngestRequest, SqliteStore};
use workshop_core::AddonMetadata;
use workshop_core::config::UploadConfig;
use workshop_storage::{ArtifactKind, ArtifactStore, FilesystemStore, StoredArtifact};

/// Catalog + artifact store pair backed by a temporary directory.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestHarness {
    pub catalog: Arc<dyn CatalogStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestHarness {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp directory");

        let artifacts: Arc<dyn ArtifactStore> = Arc::new(
            FilesystemStore::new(temp_dir.path().join("artifacts"), &UploadConfig::default())
                .await
                .expect("failed to create artifact store"),
        );

        let catalog: Arc<dyn CatalogStore> = Arc::new(
            SqliteStore::new(temp_dir.path().join("catalog.db"))
                .await
                .expect("failed to create catalog store"),
        );

        Self {
            catalog,
            artifacts,
            _temp_dir: temp_dir,
        }
    }

    /// Place a package artifact the way the transport layer would.
    pub async fn place_package(&self, original_name: &str, data: &[u8]) -> StoredArtifact {
        self.artifacts
            .place(
                ArtifactKind::Package,
                original_name,
                None,
                Bytes::copy_from_slice(data),
            )
            .await
            .expect("failed to place package")
    }

    /// Place a preview image artifact.
    pub async fn place_image(&self, original_name: &str, data: &[u8]) -> StoredArtifact {
        self.artifacts
            .place(
                ArtifactKind::Image,
                original_name,
                Some("image/png"),
                Bytes::copy_from_slice(data),
            )
            .await
            .expect("failed to place image")
    }

    /// Build an ingest request with valid metadata.
    pub fn request(
        &self,
        name: &str,
        main: StoredArtifact,
        original_name: &str,
        images: Vec<StoredArtifact>,
    ) -> IngestRequest {
        IngestRequest {
            main,
            original_name: original_name.to_string(),
            metadata: AddonMetadata {
                name: name.to_string(),
                author: None,
                description: format!("{name} description"),
                kind: None,
            },
            images,
        }
    }
}
