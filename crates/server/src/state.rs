//! Application state shared across handlers.

use std::sync::Arc;
use workshop_catalog::CatalogStore;
use workshop_core::config::AppConfig;
use workshop_storage::ArtifactStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Artifact storage backend.
    pub storage: Arc<dyn ArtifactStore>,
    /// Catalog metadata store.
    pub catalog: Arc<dyn CatalogStore>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ArtifactStore>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            catalog,
        }
    }
}
