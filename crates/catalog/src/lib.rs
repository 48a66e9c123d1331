//! Catalog store and reconciliation engine for Workshop.
//!
//! This crate owns the control-plane data model and the invariants around it:
//! - Addon records with content-addressed dedup (unique `file_hash`)
//! - The read-time reconciliation pass that purges records whose backing
//!   artifacts vanished and trims dangling image references
//! - Upload ingest and delete orchestration with cleanup on every rejection
//! - Usage statistics aggregation

pub mod dedup;
pub mod error;
pub mod ingest;
pub mod models;
pub mod reconcile;
pub mod stats;
pub mod store;

pub use dedup::DuplicateDetector;
pub use error::{CatalogError, CatalogResult};
pub use ingest::{IngestError, IngestRequest, delete_addon, ingest_addon};
pub use models::AddonRecord;
pub use reconcile::reconcile_and_list;
pub use stats::{CatalogStats, compute_stats};
pub use store::{CatalogStore, SqliteStore};

use std::sync::Arc;
use workshop_core::config::CatalogConfig;

/// Create a catalog store from configuration.
pub async fn from_config(config: &CatalogConfig) -> CatalogResult<Arc<dyn CatalogStore>> {
    match config {
        CatalogConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn CatalogStore>)
        }
    }
}
