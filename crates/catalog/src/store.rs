//! Catalog store trait and SQLite implementation.

use crate::error::{CatalogError, CatalogResult};
use crate::models::{AddonRecord, AddonRow, encode_images};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;
use workshop_core::ImageRef;

/// Idempotent schema for the addon catalog.
///
/// The UNIQUE constraint on `file_hash` is load-bearing: it is the only thing
/// that prevents two concurrent uploads of identical content from both
/// inserting. The loser of that race gets a constraint violation, surfaced as
/// [`CatalogError::DuplicateHash`].
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS addons (
    addon_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    author TEXT NOT NULL,
    description TEXT NOT NULL,
    kind TEXT NOT NULL,
    file_hash TEXT NOT NULL UNIQUE,
    file_name TEXT NOT NULL,
    original_name TEXT NOT NULL,
    file_key TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    images TEXT NOT NULL DEFAULT '[]',
    uploaded_at TEXT NOT NULL,
    downloads INTEGER NOT NULL DEFAULT 0,
    views INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_addons_uploaded_at ON addons(uploaded_at);
"#;

/// Catalog metadata store.
///
/// Counter increments happen at the storage layer as single UPDATE
/// statements, never as read-modify-write in the caller, so concurrent
/// increments on the same record are all reflected.
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    /// Insert a new addon record.
    ///
    /// Fails with [`CatalogError::DuplicateHash`] when a live record already
    /// carries the same `file_hash`.
    async fn insert(&self, record: &AddonRecord) -> CatalogResult<()>;

    /// Fetch a record by id.
    async fn get_by_id(&self, id: Uuid) -> CatalogResult<Option<AddonRecord>>;

    /// Fetch a record by content hash.
    async fn get_by_hash(&self, file_hash: &str) -> CatalogResult<Option<AddonRecord>>;

    /// Plain snapshot of all records, newest upload first.
    ///
    /// This does NOT reconcile against the artifact store; callers that want
    /// the self-healing listing use [`crate::reconcile_and_list`].
    async fn list_all(&self) -> CatalogResult<Vec<AddonRecord>>;

    /// Persist a shrunk image list for a record (images column only).
    async fn update_images(&self, id: Uuid, images: &[ImageRef]) -> CatalogResult<()>;

    /// Delete a record row. Returns false for an unknown id (not an error).
    async fn delete_record(&self, id: Uuid) -> CatalogResult<bool>;

    /// Atomically bump the download counter. Returns false for an unknown id.
    async fn increment_downloads(&self, id: Uuid) -> CatalogResult<bool>;

    /// Atomically bump the view counter. Returns false for an unknown id.
    async fn increment_views(&self, id: Uuid) -> CatalogResult<bool>;

    /// Apply the schema.
    async fn migrate(&self) -> CatalogResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> CatalogResult<()>;
}

/// SQLite-based catalog store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store and apply the schema.
    pub async fn new(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under server concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

/// Whether a sqlx error is the file_hash uniqueness violation.
fn is_file_hash_conflict(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        db_err.message().contains("UNIQUE constraint failed") && db_err.message().contains("file_hash")
    } else {
        false
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn insert(&self, record: &AddonRecord) -> CatalogResult<()> {
        let images = record.images_json()?;
        let result = sqlx::query(
            r#"
            INSERT INTO addons (
                addon_id, name, author, description, kind, file_hash, file_name,
                original_name, file_key, size_bytes, images, uploaded_at,
                downloads, views
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.author)
        .bind(&record.description)
        .bind(&record.kind)
        .bind(&record.file_hash)
        .bind(&record.file_name)
        .bind(&record.original_name)
        .bind(&record.file_key)
        .bind(record.size)
        .bind(&images)
        .bind(record.uploaded_at)
        .bind(record.downloads)
        .bind(record.views)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_file_hash_conflict(&e) => {
                Err(CatalogError::DuplicateHash(record.file_hash.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> CatalogResult<Option<AddonRecord>> {
        let row = sqlx::query_as::<_, AddonRow>("SELECT * FROM addons WHERE addon_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(AddonRow::into_record).transpose()
    }

    async fn get_by_hash(&self, file_hash: &str) -> CatalogResult<Option<AddonRecord>> {
        let row = sqlx::query_as::<_, AddonRow>("SELECT * FROM addons WHERE file_hash = ?")
            .bind(file_hash)
            .fetch_optional(&self.pool)
            .await?;
        row.map(AddonRow::into_record).transpose()
    }

    async fn list_all(&self) -> CatalogResult<Vec<AddonRecord>> {
        let rows = sqlx::query_as::<_, AddonRow>(
            "SELECT * FROM addons ORDER BY uploaded_at DESC, addon_id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        // One undecodable row must not hide the rest of the catalog.
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let addon_id = row.addon_id;
            match row.into_record() {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(addon_id = %addon_id, error = %e, "skipping undecodable addon row");
                }
            }
        }
        Ok(records)
    }

    async fn update_images(&self, id: Uuid, images: &[ImageRef]) -> CatalogResult<()> {
        let images = encode_images(images)?;
        let result = sqlx::query("UPDATE addons SET images = ? WHERE addon_id = ?")
            .bind(&images)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(format!("addon {id} not found")));
        }
        Ok(())
    }

    async fn delete_record(&self, id: Uuid) -> CatalogResult<bool> {
        let result = sqlx::query("DELETE FROM addons WHERE addon_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_downloads(&self, id: Uuid) -> CatalogResult<bool> {
        let result =
            sqlx::query("UPDATE addons SET downloads = downloads + 1 WHERE addon_id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_views(&self, id: Uuid) -> CatalogResult<bool> {
        let result = sqlx::query("UPDATE addons SET views = views + 1 WHERE addon_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn migrate(&self) -> CatalogResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> CatalogResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
