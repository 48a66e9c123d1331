//! Artifact store trait definitions and placement policy.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Logical bucket an artifact is placed in.
///
/// Routing is by declared kind only; content is never inspected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Main addon package archive.
    Package,
    /// Preview image.
    Image,
}

impl ArtifactKind {
    /// Bucket prefix for this kind.
    pub fn bucket(&self) -> &'static str {
        match self {
            Self::Package => "addons",
            Self::Image => "images",
        }
    }
}

/// A successfully placed artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Generated stored file name.
    pub file_name: String,
    /// Storage key (bucket-prefixed, relative to the storage root).
    pub key: String,
    /// Size in bytes.
    pub size: u64,
}

/// Handle for a streaming artifact placement.
///
/// The caller writes chunks and then either finishes (atomic rename into the
/// bucket) or aborts (temp file discarded). A `write` that would exceed the
/// size cap fails with `TooLarge`; the caller must abort afterwards.
#[async_trait]
pub trait ArtifactUpload: Send {
    /// Write a chunk of data.
    async fn write(&mut self, data: Bytes) -> StorageResult<()>;

    /// Finish the upload and return the placed artifact.
    async fn finish(self: Box<Self>) -> StorageResult<StoredArtifact>;

    /// Abort the upload, discarding the partial write.
    async fn abort(self: Box<Self>) -> StorageResult<()>;
}

/// Artifact store abstraction.
///
/// Owns placement, naming, validation, and deletion of artifact files.
/// Deleting an absent key fails with `NotFound`; best-effort cleanup callers
/// (reconciliation, delete cascades) swallow that error.
#[async_trait]
pub trait ArtifactStore: Send + Sync + 'static {
    /// Start a streaming placement.
    ///
    /// Validates the original name against the package extension allow-list
    /// (for packages) or the declared content type against the image
    /// allow-list (for images) before anything is written.
    async fn place_stream(
        &self,
        kind: ArtifactKind,
        original_name: &str,
        content_type: Option<&str>,
    ) -> StorageResult<Box<dyn ArtifactUpload>>;

    /// Place a buffered artifact in one call.
    async fn place(
        &self,
        kind: ArtifactKind,
        original_name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> StorageResult<StoredArtifact> {
        let mut upload = self.place_stream(kind, original_name, content_type).await?;
        if let Err(e) = upload.write(data).await {
            let _ = upload.abort().await;
            return Err(e);
        }
        upload.finish().await
    }

    /// Check whether an artifact exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Read an artifact's full content.
    async fn read(&self, key: &str) -> StorageResult<Bytes>;

    /// Read an artifact as a byte stream.
    async fn read_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Delete a previously placed artifact.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Verify the storage backend is usable.
    async fn health_check(&self) -> StorageResult<()>;
}

/// Validate an artifact declaration against the placement policy.
pub(crate) fn validate_artifact(
    kind: ArtifactKind,
    original_name: &str,
    content_type: Option<&str>,
    package_extensions: &[String],
) -> StorageResult<()> {
    match kind {
        ArtifactKind::Package => {
            let lower = original_name.to_ascii_lowercase();
            if !package_extensions.iter().any(|ext| lower.ends_with(ext)) {
                return Err(StorageError::InvalidArtifactType(format!(
                    "'{original_name}' is not an allowed package format ({})",
                    package_extensions.join(", ")
                )));
            }
        }
        ArtifactKind::Image => {
            let ct = content_type.unwrap_or("");
            if !ct.starts_with("image/") {
                return Err(StorageError::InvalidArtifactType(format!(
                    "'{ct}' is not an image content type"
                )));
            }
        }
    }
    Ok(())
}

/// Generate a collision-resistant stored file name.
///
/// Combines a millisecond timestamp and a random suffix with the sanitized
/// original name, preserving traceability while guaranteeing concurrent
/// uploads of the same file never overwrite each other.
pub(crate) fn stored_name(original_name: &str) -> String {
    let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: u32 = rand::random();
    format!("{millis}-{suffix}-{}", sanitize_name(original_name))
}

/// Reduce a client-supplied file name to a safe single path component.
fn sanitize_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(['.', '_']).is_empty() {
        "artifact".to_string()
    } else {
        cleaned
    }
}
