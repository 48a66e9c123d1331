//! Local filesystem artifact store.

use crate::error::{StorageError, StorageResult};
use crate::store::{
    ArtifactKind, ArtifactStore, ArtifactUpload, ByteStream, StoredArtifact, stored_name,
    validate_artifact,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;
use workshop_core::config::UploadConfig;

/// Default chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Filesystem-backed artifact store.
///
/// Artifacts live under two bucket directories below the root: `addons/` for
/// package archives and `images/` for previews. Writes go to a uuid-suffixed
/// temp file that is fsynced and renamed into place, so a key never exposes a
/// partially written artifact.
pub struct FilesystemStore {
    root: PathBuf,
    max_artifact_size: u64,
    package_extensions: Vec<String>,
}

impl FilesystemStore {
    /// Create a new filesystem store, creating the root and bucket
    /// directories if missing.
    pub async fn new(root: impl AsRef<Path>, upload: &UploadConfig) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(ArtifactKind::Package.bucket())).await?;
        fs::create_dir_all(root.join(ArtifactKind::Image.bucket())).await?;
        Ok(Self {
            root,
            max_artifact_size: upload.max_artifact_size,
            package_extensions: upload.package_extensions.clone(),
        })
    }

    /// Resolve a key below the storage root, rejecting traversal attempts.
    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(format!(
                "path traversal not allowed: {key}"
            )));
        }
        for component in Path::new(key).components() {
            match component {
                std::path::Component::Normal(_) => {}
                _ => {
                    return Err(StorageError::InvalidKey(format!(
                        "contains unsafe path component: {key}"
                    )));
                }
            }
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ArtifactStore for FilesystemStore {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn place_stream(
        &self,
        kind: ArtifactKind,
        original_name: &str,
        content_type: Option<&str>,
    ) -> StorageResult<Box<dyn ArtifactUpload>> {
        validate_artifact(kind, original_name, content_type, &self.package_extensions)?;

        let file_name = stored_name(original_name);
        let key = format!("{}/{}", kind.bucket(), file_name);
        let final_path = self.key_path(&key)?;
        let temp_path = final_path.with_file_name(format!("{file_name}.tmp.{}", Uuid::new_v4()));
        let file = fs::File::create(&temp_path).await?;

        Ok(Box::new(FilesystemUpload {
            file,
            temp_path,
            final_path,
            file_name,
            key,
            bytes_written: 0,
            max_size: self.max_artifact_size,
        }))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_path(key)?;
        fs::try_exists(&path).await.map_err(StorageError::Io)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn read(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_path(key)?;
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn read_stream(&self, key: &str) -> StorageResult<ByteStream> {
        use tokio::io::AsyncReadExt;

        let path = self.key_path(key)?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        // Stream the file in chunks instead of loading it entirely into memory
        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("storage root not accessible: {e}"),
            ))
        })?;

        if !metadata.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("storage root is not a directory: {:?}", self.root),
            )));
        }

        Ok(())
    }
}

/// Streaming placement for the filesystem store.
struct FilesystemUpload {
    file: fs::File,
    temp_path: PathBuf,
    final_path: PathBuf,
    file_name: String,
    key: String,
    bytes_written: u64,
    max_size: u64,
}

#[async_trait]
impl ArtifactUpload for FilesystemUpload {
    async fn write(&mut self, data: Bytes) -> StorageResult<()> {
        let size = self.bytes_written + data.len() as u64;
        if size > self.max_size {
            return Err(StorageError::TooLarge {
                size,
                max: self.max_size,
            });
        }
        self.file.write_all(&data).await?;
        self.bytes_written = size;
        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> StorageResult<StoredArtifact> {
        // Ensure all data is flushed to disk before rename
        self.file.sync_all().await?;
        drop(self.file);
        fs::rename(&self.temp_path, &self.final_path).await?;
        Ok(StoredArtifact {
            file_name: self.file_name,
            key: self.key,
            size: self.bytes_written,
        })
    }

    async fn abort(self: Box<Self>) -> StorageResult<()> {
        drop(self.file);
        let _ = fs::remove_file(&self.temp_path).await;
        Ok(())
    }
}
