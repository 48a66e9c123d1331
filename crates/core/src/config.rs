//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Artifact storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for stored artifacts.
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/artifacts"),
        }
    }
}

/// Catalog (metadata) store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogConfig {
    /// SQLite-backed catalog.
    Sqlite {
        /// Path to the database file.
        path: PathBuf,
    },
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/catalog.db"),
        }
    }
}

/// Upload acceptance policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum size per uploaded artifact in bytes.
    #[serde(default = "default_max_artifact_size")]
    pub max_artifact_size: u64,
    /// Allowed package file extensions (lowercase, with leading dot).
    #[serde(default = "default_package_extensions")]
    pub package_extensions: Vec<String>,
}

fn default_max_artifact_size() -> u64 {
    crate::DEFAULT_MAX_ARTIFACT_SIZE
}

fn default_package_extensions() -> Vec<String> {
    [".mcaddon", ".zip", ".rar", ".mcpack"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_artifact_size: default_max_artifact_size(),
            package_extensions: default_package_extensions(),
        }
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

impl AppConfig {
    /// Create a test configuration with defaults.
    ///
    /// **For testing only.** Tests typically override the storage and catalog
    /// paths with temporary directories.
    pub fn for_testing() -> Self {
        Self::default()
    }
}
