//! Common test utilities and fixtures.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use workshop_catalog::{CatalogStore, SqliteStore};
use workshop_core::config::{AppConfig, CatalogConfig, StorageConfig};
use workshop_server::{AppState, create_router};
use workshop_storage::{ArtifactStore, FilesystemStore};

const BOUNDARY: &str = "workshop-test-boundary";

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage.
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp directory");
        let mut config = AppConfig::for_testing();

        let storage_path = temp_dir.path().join("artifacts");
        let storage: Arc<dyn ArtifactStore> = Arc::new(
            FilesystemStore::new(&storage_path, &config.upload)
                .await
                .expect("failed to create artifact store"),
        );

        let db_path = temp_dir.path().join("catalog.db");
        let catalog: Arc<dyn CatalogStore> = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .expect("failed to create catalog store"),
        );

        config.storage = StorageConfig::Filesystem {
            path: storage_path,
        };
        config.catalog = CatalogConfig::Sqlite { path: db_path };

        let state = AppState::new(config, storage, catalog);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Send a request and decode the JSON response body.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header("Content-Type", ct);
        }
        let request = builder.body(Body::from(body)).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Send a GET request.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None, Vec::new()).await
    }

    /// Send a POST request with an empty body.
    pub async fn post(&self, uri: &str) -> (StatusCode, Value) {
        self.request("POST", uri, None, Vec::new()).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, None, Vec::new()).await
    }

    /// Upload an addon through the multipart endpoint.
    pub async fn upload(&self, upload: UploadFixture<'_>) -> (StatusCode, Value) {
        let body = upload.build();
        self.request(
            "POST",
            "/v1/addons",
            Some(&format!("multipart/form-data; boundary={BOUNDARY}")),
            body,
        )
        .await
    }

    /// Number of files currently in a storage bucket.
    pub fn bucket_file_count(&self, bucket: &str) -> usize {
        let dir = self._temp_dir.path().join("artifacts").join(bucket);
        match std::fs::read_dir(dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

/// Declarative multipart upload body for tests.
#[allow(dead_code)]
pub struct UploadFixture<'a> {
    pub name: Option<&'a str>,
    pub author: Option<&'a str>,
    pub description: Option<&'a str>,
    pub kind: Option<&'a str>,
    pub file: Option<(&'a str, &'a [u8])>,
    pub images: Vec<(&'a str, &'a str, &'a [u8])>,
}

#[allow(dead_code)]
impl<'a> UploadFixture<'a> {
    /// A valid upload with the given display name, file name, and content.
    pub fn valid(name: &'a str, file_name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name: Some(name),
            author: None,
            description: Some("test description"),
            kind: None,
            file: Some((file_name, data)),
            images: Vec::new(),
        }
    }

    /// Attach a preview image under the given field name.
    pub fn with_image(mut self, field: &'a str, file_name: &'a str, data: &'a [u8]) -> Self {
        self.images.push((field, file_name, data));
        self
    }

    /// Encode as a multipart/form-data body.
    pub fn build(&self) -> Vec<u8> {
        let mut body = Vec::new();

        let mut text = |name: &str, value: &str| {
            let part = format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            );
            body.extend_from_slice(part.as_bytes());
        };

        if let Some(name) = self.name {
            text("name", name);
        }
        if let Some(author) = self.author {
            text("author", author);
        }
        if let Some(description) = self.description {
            text("description", description);
        }
        if let Some(kind) = self.kind {
            text("kind", kind);
        }

        if let Some((file_name, data)) = self.file {
            let header = format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            );
            body.extend_from_slice(header.as_bytes());
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }

        for (field, file_name, data) in &self.images {
            let header = format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            );
            body.extend_from_slice(header.as_bytes());
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }
}
