//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use workshop_catalog::{CatalogError, IngestError};
use workshop_storage::StorageError;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

fn storage_code(e: &StorageError) -> &'static str {
    match e {
        StorageError::NotFound(_) => "not_found",
        StorageError::InvalidArtifactType(_) => "invalid_artifact_type",
        StorageError::TooLarge { .. } => "artifact_too_large",
        StorageError::InvalidKey(_) => "bad_request",
        _ => "storage_error",
    }
}

fn storage_status(e: &StorageError) -> StatusCode {
    match e {
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::InvalidArtifactType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        StorageError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        StorageError::InvalidKey(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn catalog_code(e: &CatalogError) -> &'static str {
    match e {
        CatalogError::NotFound(_) => "not_found",
        CatalogError::DuplicateHash(_) => "duplicate_addon",
        _ => "catalog_error",
    }
}

fn catalog_status(e: &CatalogError) -> StatusCode {
    match e {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::DuplicateHash(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
            Self::Storage(e) => storage_code(e),
            Self::Catalog(e) => catalog_code(e),
            Self::Ingest(e) => match e {
                IngestError::MissingFields(_) => "missing_fields",
                IngestError::Duplicate { .. } => "duplicate_addon",
                IngestError::TooManyImages(_) => "bad_request",
                IngestError::Storage(e) => storage_code(e),
                IngestError::Catalog(e) => catalog_code(e),
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(e) => storage_status(e),
            Self::Catalog(e) => catalog_status(e),
            Self::Ingest(e) => match e {
                IngestError::MissingFields(_) => StatusCode::BAD_REQUEST,
                IngestError::Duplicate { .. } => StatusCode::CONFLICT,
                IngestError::TooManyImages(_) => StatusCode::BAD_REQUEST,
                IngestError::Storage(e) => storage_status(e),
                IngestError::Catalog(e) => catalog_status(e),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
