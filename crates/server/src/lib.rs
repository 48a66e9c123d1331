//! HTTP API server for the Workshop addon catalog.
//!
//! This crate provides the HTTP surface:
//! - Multipart addon upload with preview images
//! - Catalog listing (reconciled), retrieval, and deletion
//! - Download/view counting
//! - Aggregate statistics

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
