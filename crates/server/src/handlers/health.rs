//! Health check handler.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /v1/health - Verify storage and catalog availability.
///
/// Intentionally unauthenticated, for load balancer probes.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.storage.health_check().await?;
    state.catalog.health_check().await?;
    Ok(Json(HealthResponse { status: "ok" }))
}
