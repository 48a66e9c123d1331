//! Addon retrieval and mutation handlers.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use uuid::Uuid;
use workshop_catalog::{AddonRecord, delete_addon as delete_addon_cascade, reconcile_and_list};

/// Response for the addon listing.
#[derive(Debug, Serialize)]
pub struct AddonListResponse {
    pub addons: Vec<AddonRecord>,
    pub total: usize,
}

/// Response for a recorded download.
#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub downloads: i64,
}

/// GET /v1/addons - List all addons, newest first.
///
/// Runs the reconciliation pass before answering, so the listing only
/// contains records whose artifacts still exist.
#[tracing::instrument(skip(state))]
pub async fn list_addons(State(state): State<AppState>) -> ApiResult<Json<AddonListResponse>> {
    let addons = reconcile_and_list(state.catalog.as_ref(), state.storage.as_ref()).await?;
    Ok(Json(AddonListResponse {
        total: addons.len(),
        addons,
    }))
}

/// GET /v1/addons/{id} - Fetch one addon, counting the view.
#[tracing::instrument(skip(state))]
pub async fn get_addon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AddonRecord>> {
    if !state.catalog.increment_views(id).await? {
        return Err(ApiError::NotFound(format!("addon {id} not found")));
    }
    let record = state
        .catalog
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("addon {id} not found")))?;
    Ok(Json(record))
}

/// POST /v1/addons/{id}/download - Record a download.
#[tracing::instrument(skip(state))]
pub async fn record_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DownloadResponse>> {
    if !state.catalog.increment_downloads(id).await? {
        return Err(ApiError::NotFound(format!("addon {id} not found")));
    }
    let record = state
        .catalog
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("addon {id} not found")))?;
    Ok(Json(DownloadResponse {
        downloads: record.downloads,
    }))
}

/// DELETE /v1/addons/{id} - Delete an addon and its artifacts.
#[tracing::instrument(skip(state))]
pub async fn delete_addon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = delete_addon_cascade(state.catalog.as_ref(), state.storage.as_ref(), id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("addon {id} not found")));
    }
    tracing::info!(addon_id = %id, "addon deleted");
    Ok(StatusCode::NO_CONTENT)
}
