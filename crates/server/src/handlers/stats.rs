//! Catalog statistics handler.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use workshop_catalog::{CatalogStats, compute_stats, reconcile_and_list};

/// GET /v1/stats - Aggregate usage statistics over the live catalog.
#[tracing::instrument(skip(state))]
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<CatalogStats>> {
    let records = reconcile_and_list(state.catalog.as_ref(), state.storage.as_ref()).await?;
    Ok(Json(compute_stats(&records)))
}
