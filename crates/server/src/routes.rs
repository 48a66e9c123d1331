//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use workshop_core::MAX_IMAGES_PER_ADDON;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    // One request may carry the package plus every image slot; the
    // per-artifact cap is enforced separately by the artifact store.
    let body_limit = state
        .config
        .upload
        .max_artifact_size
        .saturating_mul(MAX_IMAGES_PER_ADDON as u64 + 1)
        .saturating_add(1024 * 1024);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/v1/addons",
            post(handlers::upload_addon).get(handlers::list_addons),
        )
        .route(
            "/v1/addons/{id}",
            get(handlers::get_addon).delete(handlers::delete_addon),
        )
        .route("/v1/addons/{id}/download", post(handlers::record_download))
        .route("/v1/stats", get(handlers::get_stats))
        // Health check (intentionally unauthenticated for load balancers/k8s probes)
        .route("/v1/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
