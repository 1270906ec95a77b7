//! Route configuration.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/v0/grants/bulk", post(handlers::bulk_upload::upload_grants))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Default axum limit is 2 MB; uploads are bounded by config instead.
        // The bulk upload handler turns the limit rejection into a 413 with
        // the standard error body.
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
