use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::rejection::{BytesRejection, FailedToBufferBody},
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use grantly_core::models::{BulkUploadReport, RawGrantRow};
use grantly_core::AppError;

use crate::auth::GrantedBy;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Bulk access-grant upload.
///
/// Accepts either a raw CSV body (`text/csv`) or a JSON array of row objects
/// (`application/json`); both transports run through the same validation
/// pipeline. The batch is all-or-nothing: a single error row blocks every
/// insert, and the report carries the full per-row breakdown either way.
///
/// The acting user comes from the `x-user-id` header and is recorded as
/// `granted_by` on every created grant.
#[utoipa::path(
    post,
    path = "/api/v0/grants/bulk",
    tag = "grants",
    request_body(
        content = String,
        content_type = "text/csv",
        description = "CSV with header user_email,system_name,instance_name,access_tier_name,notes, or a JSON array of the same fields"
    ),
    responses(
        (status = 200, description = "Upload processed; see `success` for the outcome", body = BulkUploadReport),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 401, description = "Missing or invalid x-user-id header", body = ErrorResponse),
        (status = 409, description = "Concurrent upload created an identical active grant", body = ErrorResponse),
        (status = 413, description = "Body exceeds the upload size limit", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, headers, body),
    fields(granted_by = %granted_by.0, operation = "bulk_upload_grants")
)]
pub async fn upload_grants(
    State(state): State<Arc<AppState>>,
    granted_by: GrantedBy,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<BulkUploadReport>, HttpAppError> {
    let body = body.map_err(|rejection| map_body_rejection(rejection, state.config.max_upload_bytes))?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let report = if content_type.starts_with("application/json") {
        let rows: Vec<RawGrantRow> = serde_json::from_slice(&body).map_err(|err| {
            AppError::BadRequest(format!("Invalid JSON body: expected an array of rows: {err}"))
        })?;
        state.bulk_upload.process_rows(rows, granted_by.0).await?
    } else {
        let content = std::str::from_utf8(&body)
            .map_err(|_| AppError::BadRequest("Upload body is not valid UTF-8".to_string()))?;
        state.bulk_upload.process_csv(content, granted_by.0).await?
    };

    Ok(Json(report))
}

/// Buffering failures become domain errors so the response body keeps the
/// documented JSON shape. An oversized body maps to 413.
fn map_body_rejection(rejection: BytesRejection, limit: usize) -> AppError {
    match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            AppError::PayloadTooLarge(format!("Upload body exceeds the {} byte limit", limit))
        }
        other => AppError::BadRequest(format!("Unreadable request body: {}", other)),
    }
}
