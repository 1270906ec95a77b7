//! OpenAPI documentation, served at /api-docs/openapi.json.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use grantly_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Grantly API",
        version = "0.1.0",
        description = "Bulk access-grant management. Upload a CSV (or JSON array) of grant rows; the batch is validated as a whole and inserted all-or-nothing. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::bulk_upload::upload_grants,
        handlers::health::health,
    ),
    components(schemas(
        models::BulkUploadReport,
        models::UploadSummary,
        models::UploadRow,
        models::RawGrantRow,
        models::ValidRow,
        models::ErrorRow,
        models::ResolvedGrant,
        models::GrantDetails,
        models::GrantStatus,
        handlers::health::HealthResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "grants", description = "Bulk grant upload"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
