//! # OpenAPI Document Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Member Portal API",
        version = "0.1.0",
        description = "Member registration intake, StoreHub customer sync, and staff recovery tooling.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Registrations
        crate::routes::registrations::check_passport,
        crate::routes::registrations::register_member,
        // Submissions
        crate::routes::submissions::list_failed,
        crate::routes::submissions::get_submission,
        crate::routes::submissions::submission_call_logs,
        crate::routes::submissions::recent_call_logs,
        // StoreHub
        crate::routes::storehub::create_sync,
        crate::routes::storehub::manual_retry,
        crate::routes::storehub::cancel_submission,
        crate::routes::storehub::batch_retry,
    ),
    components(schemas(
        // State record types
        crate::state::SubmissionRecord,
        crate::state::CallLogRecord,
        crate::lifecycle::BatchReport,
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Registration DTOs
        crate::routes::registrations::RegistrationRequest,
        crate::routes::registrations::RegistrationResponse,
        crate::routes::registrations::CheckPassportRequest,
        crate::routes::registrations::CheckPassportResponse,
        // Submission DTOs
        crate::routes::submissions::SubmissionResponse,
        crate::routes::submissions::SubmissionListResponse,
        crate::routes::submissions::CallLogListResponse,
        // StoreHub DTOs
        crate::routes::storehub::SubmissionActionRequest,
        crate::routes::storehub::SyncResponse,
        crate::routes::storehub::CancelResponse,
        crate::routes::storehub::BatchRetryResponse,
    )),
    tags(
        (name = "registrations", description = "Member registration intake"),
        (name = "submissions", description = "Submission and call-log queries"),
        (name = "storehub", description = "StoreHub sync actions and batch recovery"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
