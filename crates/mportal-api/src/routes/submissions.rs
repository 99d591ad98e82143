//! # Submission & Call-Log Queries
//!
//! Read-only views backing the staff recovery screen:
//!
//! - **GET `/v1/submissions/failed`**: failed submissions, most recently updated first
//! - **GET `/v1/submissions/{id}`**: one submission
//! - **GET `/v1/submissions/{id}/call-logs`**: its StoreHub attempts, oldest first
//! - **GET `/v1/call-logs`**: recent attempts across all submissions

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use mportal_core::SubmissionId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::state::{AppState, CallLogRecord, SubmissionRecord};

/// Default page size for `/v1/call-logs`.
pub const DEFAULT_CALL_LOG_LIMIT: usize = 50;

/// Largest page `/v1/call-logs` will return.
pub const MAX_CALL_LOG_LIMIT: usize = 500;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallLogQuery {
    /// Entries to return (default 50, max 500).
    pub limit: Option<usize>,
}

impl CallLogQuery {
    fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_CALL_LOG_LIMIT)
            .clamp(1, MAX_CALL_LOG_LIMIT)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    pub success: bool,
    pub data: SubmissionRecord,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionListResponse {
    pub success: bool,
    pub data: Vec<SubmissionRecord>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallLogListResponse {
    pub success: bool,
    pub data: Vec<CallLogRecord>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/submissions/failed", get(list_failed))
        .route("/v1/submissions/{id}", get(get_submission))
        .route("/v1/submissions/{id}/call-logs", get(submission_call_logs))
        .route("/v1/call-logs", get(recent_call_logs))
}

fn parse_id(raw: &str) -> Result<SubmissionId, AppError> {
    Ok(raw.parse::<SubmissionId>()?)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /v1/submissions/failed: Submissions awaiting staff recovery.
#[utoipa::path(
    get,
    path = "/v1/submissions/failed",
    responses(
        (status = 200, description = "Failed submissions, most recently updated first", body = SubmissionListResponse),
    ),
    tag = "submissions"
)]
async fn list_failed(State(state): State<AppState>) -> Json<SubmissionListResponse> {
    Json(SubmissionListResponse {
        success: true,
        data: state.submissions.list_failed(),
    })
}

/// GET /v1/submissions/{id}: One submission.
#[utoipa::path(
    get,
    path = "/v1/submissions/{id}",
    params(("id" = String, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission found", body = SubmissionResponse),
        (status = 404, description = "Submission not found", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed submission ID", body = crate::error::ErrorBody),
    ),
    tag = "submissions"
)]
async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(SubmissionResponse {
        success: true,
        data: state.submissions.get(id)?,
    }))
}

/// GET /v1/submissions/{id}/call-logs: StoreHub attempts for one submission.
#[utoipa::path(
    get,
    path = "/v1/submissions/{id}/call-logs",
    params(("id" = String, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Call-log entries, oldest first", body = CallLogListResponse),
        (status = 404, description = "Submission not found", body = crate::error::ErrorBody),
    ),
    tag = "submissions"
)]
async fn submission_call_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CallLogListResponse>, AppError> {
    let id = parse_id(&id)?;
    state.submissions.get(id)?;
    Ok(Json(CallLogListResponse {
        success: true,
        data: state.call_logs.for_submission(id).await?,
    }))
}

/// GET /v1/call-logs: Most recent StoreHub attempts.
#[utoipa::path(
    get,
    path = "/v1/call-logs",
    params(CallLogQuery),
    responses(
        (status = 200, description = "Call-log entries, newest first", body = CallLogListResponse),
        (status = 500, description = "Call log could not be read", body = crate::error::ErrorBody),
    ),
    tag = "submissions"
)]
async fn recent_call_logs(
    State(state): State<AppState>,
    Query(query): Query<CallLogQuery>,
) -> Result<Json<CallLogListResponse>, AppError> {
    Ok(Json(CallLogListResponse {
        success: true,
        data: state.call_logs.recent(query.effective_limit()).await?,
    }))
}
