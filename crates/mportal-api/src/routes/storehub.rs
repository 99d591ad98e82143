//! # StoreHub Sync Actions
//!
//! Staff-facing sync entry points and the scheduled batch endpoint:
//!
//! - **POST `/api/storehub/create`**: initial sync of a confirmed submission
//! - **POST `/api/storehub/manual-retry`**: retry one failed submission
//! - **POST `/api/storehub/cancel`**: give up on one failed submission
//! - **POST|GET `/api/storehub/retry`**: deprecated batch recovery, guarded
//!   by the automation secret instead of staff auth
//!
//! An integration failure is not an HTTP error: the attempt completed and
//! was recorded, so these endpoints answer 200 with `success: false`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use mportal_core::{SubmissionId, ValidationError};
use mportal_storehub::StoreHubClient;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{require_automation_secret, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::lifecycle::{self, BatchReport, Lifecycle, SyncAttempt};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Body of every single-submission action.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionActionRequest {
    /// Submission to act on.
    #[serde(default)]
    pub submission_id: Option<String>,
}

impl Validate for SubmissionActionRequest {
    fn validate(&self) -> Result<(), String> {
        match self.submission_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(()),
            _ => Err("Missing submissionId".to_string()),
        }
    }
}

impl SubmissionActionRequest {
    fn id(&self) -> Result<SubmissionId, AppError> {
        let raw = self.submission_id.as_deref().unwrap_or_default().trim();
        raw.parse::<SubmissionId>().map_err(|_| {
            ValidationError::InvalidReference {
                field: "submissionId",
                value: raw.to_string(),
            }
            .into()
        })
    }
}

/// Outcome of one sync attempt.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncResponse {
    pub success: bool,
    /// StoreHub response body on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// `StoreHub API error: <status>` or `StoreHub request failed: <error>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// StoreHub response text exactly as received, or the transport error,
    /// on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&SyncAttempt> for SyncResponse {
    fn from(attempt: &SyncAttempt) -> Self {
        let result = &attempt.result;
        if result.success {
            return Self {
                success: true,
                data: result.parsed_body.clone(),
                error: None,
                details: None,
            };
        }
        Self {
            success: false,
            data: None,
            error: result.error_message(),
            details: result.failure_detail(),
        }
    }
}

/// Cancel outcome.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Batch recovery outcome.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchRetryResponse {
    pub success: bool,
    pub message: String,
    pub results: BatchReport,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Staff-authenticated sync actions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/storehub/create", post(create_sync))
        .route("/api/storehub/manual-retry", post(manual_retry))
        .route("/api/storehub/cancel", post(cancel_submission))
}

/// Batch recovery, mounted outside staff auth.
pub fn batch_router() -> Router<AppState> {
    Router::new().route("/api/storehub/retry", post(batch_retry).get(batch_retry))
}

/// Configured StoreHub client, or 503.
pub(crate) fn storehub_client(state: &AppState) -> Result<&StoreHubClient, AppError> {
    state
        .storehub
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("StoreHub client not configured".into()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/storehub/create: Initial sync of a confirmed submission.
#[utoipa::path(
    post,
    path = "/api/storehub/create",
    request_body = SubmissionActionRequest,
    responses(
        (status = 200, description = "Attempt completed; see success flag", body = SyncResponse),
        (status = 401, description = "No acting staff member", body = crate::error::ErrorBody),
        (status = 404, description = "Submission not found", body = crate::error::ErrorBody),
        (status = 409, description = "Submission already synced or in flight", body = crate::error::ErrorBody),
        (status = 422, description = "Missing submissionId", body = crate::error::ErrorBody),
        (status = 503, description = "StoreHub not configured", body = crate::error::ErrorBody),
    ),
    tag = "storehub"
)]
async fn create_sync(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<SubmissionActionRequest>, JsonRejection>,
) -> Result<Json<SyncResponse>, AppError> {
    let actor = caller.require_actor()?;
    let id = extract_validated_json(body)?.id()?;
    let client = storehub_client(&state)?;

    let attempt = Lifecycle::new(&state.submissions, &state.call_logs, client)
        .sync_new(id, Some(actor))
        .await?;
    Ok(Json(SyncResponse::from(&attempt)))
}

/// POST /api/storehub/manual-retry: Retry one failed submission.
#[utoipa::path(
    post,
    path = "/api/storehub/manual-retry",
    request_body = SubmissionActionRequest,
    responses(
        (status = 200, description = "Attempt completed; see success flag", body = SyncResponse),
        (status = 401, description = "No acting staff member", body = crate::error::ErrorBody),
        (status = 404, description = "Submission not found", body = crate::error::ErrorBody),
        (status = 409, description = "Can only retry failed submissions", body = crate::error::ErrorBody),
        (status = 422, description = "Missing submissionId", body = crate::error::ErrorBody),
        (status = 503, description = "StoreHub not configured", body = crate::error::ErrorBody),
    ),
    tag = "storehub"
)]
async fn manual_retry(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<SubmissionActionRequest>, JsonRejection>,
) -> Result<Json<SyncResponse>, AppError> {
    let actor = caller.require_actor()?;
    let id = extract_validated_json(body)?.id()?;
    let client = storehub_client(&state)?;

    let attempt = Lifecycle::new(&state.submissions, &state.call_logs, client)
        .retry(id, actor)
        .await?;
    Ok(Json(SyncResponse::from(&attempt)))
}

/// POST /api/storehub/cancel: Cancel one failed submission.
#[utoipa::path(
    post,
    path = "/api/storehub/cancel",
    request_body = SubmissionActionRequest,
    responses(
        (status = 200, description = "Submission cancelled successfully", body = CancelResponse),
        (status = 401, description = "No acting staff member", body = crate::error::ErrorBody),
        (status = 404, description = "Submission not found", body = crate::error::ErrorBody),
        (status = 409, description = "Can only cancel failed submissions", body = crate::error::ErrorBody),
        (status = 422, description = "Missing submissionId", body = crate::error::ErrorBody),
    ),
    tag = "storehub"
)]
async fn cancel_submission(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<SubmissionActionRequest>, JsonRejection>,
) -> Result<Json<CancelResponse>, AppError> {
    let actor = caller.require_actor()?;
    let id = extract_validated_json(body)?.id()?;

    lifecycle::cancel(&state.submissions, id, actor).await?;
    Ok(Json(CancelResponse {
        success: true,
        message: Some("Submission cancelled successfully".to_string()),
    }))
}

/// POST|GET /api/storehub/retry: Deprecated batch recovery.
///
/// Retries up to ten of the oldest failed submissions that have not yet
/// reached the retry ceiling.
#[utoipa::path(
    post,
    path = "/api/storehub/retry",
    responses(
        (status = 200, description = "Batch completed", body = BatchRetryResponse),
        (status = 401, description = "Missing or wrong automation secret", body = crate::error::ErrorBody),
        (status = 503, description = "StoreHub not configured", body = crate::error::ErrorBody),
    ),
    tag = "storehub"
)]
async fn batch_retry(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    require_automation_secret(&headers, state.config.automation_secret.as_ref())?;
    let client = storehub_client(&state)?;

    tracing::warn!("deprecated batch recovery endpoint invoked");
    let report = Lifecycle::new(&state.submissions, &state.call_logs, client)
        .retry_batch()
        .await;

    let mut response_headers = HeaderMap::new();
    response_headers.insert("deprecation", HeaderValue::from_static("true"));
    Ok((
        response_headers,
        Json(BatchRetryResponse {
            success: true,
            message: format!(
                "Processed {} submissions: {} succeeded, {} failed",
                report.total, report.succeeded, report.failed
            ),
            results: report,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use mportal_core::ActorId;
    use tower::ServiceExt;

    fn test_app(state: AppState) -> Router {
        let caller = CallerIdentity {
            actor_id: Some(ActorId::from_uuid(uuid::Uuid::new_v4())),
        };
        super::router()
            .merge(super::batch_router())
            .layer(axum::Extension(caller))
            .with_state(state)
    }

    async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_submission_id_rejected() {
        let (status, body) =
            post_json(test_app(AppState::new()), "/api/storehub/cancel", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["message"], "Missing submissionId");
    }

    #[tokio::test]
    async fn cancel_unknown_submission_not_found() {
        let (status, body) = post_json(
            test_app(AppState::new()),
            "/api/storehub/cancel",
            serde_json::json!({ "submissionId": SubmissionId::new() }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Submission not found");
    }

    #[tokio::test]
    async fn retry_without_client_unavailable() {
        let (status, _) = post_json(
            test_app(AppState::new()),
            "/api/storehub/manual-retry",
            serde_json::json!({ "submissionId": SubmissionId::new() }),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn malformed_submission_id_is_validation_error() {
        let (status, body) = post_json(
            test_app(AppState::new()),
            "/api/storehub/cancel",
            serde_json::json!({ "submissionId": "not-a-uuid" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields = &body["error"]["details"]["fields"];
        assert!(fields["submissionId"]
            .as_str()
            .unwrap()
            .contains("not-a-uuid"));
        assert!(fields.get("id").is_none());
    }

    #[tokio::test]
    async fn batch_retry_without_secret_configured_rejected() {
        let app = test_app(AppState::new());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/storehub/retry")
                    .header("authorization", "Bearer anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn sync_response_from_transport_failure() {
        let attempt = SyncAttempt {
            submission: crate::state::test_support::submission(),
            result: mportal_storehub::SyncResult {
                success: false,
                http_status: None,
                raw_body: None,
                parsed_body: None,
                duration_ms: 3,
                transport_error: Some("connection refused".into()),
            },
            call_log_id: None,
            call_log_error: None,
        };
        let response = SyncResponse::from(&attempt);
        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("StoreHub request failed: connection refused")
        );
        assert_eq!(response.details.as_deref(), Some("connection refused"));
    }

    #[test]
    fn sync_response_details_keep_raw_body_text() {
        let raw = "{ \"error\" : \"duplicate\" }\n";
        let attempt = SyncAttempt {
            submission: crate::state::test_support::submission(),
            result: mportal_storehub::SyncResult {
                success: false,
                http_status: Some(409),
                raw_body: Some(raw.into()),
                parsed_body: Some(serde_json::json!({ "error": "duplicate" })),
                duration_ms: 12,
                transport_error: None,
            },
            call_log_id: None,
            call_log_error: None,
        };
        let response = SyncResponse::from(&attempt);
        assert_eq!(response.error.as_deref(), Some("StoreHub API error: 409"));
        assert_eq!(response.details.as_deref(), Some(raw));

        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["details"], serde_json::Value::String(raw.into()));
        assert!(wire.get("data").is_none());
    }
}
