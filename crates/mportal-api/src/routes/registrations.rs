//! # Member Registration API
//!
//! - **POST `/v1/registrations/check`**: pre-submit duplicate check
//! - **POST `/v1/registrations`**: validate, create, and sync to StoreHub
//!
//! Validation runs before any mutation. A passport that normalizes to an
//! existing submission's passport is rejected as a field error on
//! `passport_number`, both here and at the store.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use mportal_core::{normalize_passport, MemberForm, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::lifecycle::Lifecycle;
use crate::routes::storehub::SyncResponse;
use crate::state::{AppState, SubmissionRecord};
use crate::submissions::StoreError;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Registration form as submitted by staff.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub passport_number: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// YYYY-MM-DD.
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub nationality: String,
}

impl From<RegistrationRequest> for MemberForm {
    fn from(req: RegistrationRequest) -> Self {
        MemberForm {
            passport_number: req.passport_number,
            first_name: req.first_name,
            last_name: req.last_name,
            date_of_birth: req.date_of_birth,
            nationality: req.nationality,
        }
    }
}

/// Result of a registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationResponse {
    /// `false` only when the StoreHub sync failed; the submission is kept.
    pub success: bool,
    /// The submission after the sync attempt.
    pub data: SubmissionRecord,
    /// Sync outcome, absent when no StoreHub client is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncResponse>,
}

/// Pre-submit duplicate check.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckPassportRequest {
    #[serde(default)]
    pub passport_number: String,
}

impl Validate for CheckPassportRequest {
    fn validate(&self) -> Result<(), String> {
        if self.passport_number.trim().is_empty() {
            return Err("passport_number is required".to_string());
        }
        Ok(())
    }
}

/// Result of a duplicate check.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckPassportResponse {
    pub success: bool,
    /// Whether no submission uses this passport yet.
    pub available: bool,
    pub normalized_passport: String,
    #[schema(value_type = String, format = Uuid)]
    pub ref_id: mportal_core::RefId,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/registrations", post(register_member))
        .route("/v1/registrations/check", post(check_passport))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/registrations/check: Is this passport still available?
#[utoipa::path(
    post,
    path = "/v1/registrations/check",
    request_body = CheckPassportRequest,
    responses(
        (status = 200, description = "Availability and derived identifiers", body = CheckPassportResponse),
        (status = 422, description = "Missing passport number", body = crate::error::ErrorBody),
    ),
    tag = "registrations"
)]
async fn check_passport(
    State(state): State<AppState>,
    body: Result<Json<CheckPassportRequest>, JsonRejection>,
) -> Result<Json<CheckPassportResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let passport = normalize_passport(&req.passport_number);
    let available = state.submissions.find_by_passport(&passport).is_none();

    Ok(Json(CheckPassportResponse {
        success: true,
        available,
        ref_id: passport.ref_id(),
        normalized_passport: passport.as_str().to_string(),
    }))
}

/// POST /v1/registrations: Register a member and sync to StoreHub.
///
/// The submission is created at `confirmed` and immediately synced when a
/// StoreHub client is configured; otherwise it stays `confirmed` until
/// `/api/storehub/create` is called.
#[utoipa::path(
    post,
    path = "/v1/registrations",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Submission created; see success flag for the sync", body = RegistrationResponse),
        (status = 401, description = "No acting staff member", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error or duplicate passport", body = crate::error::ErrorBody),
    ),
    tag = "registrations"
)]
async fn register_member(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegistrationResponse>), AppError> {
    let actor = caller.require_actor()?;
    let form = MemberForm::from(extract_json(body)?);

    let member = form.validate(Utc::now().date_naive()).map_err(|errors| {
        crate::metrics::record_registration("invalid");
        AppError::from(errors)
    })?;
    if state.submissions.find_by_passport(&member.passport).is_some() {
        crate::metrics::record_registration("duplicate");
        return Err(ValidationError::DuplicatePassport.into());
    }

    let submission = match state.submissions.create(member, Some(actor)).await {
        Ok(record) => record,
        Err(StoreError::DuplicatePassport(passport)) => {
            crate::metrics::record_registration("duplicate");
            tracing::info!(ref_id = %passport.ref_id(), "duplicate registration rejected");
            return Err(ValidationError::DuplicatePassport.into());
        }
        Err(e) => return Err(e.into()),
    };
    crate::metrics::record_registration("created");

    let Some(client) = state.storehub.as_ref() else {
        tracing::warn!(
            submission_id = %submission.id,
            "StoreHub client not configured; submission left confirmed"
        );
        return Ok((
            StatusCode::CREATED,
            Json(RegistrationResponse {
                success: true,
                data: submission,
                sync: None,
            }),
        ));
    };

    let attempt = Lifecycle::new(&state.submissions, &state.call_logs, client)
        .sync_new(submission.id, Some(actor))
        .await?;
    let sync = SyncResponse::from(&attempt);

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            success: sync.success,
            data: attempt.submission,
            sync: Some(sync),
        }),
    ))
}
