//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps validation, lifecycle, and persistence errors to HTTP status codes
//! and a JSON body that always carries `success: false`, so every portal
//! endpoint answers with the same success flag whether it succeeded or not.
//! Never exposes internal error details in responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mportal_core::{FormErrors, ValidationError};
use mportal_state::{PreconditionError, TransitionError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::call_log::CallLogError;
use crate::lifecycle::LifecycleError;
use crate::submissions::StoreError;

/// Structured JSON error response body.
///
/// The `details` field carries per-field messages for 422 validation
/// errors and is omitted for 500-class errors.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("{0}")]
    Validation(String),

    /// Form validation failed on one or more fields (422).
    #[error("{0}")]
    Form(FormErrors),

    /// Request body could not be parsed (400).
    #[error("{0}")]
    BadRequest(String),

    /// Authentication failure: missing token, bad token, or no actor (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Entry point invoked in the wrong submission status (409).
    #[error("{0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),

    /// A required dependency is not configured (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) | Self::Form(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Form(errors) => {
                let fields: serde_json::Map<String, serde_json::Value> = errors
                    .errors()
                    .iter()
                    .map(|e| (e.field().to_string(), serde_json::Value::String(e.to_string())))
                    .collect();
                Some(serde_json::json!({ "fields": fields }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Form(FormErrors::from(err))
    }
}

impl From<FormErrors> for AppError {
    fn from(err: FormErrors) -> Self {
        Self::Form(err)
    }
}

impl From<PreconditionError> for AppError {
    fn from(err: PreconditionError) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicatePassport(_) => Self::Form(FormErrors::from(
                ValidationError::DuplicatePassport,
            )),
            StoreError::NotFound(_) => Self::NotFound("Submission not found".to_string()),
            StoreError::Transition(e) => Self::Conflict(e.to_string()),
            StoreError::Persistence(msg) => Self::Internal(msg),
        }
    }
}

impl From<CallLogError> for AppError {
    fn from(err: CallLogError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Store(e) => e.into(),
            LifecycleError::Precondition(e) => e.into(),
            LifecycleError::Payload(e) => Self::Internal(e.to_string()),
        }
    }
}
