//! # Request Body Extraction
//!
//! Handlers take `Result<Json<T>, JsonRejection>` and pass it through one of
//! the helpers here so every body problem comes back in the standard error
//! envelope.
//!
//! | Rejection                         | Response                  |
//! |-----------------------------------|---------------------------|
//! | not JSON / wrong content type     | 400 `BAD_REQUEST`         |
//! | JSON of the wrong shape           | 422 `VALIDATION_ERROR`    |
//! | [`Validate`] rule violated        | 422 `VALIDATION_ERROR`    |
//!
//! A well-formed body with a bad date or a string where a number belongs is
//! a form problem the staff member can fix, so it is reported like any
//! other field error rather than as a malformed request.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Request DTOs with rules serde cannot express.
pub trait Validate {
    /// Returns the user-facing message for the first violated rule.
    fn validate(&self) -> Result<(), String>;
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => AppError::Validation(err.body_text()),
        other => AppError::BadRequest(other.body_text()),
    }
}

/// Unwrap a JSON body.
pub fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value).map_err(rejection_error)
}

/// Unwrap a JSON body and apply its [`Validate`] rules.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(body)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}
