//! # Authentication Middleware
//!
//! Bearer token middleware for staff endpoints, plus the separate
//! shared-secret check guarding the scheduled batch-recovery endpoint.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {actor_uuid}:{secret}    staff token naming the acting user
//! Bearer {secret}                 service token, actor taken from X-Actor-Id
//! ```
//!
//! ## CallerIdentity
//!
//! Every authenticated request gets a [`CallerIdentity`] injected into the
//! request extensions. Operations that must be attributed to a staff member
//! call [`CallerIdentity::require_actor`], which fails with 401 when no
//! actor could be established.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mportal_core::ActorId;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// Header carrying the acting staff member when the token does not.
pub const ACTOR_HEADER: &str = "x-actor-id";

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller, available to handlers via
/// Axum's `FromRequestParts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallerIdentity {
    /// The acting staff member, when one was established.
    pub actor_id: Option<ActorId>,
}

impl CallerIdentity {
    /// The acting staff member, or 401 when the request names none.
    pub fn require_actor(&self) -> Result<ActorId, AppError> {
        self.actor_id
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))
    }
}

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer tokens.
///
/// When lengths differ, performs a dummy comparison so timing does not
/// depend on how much of the token matched.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token in format `{actor_uuid}:{secret}` or `{secret}`.
///
/// A prefix that does not parse as a UUID is treated as part of the secret.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    if let Some((prefix, secret)) = provided.split_once(':') {
        if let Ok(actor) = prefix.parse::<ActorId>() {
            return if constant_time_token_eq(secret, expected_secret) {
                Ok(CallerIdentity {
                    actor_id: Some(actor),
                })
            } else {
                Err("invalid bearer token".into())
            };
        }
    }

    if constant_time_token_eq(provided, expected_secret) {
        Ok(CallerIdentity::default())
    } else {
        Err("invalid bearer token".into())
    }
}

/// Actor named by the `X-Actor-Id` header, if any.
fn actor_from_header(headers: &HeaderMap) -> Result<Option<ActorId>, String> {
    match headers.get(ACTOR_HEADER) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.parse::<ActorId>().ok())
            .map(Some)
            .ok_or_else(|| "invalid X-Actor-Id header".to_string()),
    }
}

fn bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) => value
            .strip_prefix("Bearer ")
            .ok_or("authorization header must use Bearer scheme"),
        None => Err("missing authorization header"),
    }
}

/// Check the batch-recovery secret: `Authorization: Bearer {secret}`.
///
/// An unconfigured secret rejects every call.
pub fn require_automation_secret(
    headers: &HeaderMap,
    expected: Option<&Zeroizing<String>>,
) -> Result<(), AppError> {
    let Some(expected) = expected else {
        tracing::warn!("batch recovery called but no automation secret is configured");
        return Err(AppError::Unauthorized("Unauthorized".into()));
    };
    match bearer(headers) {
        Ok(provided) if constant_time_token_eq(provided, expected) => Ok(()),
        _ => {
            tracing::warn!("batch recovery authentication failed");
            Err(AppError::Unauthorized("Unauthorized".into()))
        }
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Validate the Bearer token and inject [`CallerIdentity`].
///
/// When `AuthConfig.token` is `None`, every request is allowed and the actor
/// comes from `X-Actor-Id` alone (development mode).
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());

    let header_actor = match actor_from_header(request.headers()) {
        Ok(actor) => actor,
        Err(msg) => {
            tracing::warn!(reason = %msg, "authentication failed");
            return unauthorized_response(&msg);
        }
    };

    let identity = match expected_token {
        Some(expected) => match bearer(request.headers()) {
            Ok(provided) => match parse_bearer_token(provided, &expected) {
                Ok(identity) => identity,
                Err(msg) => {
                    tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                    return unauthorized_response(&msg);
                }
            },
            Err(msg) => {
                tracing::warn!(reason = %msg, "authentication failed");
                return unauthorized_response(msg);
            }
        },
        None => CallerIdentity::default(),
    };

    request.extensions_mut().insert(CallerIdentity {
        actor_id: identity.actor_id.or(header_actor),
    });
    next.run(request).await
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        success: false,
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
