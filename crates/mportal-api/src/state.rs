//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! - **Submissions**: member submissions and their sync status
//!   ([`SubmissionStore`]).
//! - **Call log**: append-only record of every outbound StoreHub attempt
//!   ([`CallLog`]).
//! - **StoreHub client**: optional; when absent, sync entry points
//!   return 503.
//! - **Database pool**: optional; when present, submissions write through
//!   to Postgres and are hydrated from it on startup. Call-log entries are
//!   then read straight from the database, one page at a time.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use mportal_core::{ActorId, CallLogId, NormalizedPassport, RefId, SubmissionId};
use mportal_state::{RequestType, SubmissionStatus};
use mportal_storehub::{StoreHubClient, StoreHubCustomer};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::call_log::CallLog;
use crate::submissions::SubmissionStore;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Insert a record unless an existing record conflicts with it.
    ///
    /// The conflict scan and the insert run under one write lock. Returns the
    /// conflicting record when the insert was refused.
    pub fn insert_unique(
        &self,
        id: Uuid,
        value: T,
        conflicts: impl Fn(&T) -> bool,
    ) -> Result<(), T> {
        let mut guard = self.data.write();
        if let Some(existing) = guard.values().find(|v| conflicts(v)) {
            return Err(existing.clone());
        }
        guard.insert(id, value);
        Ok(())
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Records matching a predicate.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.data.read().values().filter(|v| pred(v)).cloned().collect()
    }

    /// The first `limit` records under `order`, cloning only those returned.
    pub fn top_by(
        &self,
        limit: usize,
        order: impl Fn(&T, &T) -> std::cmp::Ordering,
    ) -> Vec<T> {
        let guard = self.data.read();
        let mut refs: Vec<&T> = guard.values().collect();
        if limit < refs.len() {
            refs.select_nth_unstable_by(limit, |a, b| order(a, b));
            refs.truncate(limit);
        }
        refs.sort_by(|a, b| order(a, b));
        refs.into_iter().cloned().collect()
    }

    /// First record matching a predicate.
    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.data.read().values().find(|v| pred(v)).cloned()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure may inspect the current value, validate preconditions,
    /// mutate it, and return `Ok(R)` or `Err(E)`; the whole operation runs
    /// under a single write lock. Returns `None` if the record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Record Types -------------------------------------------------------------

/// A member submission. One per unique normalized passport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubmissionRecord {
    #[schema(value_type = String, format = Uuid)]
    pub id: SubmissionId,
    /// Deterministic CRM reference id derived from the passport.
    #[schema(value_type = String, format = Uuid)]
    pub ref_id: RefId,
    /// Normalized passport number (unique).
    #[schema(value_type = String)]
    pub passport_number: NormalizedPassport,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub nationality: String,
    /// pending, confirmed, processing, success, storehub_failed, cancelled.
    #[schema(value_type = String)]
    pub status: SubmissionStatus,
    pub storehub_synced_at: Option<DateTime<Utc>>,
    /// Raw failure text from the last failed sync, or the cancel reason.
    pub storehub_error: Option<String>,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub created_by: Option<ActorId>,
}

impl SubmissionRecord {
    /// StoreHub payload for this submission.
    pub fn customer(&self, tag: &str) -> StoreHubCustomer {
        StoreHubCustomer {
            ref_id: self.ref_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            address1: self.passport_number.to_string(),
            state: self.nationality.clone(),
            birthday: self.date_of_birth,
            tags: vec![tag.to_string()],
        }
    }
}

/// One outbound StoreHub attempt. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CallLogRecord {
    #[schema(value_type = String, format = Uuid)]
    pub id: CallLogId,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub member_submission_id: Option<SubmissionId>,
    #[schema(value_type = String, format = Uuid)]
    pub ref_id: RefId,
    /// create or retry.
    #[schema(value_type = String)]
    pub request_type: RequestType,
    #[schema(value_type = Object)]
    pub request_body: serde_json::Value,
    #[schema(value_type = Object)]
    pub request_headers: serde_json::Value,
    pub response_status: Option<u16>,
    #[schema(value_type = Option<Object>)]
    pub response_body: Option<serde_json::Value>,
    pub success: bool,
    /// Response text exactly as received, or the transport error, on failure.
    pub error_message: Option<String>,
    pub duration_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub created_by: Option<ActorId>,
}

// -- Application State --------------------------------------------------------

/// Application configuration, resolved once at startup.
///
/// Custom `Debug` redacts both secrets.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared secret for staff bearer tokens. `None` disables auth.
    pub auth_token: Option<Zeroizing<String>>,
    /// Bearer secret for the scheduled batch-recovery endpoint.
    /// `None` rejects every batch call.
    pub automation_secret: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "automation_secret",
                &self.automation_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            automation_secret: None,
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly via `Arc` internals in each store.
#[derive(Clone)]
pub struct AppState {
    pub submissions: SubmissionStore,
    pub call_logs: CallLog,
    /// StoreHub client. `None` when credentials are not configured.
    pub storehub: Option<StoreHubClient>,
    /// PostgreSQL pool. `None` runs in-memory only.
    pub db_pool: Option<PgPool>,
    /// Prometheus render handle, installed by the binary.
    pub metrics: Option<PrometheusHandle>,
    pub config: AppConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("submissions", &self.submissions.len())
            .field("call_logs", &self.call_logs.len())
            .field("storehub", &self.storehub)
            .field("db_pool", &self.db_pool.is_some())
            .field("metrics", &self.metrics.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    /// In-memory state with default configuration and no StoreHub client.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None, None)
    }

    /// State with the given configuration, optional StoreHub client, and
    /// optional database pool.
    pub fn with_config(
        config: AppConfig,
        storehub: Option<StoreHubClient>,
        db_pool: Option<PgPool>,
    ) -> Self {
        Self {
            submissions: SubmissionStore::new(db_pool.clone()),
            call_logs: CallLog::new(db_pool.clone()),
            storehub,
            db_pool,
            metrics: None,
            config,
        }
    }

    /// Attach the Prometheus handle served at `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a database pool is available.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        if self.db_pool.is_none() {
            return Ok(());
        }

        let submissions = self
            .submissions
            .hydrate()
            .await
            .map_err(|e| format!("failed to load submissions: {e}"))?;

        tracing::info!(submissions, "Hydrated submissions from database");

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
