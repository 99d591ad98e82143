//! # StoreHub Call Log
//!
//! Append-only record of every outbound StoreHub attempt, successful or
//! not. With a database attached the `api_logs` table is the only copy:
//! entries are inserted there and every read is a bounded query. Without
//! one, entries live in memory for the life of the process.

use chrono::Utc;
use mportal_core::{ActorId, CallLogId, SubmissionId};
use mportal_state::RequestType;
use mportal_storehub::{logged_request_headers, SyncResult};
use sqlx::PgPool;
use thiserror::Error;

use crate::state::{CallLogRecord, Store, SubmissionRecord};

/// Errors from call-log operations.
#[derive(Error, Debug)]
pub enum CallLogError {
    #[error("call log persistence failed: {0}")]
    Persistence(String),
}

/// Inputs for one call-log entry.
#[derive(Debug, Clone)]
pub struct AttemptEntry<'a> {
    pub submission: &'a SubmissionRecord,
    pub request_type: RequestType,
    pub request_body: serde_json::Value,
    pub result: &'a SyncResult,
    pub actor: Option<ActorId>,
}

/// Call log backed by Postgres, or by memory when no pool is attached.
#[derive(Debug, Clone)]
pub struct CallLog {
    records: Store<CallLogRecord>,
    pool: Option<PgPool>,
}

impl CallLog {
    pub fn new(pool: Option<PgPool>) -> Self {
        Self {
            records: Store::new(),
            pool,
        }
    }

    /// Record one outbound attempt.
    pub async fn record(&self, entry: AttemptEntry<'_>) -> Result<CallLogRecord, CallLogError> {
        let record = CallLogRecord {
            id: CallLogId::new(),
            member_submission_id: Some(entry.submission.id),
            ref_id: entry.submission.ref_id,
            request_type: entry.request_type,
            request_body: entry.request_body,
            request_headers: logged_request_headers(),
            response_status: entry.result.http_status,
            response_body: entry.result.parsed_body.clone(),
            success: entry.result.success,
            error_message: entry.result.failure_detail(),
            duration_ms: Some(entry.result.duration_ms),
            created_at: Utc::now(),
            created_by: entry.actor,
        };

        if let Some(pool) = &self.pool {
            crate::db::call_logs::insert(pool, &record)
                .await
                .map_err(|e| {
                    tracing::error!(
                        submission_id = %entry.submission.id,
                        error = %e,
                        "failed to persist call log"
                    );
                    CallLogError::Persistence(e.to_string())
                })?;
            return Ok(record);
        }

        self.records.insert(*record.id.as_uuid(), record.clone());
        Ok(record)
    }

    /// Most recent entries first, capped at `limit`.
    pub async fn recent(&self, limit: usize) -> Result<Vec<CallLogRecord>, CallLogError> {
        match &self.pool {
            Some(pool) => crate::db::call_logs::recent(pool, limit)
                .await
                .map_err(read_error),
            None => Ok(self
                .records
                .top_by(limit, |a, b| b.created_at.cmp(&a.created_at))),
        }
    }

    /// Entries for one submission, oldest first.
    pub async fn for_submission(
        &self,
        id: SubmissionId,
    ) -> Result<Vec<CallLogRecord>, CallLogError> {
        let Some(pool) = &self.pool else {
            let mut entries = self
                .records
                .filter(|r| r.member_submission_id == Some(id));
            entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            return Ok(entries);
        };
        crate::db::call_logs::for_submission(pool, id)
            .await
            .map_err(read_error)
    }

    /// Entries held in memory. Always zero with a database attached.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn read_error(e: sqlx::Error) -> CallLogError {
    tracing::error!(error = %e, "failed to read call log");
    CallLogError::Persistence(e.to_string())
}
