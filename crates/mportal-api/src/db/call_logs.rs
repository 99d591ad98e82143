//! Call-log persistence operations on the append-only `api_logs` table.

use chrono::{DateTime, Utc};
use mportal_core::{ActorId, CallLogId, RefId, SubmissionId};
use mportal_state::RequestType;
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::CallLogRecord;

/// Append one call-log entry.
pub async fn insert(pool: &PgPool, record: &CallLogRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO api_logs (id, member_submission_id, ref_id, request_type, request_body,
         request_headers, response_status, response_body, success, error_message,
         duration_ms, created_at, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(record.id.as_uuid())
    .bind(record.member_submission_id.map(Uuid::from))
    .bind(record.ref_id.as_uuid())
    .bind(record.request_type.as_str())
    .bind(&record.request_body)
    .bind(&record.request_headers)
    .bind(record.response_status.map(i32::from))
    .bind(&record.response_body)
    .bind(record.success)
    .bind(&record.error_message)
    .bind(
        record
            .duration_ms
            .map(|ms| i64::try_from(ms).unwrap_or(i64::MAX)),
    )
    .bind(record.created_at)
    .bind(record.created_by.map(Uuid::from))
    .execute(pool)
    .await?;

    Ok(())
}

const SELECT_COLUMNS: &str =
    "SELECT id, member_submission_id, ref_id, request_type, request_body, request_headers,
     response_status, response_body, success, error_message, duration_ms, created_at,
     created_by
     FROM api_logs";

/// Most recent entries first, at most `limit` rows.
pub async fn recent(pool: &PgPool, limit: usize) -> Result<Vec<CallLogRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CallLogRow>(&format!(
        "{SELECT_COLUMNS} ORDER BY created_at DESC LIMIT $1"
    ))
    .bind(i64::try_from(limit).unwrap_or(i64::MAX))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(CallLogRow::into_record).collect()
}

/// Entries for one submission, oldest first.
pub async fn for_submission(
    pool: &PgPool,
    id: SubmissionId,
) -> Result<Vec<CallLogRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CallLogRow>(&format!(
        "{SELECT_COLUMNS} WHERE member_submission_id = $1 ORDER BY created_at"
    ))
    .bind(id.as_uuid())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(CallLogRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct CallLogRow {
    id: Uuid,
    member_submission_id: Option<Uuid>,
    ref_id: Uuid,
    request_type: String,
    request_body: serde_json::Value,
    request_headers: serde_json::Value,
    response_status: Option<i32>,
    response_body: Option<serde_json::Value>,
    success: bool,
    error_message: Option<String>,
    duration_ms: Option<i64>,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
}

impl CallLogRow {
    fn into_record(self) -> Result<CallLogRecord, sqlx::Error> {
        let request_type: RequestType = self
            .request_type
            .parse()
            .map_err(|_| super::decode_error("api_logs.request_type", &self.request_type))?;

        Ok(CallLogRecord {
            id: CallLogId::from_uuid(self.id),
            member_submission_id: self.member_submission_id.map(SubmissionId::from_uuid),
            ref_id: RefId::from_uuid(self.ref_id),
            request_type,
            request_body: self.request_body,
            request_headers: self.request_headers,
            response_status: self.response_status.and_then(|s| u16::try_from(s).ok()),
            response_body: self.response_body,
            success: self.success,
            error_message: self.error_message,
            duration_ms: self.duration_ms.and_then(|ms| u64::try_from(ms).ok()),
            created_at: self.created_at,
            created_by: self.created_by.map(ActorId::from_uuid),
        })
    }
}
