//! Submission persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `member_submissions`
//! table. Status transitions are validated in the application layer; the
//! table only constrains the status to known values.

use chrono::{DateTime, NaiveDate, Utc};
use mportal_core::{normalize_passport, ActorId, RefId, SubmissionId};
use mportal_state::SubmissionStatus;
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::SubmissionRecord;

/// Insert a new submission.
///
/// A second row with the same passport fails with a unique violation.
pub async fn insert(pool: &PgPool, record: &SubmissionRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO member_submissions (id, ref_id, passport_number, first_name, last_name,
         full_name, date_of_birth, nationality, status, storehub_synced_at, storehub_error,
         retry_count, created_at, updated_at, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(record.id.as_uuid())
    .bind(record.ref_id.as_uuid())
    .bind(record.passport_number.as_str())
    .bind(&record.first_name)
    .bind(&record.last_name)
    .bind(&record.full_name)
    .bind(record.date_of_birth)
    .bind(&record.nationality)
    .bind(record.status.as_str())
    .bind(record.storehub_synced_at)
    .bind(&record.storehub_error)
    .bind(retry_count_column(record.retry_count))
    .bind(record.created_at)
    .bind(record.updated_at)
    .bind(record.created_by.map(Uuid::from))
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist the mutable sync fields of a submission.
pub async fn update_status(pool: &PgPool, record: &SubmissionRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE member_submissions
         SET status = $1, storehub_synced_at = $2, storehub_error = $3,
             retry_count = $4, updated_at = $5
         WHERE id = $6",
    )
    .bind(record.status.as_str())
    .bind(record.storehub_synced_at)
    .bind(&record.storehub_error)
    .bind(retry_count_column(record.retry_count))
    .bind(record.updated_at)
    .bind(record.id.as_uuid())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all submissions on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<SubmissionRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SubmissionRow>(
        "SELECT id, ref_id, passport_number, first_name, last_name, full_name,
         date_of_birth, nationality, status, storehub_synced_at, storehub_error,
         retry_count, created_at, updated_at, created_by
         FROM member_submissions ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(SubmissionRow::into_record).collect()
}

fn retry_count_column(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    ref_id: Uuid,
    passport_number: String,
    first_name: String,
    last_name: String,
    full_name: String,
    date_of_birth: NaiveDate,
    nationality: String,
    status: String,
    storehub_synced_at: Option<DateTime<Utc>>,
    storehub_error: Option<String>,
    retry_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: Option<Uuid>,
}

impl SubmissionRow {
    fn into_record(self) -> Result<SubmissionRecord, sqlx::Error> {
        let status: SubmissionStatus = self.status.parse().map_err(|_| {
            tracing::error!(id = %self.id, status = %self.status, "unknown submission status in database");
            super::decode_error("member_submissions.status", &self.status)
        })?;

        Ok(SubmissionRecord {
            id: SubmissionId::from_uuid(self.id),
            ref_id: RefId::from_uuid(self.ref_id),
            passport_number: normalize_passport(&self.passport_number),
            first_name: self.first_name,
            last_name: self.last_name,
            full_name: self.full_name,
            date_of_birth: self.date_of_birth,
            nationality: self.nationality,
            status,
            storehub_synced_at: self.storehub_synced_at,
            storehub_error: self.storehub_error,
            retry_count: u32::try_from(self.retry_count).unwrap_or(0),
            created_at: self.created_at,
            updated_at: self.updated_at,
            created_by: self.created_by.map(ActorId::from_uuid),
        })
    }
}
