//! # Submission Store
//!
//! Member submissions held in memory with optional Postgres write-through.
//!
//! ## Uniqueness
//!
//! The normalized passport is the business key. [`SubmissionStore::create`]
//! checks for an existing submission with the same passport and inserts
//! under one in-memory write lock; the `member_submissions` unique index
//! backs the check when a database is attached.
//!
//! ## Status updates
//!
//! [`SubmissionStore::update_status`] validates the transition against the
//! status machine and applies the partial update under the same write
//! lock, then persists. `updated_at` is stamped on every update.

use chrono::{DateTime, Utc};
use mportal_core::{ActorId, NormalizedPassport, SubmissionId, ValidatedMember};
use mportal_state::{SubmissionStatus, TransitionError};
use sqlx::PgPool;
use thiserror::Error;

use crate::state::{Store, SubmissionRecord};

/// Errors from submission store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("passport {0} is already registered")]
    DuplicatePassport(NormalizedPassport),

    #[error("submission {0} not found")]
    NotFound(SubmissionId),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("submission persistence failed: {0}")]
    Persistence(String),
}

/// Partial update applied together with a status change.
///
/// Fields left as `None` are not touched.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: SubmissionStatus,
    pub storehub_error: Option<Option<String>>,
    pub storehub_synced_at: Option<Option<DateTime<Utc>>>,
    pub retry_count: Option<u32>,
}

impl StatusUpdate {
    pub fn to(status: SubmissionStatus) -> Self {
        Self {
            status,
            storehub_error: None,
            storehub_synced_at: None,
            retry_count: None,
        }
    }

    pub fn error(mut self, text: impl Into<String>) -> Self {
        self.storehub_error = Some(Some(text.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.storehub_error = Some(None);
        self
    }

    pub fn synced_at(mut self, at: DateTime<Utc>) -> Self {
        self.storehub_synced_at = Some(Some(at));
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }

    fn apply(&self, record: &mut SubmissionRecord, now: DateTime<Utc>) {
        record.status = self.status;
        if let Some(error) = &self.storehub_error {
            record.storehub_error = error.clone();
        }
        if let Some(synced_at) = self.storehub_synced_at {
            record.storehub_synced_at = synced_at;
        }
        if let Some(count) = self.retry_count {
            record.retry_count = count;
        }
        record.updated_at = now;
    }
}

/// Member submissions with optional database write-through.
#[derive(Debug, Clone)]
pub struct SubmissionStore {
    records: Store<SubmissionRecord>,
    pool: Option<PgPool>,
}

impl SubmissionStore {
    pub fn new(pool: Option<PgPool>) -> Self {
        Self {
            records: Store::new(),
            pool,
        }
    }

    /// Create a submission at status `confirmed`.
    ///
    /// Fails with [`StoreError::DuplicatePassport`] when any submission
    /// already holds the same normalized passport. Nothing is written then.
    pub async fn create(
        &self,
        member: ValidatedMember,
        actor: Option<ActorId>,
    ) -> Result<SubmissionRecord, StoreError> {
        let now = Utc::now();
        let record = SubmissionRecord {
            id: SubmissionId::new(),
            ref_id: member.ref_id,
            passport_number: member.passport,
            first_name: member.first_name,
            last_name: member.last_name,
            full_name: member.full_name,
            date_of_birth: member.date_of_birth,
            nationality: member.nationality,
            status: SubmissionStatus::Confirmed,
            storehub_synced_at: None,
            storehub_error: None,
            retry_count: 0,
            created_at: now,
            updated_at: now,
            created_by: actor,
        };

        let passport = record.passport_number.clone();
        self.records
            .insert_unique(*record.id.as_uuid(), record.clone(), |existing| {
                existing.passport_number == passport
            })
            .map_err(|_| StoreError::DuplicatePassport(passport.clone()))?;

        if let Some(pool) = &self.pool {
            if let Err(e) = crate::db::submissions::insert(pool, &record).await {
                self.records.remove(record.id.as_uuid());
                if is_unique_violation(&e) {
                    return Err(StoreError::DuplicatePassport(passport));
                }
                tracing::error!(submission_id = %record.id, error = %e, "failed to persist submission");
                return Err(StoreError::Persistence(e.to_string()));
            }
        }

        tracing::info!(
            submission_id = %record.id,
            ref_id = %record.ref_id,
            "submission created"
        );
        Ok(record)
    }

    pub fn get(&self, id: SubmissionId) -> Result<SubmissionRecord, StoreError> {
        self.records
            .get(id.as_uuid())
            .ok_or(StoreError::NotFound(id))
    }

    /// Existing submission for a normalized passport, if any.
    pub fn find_by_passport(&self, passport: &NormalizedPassport) -> Option<SubmissionRecord> {
        self.records.find(|r| &r.passport_number == passport)
    }

    /// Validate and apply a status transition, then persist it.
    pub async fn update_status(
        &self,
        id: SubmissionId,
        update: StatusUpdate,
    ) -> Result<SubmissionRecord, StoreError> {
        let now = Utc::now();
        let (from, record) = self
            .records
            .try_update(id.as_uuid(), |record| {
                let from = record.status;
                from.transition(update.status)?;
                update.apply(record, now);
                Ok::<_, TransitionError>((from, record.clone()))
            })
            .ok_or(StoreError::NotFound(id))??;

        if let Some(pool) = &self.pool {
            let written = crate::db::submissions::update_status(pool, &record).await;
            check_status_written(&record, written)?;
        }

        tracing::info!(
            submission_id = %id,
            from = %from,
            to = %record.status,
            retry_count = record.retry_count,
            "submission status updated"
        );
        Ok(record)
    }

    /// Failed submissions, most recently updated first.
    pub fn list_failed(&self) -> Vec<SubmissionRecord> {
        let mut failed = self
            .records
            .filter(|r| r.status == SubmissionStatus::StorehubFailed);
        failed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        failed
    }

    /// Failed submissions under the retry ceiling, oldest created first.
    pub fn select_retryable(&self, limit: usize, max_retry_count: u32) -> Vec<SubmissionRecord> {
        let mut candidates = self.records.filter(|r| {
            r.status == SubmissionStatus::StorehubFailed && r.retry_count < max_retry_count
        });
        candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        candidates.truncate(limit);
        candidates
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load every persisted submission into memory. Returns the count loaded.
    pub async fn hydrate(&self) -> Result<usize, sqlx::Error> {
        let Some(pool) = &self.pool else {
            return Ok(0);
        };
        let records = crate::db::submissions::load_all(pool).await?;
        let count = records.len();
        for record in records {
            self.records.insert(*record.id.as_uuid(), record);
        }
        Ok(count)
    }

    /// Insert a record as-is, bypassing validation. Test fixtures only.
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, record: SubmissionRecord) {
        self.records.insert(*record.id.as_uuid(), record);
    }
}

/// A status update that matched no row did not persist anything.
fn check_status_written(
    record: &SubmissionRecord,
    written: Result<bool, sqlx::Error>,
) -> Result<(), StoreError> {
    match written {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::error!(
                submission_id = %record.id,
                status = %record.status,
                "submission status update matched no database row"
            );
            Err(StoreError::Persistence(format!(
                "submission {} has no database row",
                record.id
            )))
        }
        Err(e) => {
            tracing::error!(
                submission_id = %record.id,
                status = %record.status,
                error = %e,
                "failed to persist submission status"
            );
            Err(StoreError::Persistence(e.to_string()))
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
