//! # Sync Lifecycle
//!
//! Drives a submission through one StoreHub attempt:
//!
//! ```text
//! precondition ──▶ processing ──▶ StoreHub call ──▶ call log ──▶ success
//!                                                           └──▶ storehub_failed
//! ```
//!
//! Every entry point (initial create, manual retry, batch recovery) runs
//! the same attempt. Only the precondition, the request type recorded in
//! the call log, and the retry-count bump differ. Cancel is a direct
//! transition with no outbound call.
//!
//! A call-log write failure is logged and reported on the [`SyncAttempt`]
//! but never blocks the terminal transition: the submission must not be
//! left in `processing` because an audit row could not be written.

use std::time::Duration;

use chrono::Utc;
use mportal_core::{ActorId, CallLogId, SubmissionId};
use mportal_state::{Action, PreconditionError, RequestType, SubmissionStatus};
use mportal_storehub::{StoreHubClient, SyncResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::call_log::{AttemptEntry, CallLog};
use crate::state::SubmissionRecord;
use crate::submissions::{StatusUpdate, StoreError, SubmissionStore};

/// Submissions picked up by one batch recovery run.
pub const BATCH_LIMIT: usize = 10;

/// Failed submissions at or above this retry count are left for staff.
pub const MAX_RETRY_COUNT: u32 = 5;

/// Error text stored on a submission cancelled by staff.
pub const CANCEL_REASON: &str = "Manually cancelled by staff";

/// Errors from lifecycle operations.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("StoreHub payload could not be encoded: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Which submissions a retry run should pick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrySelection {
    /// One named submission.
    Single(SubmissionId),
    /// The oldest failed submissions still under the retry ceiling.
    OldestFailed { limit: usize, max_retry_count: u32 },
}

impl RetrySelection {
    /// The scheduled batch selection.
    pub fn batch() -> Self {
        Self::OldestFailed {
            limit: BATCH_LIMIT,
            max_retry_count: MAX_RETRY_COUNT,
        }
    }
}

/// Outcome of one StoreHub attempt for one submission.
#[derive(Debug, Clone)]
pub struct SyncAttempt {
    /// The submission after its terminal transition.
    pub submission: SubmissionRecord,
    pub result: SyncResult,
    /// Call-log entry id, absent when the entry could not be written.
    pub call_log_id: Option<CallLogId>,
    pub call_log_error: Option<String>,
}

impl SyncAttempt {
    pub fn succeeded(&self) -> bool {
        self.result.success
    }
}

/// Summary of a batch recovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Lifecycle operations over borrowed application state.
#[derive(Debug, Clone, Copy)]
pub struct Lifecycle<'a> {
    submissions: &'a SubmissionStore,
    call_log: &'a CallLog,
    client: &'a StoreHubClient,
}

impl<'a> Lifecycle<'a> {
    pub fn new(
        submissions: &'a SubmissionStore,
        call_log: &'a CallLog,
        client: &'a StoreHubClient,
    ) -> Self {
        Self {
            submissions,
            call_log,
            client,
        }
    }

    /// Initial sync of a freshly created (or legacy pending) submission.
    pub async fn sync_new(
        &self,
        id: SubmissionId,
        actor: Option<ActorId>,
    ) -> Result<SyncAttempt, LifecycleError> {
        self.attempt(id, Action::Create, actor).await
    }

    /// Staff-triggered retry of one failed submission.
    pub async fn retry(
        &self,
        id: SubmissionId,
        actor: ActorId,
    ) -> Result<SyncAttempt, LifecycleError> {
        self.attempt(id, Action::Retry, Some(actor)).await
    }

    /// Retry every submission matched by `selection`, sequentially.
    ///
    /// A failure on one submission never stops the run. Submissions that
    /// changed status between selection and attempt are skipped.
    pub async fn retry_selected(
        &self,
        selection: RetrySelection,
        actor: Option<ActorId>,
    ) -> BatchReport {
        let candidates = self.select(selection);
        let mut report = BatchReport {
            total: candidates.len(),
            ..BatchReport::default()
        };

        for candidate in candidates {
            match self.attempt(candidate.id, Action::Retry, actor).await {
                Ok(attempt) if attempt.succeeded() => report.succeeded += 1,
                Ok(_) => report.failed += 1,
                Err(e) => {
                    tracing::warn!(
                        submission_id = %candidate.id,
                        error = %e,
                        "skipping submission during retry run"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Scheduled batch recovery over the oldest failed submissions.
    pub async fn retry_batch(&self) -> BatchReport {
        let report = self.retry_selected(RetrySelection::batch(), None).await;
        crate::metrics::record_batch_run(report.total);
        tracing::info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            "batch recovery finished"
        );
        report
    }

    /// Submissions matched by a selection, in processing order.
    pub fn select(&self, selection: RetrySelection) -> Vec<SubmissionRecord> {
        match selection {
            RetrySelection::Single(id) => self
                .submissions
                .get(id)
                .ok()
                .filter(|s| s.status == SubmissionStatus::StorehubFailed)
                .into_iter()
                .collect(),
            RetrySelection::OldestFailed {
                limit,
                max_retry_count,
            } => self.submissions.select_retryable(limit, max_retry_count),
        }
    }

    async fn attempt(
        &self,
        id: SubmissionId,
        action: Action,
        actor: Option<ActorId>,
    ) -> Result<SyncAttempt, LifecycleError> {
        let current = self.submissions.get(id)?;
        action.precondition(current.status)?;
        let request_type = action.request_type().unwrap_or(RequestType::Create);

        let customer = current.customer(self.client.tag());
        let request_body = serde_json::to_value(&customer)?;

        let processing = self
            .submissions
            .update_status(id, StatusUpdate::to(SubmissionStatus::Processing))
            .await?;

        let result = self.client.sync(&customer).await;

        let (call_log_id, call_log_error) = match self
            .call_log
            .record(AttemptEntry {
                submission: &processing,
                request_type,
                request_body,
                result: &result,
                actor,
            })
            .await
        {
            Ok(entry) => (Some(entry.id), None),
            Err(e) => {
                tracing::warn!(submission_id = %id, error = %e, "call log entry not written");
                crate::metrics::record_call_log_failure();
                (None, Some(e.to_string()))
            }
        };

        let mut update = if result.success {
            StatusUpdate::to(SubmissionStatus::Success)
                .synced_at(Utc::now())
                .clear_error()
        } else {
            StatusUpdate::to(SubmissionStatus::StorehubFailed)
                .error(result.failure_detail().unwrap_or_default())
        };
        if request_type == RequestType::Retry {
            update = update.retry_count(processing.retry_count.saturating_add(1));
        }
        let submission = self.submissions.update_status(id, update).await?;

        crate::metrics::record_sync_attempt(
            request_type.as_str(),
            result.success,
            Duration::from_millis(result.duration_ms).as_secs_f64(),
        );
        if result.success {
            tracing::info!(
                submission_id = %id,
                ref_id = %submission.ref_id,
                request_type = %request_type,
                duration_ms = result.duration_ms,
                "StoreHub sync succeeded"
            );
        } else {
            tracing::warn!(
                submission_id = %id,
                ref_id = %submission.ref_id,
                request_type = %request_type,
                http_status = ?result.http_status,
                retry_count = submission.retry_count,
                "StoreHub sync failed"
            );
        }

        Ok(SyncAttempt {
            submission,
            result,
            call_log_id,
            call_log_error,
        })
    }
}

/// Cancel a failed submission. No outbound call is made.
pub async fn cancel(
    submissions: &SubmissionStore,
    id: SubmissionId,
    actor: ActorId,
) -> Result<SubmissionRecord, LifecycleError> {
    let current = submissions.get(id)?;
    Action::Cancel.precondition(current.status)?;

    let record = submissions
        .update_status(
            id,
            StatusUpdate::to(SubmissionStatus::Cancelled).error(CANCEL_REASON),
        )
        .await?;

    tracing::info!(submission_id = %id, actor = %actor, "submission cancelled");
    Ok(record)
}
