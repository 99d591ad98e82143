//! # Submission Status Machine
//!
//! Status enum, allowed transitions, and entry-point preconditions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Status ──────────────────────────────────────────────────────────

/// Lifecycle status of a member submission.
///
/// Serialized in `snake_case` (`"storehub_failed"`), which is also the
/// representation stored in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Legacy pre-sync status.
    Pending,
    /// Persisted and awaiting its first sync.
    Confirmed,
    /// A sync attempt is in flight.
    Processing,
    /// The CRM accepted the member. Terminal.
    Success,
    /// The last sync attempt failed; awaiting staff action.
    StorehubFailed,
    /// Staff gave up on syncing this submission. Terminal.
    Cancelled,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Success,
        Self::StorehubFailed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::StorehubFailed => "storehub_failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses reachable in one step from this one.
    pub fn valid_transitions(&self) -> &'static [SubmissionStatus] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Processing],
            Self::Confirmed => &[Self::Processing],
            Self::Processing => &[Self::Success, Self::StorehubFailed],
            Self::StorehubFailed => &[Self::Processing, Self::Cancelled],
            Self::Success | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: SubmissionStatus) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Cancelled)
    }

    /// Whether the submission has never been sent to the CRM.
    pub fn is_pre_sync(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Validate a transition, returning the target status on success.
    pub fn transition(self, target: SubmissionStatus) -> Result<SubmissionStatus, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::AlreadyTerminal(self));
        }
        if !self.can_transition_to(target) {
            return Err(TransitionError::InvalidTransition {
                from: self,
                to: target,
            });
        }
        Ok(target)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TransitionError::UnknownStatus(s.to_string()))
    }
}

/// Error from a rejected status transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid submission transition from {from} to {to}")]
    InvalidTransition {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },

    #[error("submission is already in terminal status {0}")]
    AlreadyTerminal(SubmissionStatus),

    #[error("unknown submission status: {0}")]
    UnknownStatus(String),
}

// ─── Entry points ────────────────────────────────────────────────────

/// Staff-facing lifecycle entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// First sync of a freshly registered submission.
    Create,
    /// Manual (or batch) retry of a failed sync.
    Retry,
    /// Manual cancellation of a failed sync.
    Cancel,
}

impl Action {
    /// Check that `status` allows this action. No side effects.
    pub fn precondition(&self, status: SubmissionStatus) -> Result<(), PreconditionError> {
        let allowed = match self {
            Self::Create => status.is_pre_sync(),
            Self::Retry | Self::Cancel => status == SubmissionStatus::StorehubFailed,
        };
        if allowed {
            Ok(())
        } else {
            Err(PreconditionError {
                action: *self,
                status,
            })
        }
    }

    /// The call-log request type this action produces, if it calls the CRM.
    pub fn request_type(&self) -> Option<RequestType> {
        match self {
            Self::Create => Some(RequestType::Create),
            Self::Retry => Some(RequestType::Retry),
            Self::Cancel => None,
        }
    }
}

/// An entry point was invoked on a submission in the wrong status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreconditionError {
    pub action: Action,
    pub status: SubmissionStatus,
}

impl PreconditionError {
    /// Human-readable message returned to staff.
    pub fn message(&self) -> &'static str {
        match self.action {
            Action::Create => "Submission already synced or in flight",
            Action::Retry => "Can only retry failed submissions",
            Action::Cancel => "Can only cancel failed submissions",
        }
    }
}

impl std::fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for PreconditionError {}

/// Kind of outbound CRM call recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Create,
    Retry,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Retry => "retry",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "retry" => Ok(Self::Retry),
            other => Err(format!("unknown request type: {other}")),
        }
    }
}
