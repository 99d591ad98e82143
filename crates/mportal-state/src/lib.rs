//! # mportal-state: Submission Lifecycle
//!
//! A member submission moves through a small closed set of statuses as it
//! is synced to the external CRM:
//!
//! ```text
//!   pending ──┐
//!      │      ▼
//!      └──▶ confirmed ──▶ processing ──▶ success (terminal)
//!                             │  ▲
//!                             ▼  │ manual retry
//!                        storehub_failed ──▶ cancelled (terminal)
//!                                   manual cancel
//! ```
//!
//! `pending` is a legacy pre-sync status kept so older rows still load;
//! new submissions start at `confirmed`.
//!
//! Transitions are validated at runtime by [`SubmissionStatus::transition`].
//! The three staff-facing entry points (create, retry, cancel) each carry a
//! precondition checked by [`Action::precondition`] before any side effect.

pub mod submission;

pub use submission::{Action, PreconditionError, RequestType, SubmissionStatus, TransitionError};
