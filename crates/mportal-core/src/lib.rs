//! # mportal-core: Foundational Types for the Member Portal
//!
//! Leaf crate of the workspace. Defines the identity primitives every
//! other crate builds on:
//!
//! - **Passport normalization.** [`normalize_passport`] is the single
//!   definition of the business key for a member submission. Two passports
//!   that differ only in case, whitespace, or hyphens are the same member.
//!
//! - **Deterministic reference identifiers.** [`derive_ref_id`] maps a
//!   normalized passport to a UUID v5 under a fixed namespace, so the same
//!   member always carries the same reference id into the CRM no matter how
//!   many times a sync is retried.
//!
//! - **Identifier newtypes.** `SubmissionId`, `CallLogId`, `ActorId`, and
//!   `RefId` are distinct types; a call-log id cannot be passed where a
//!   submission id is expected.
//!
//! - **Member form validation.** [`MemberForm::validate`] applies the
//!   registration rules (required fields, passport length, minimum age)
//!   and produces a [`ValidatedMember`] ready for persistence.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mportal-*` crates.
//! - No I/O. Everything here is pure.
//! - No `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod member;

pub use error::{FormErrors, ValidationError};
pub use identity::{
    derive_ref_id, normalize_passport, ActorId, CallLogId, NormalizedPassport, RefId,
    SubmissionId, REF_ID_NAMESPACE,
};
pub use member::{age_on, MemberForm, ValidatedMember, MIN_MEMBER_AGE, MIN_PASSPORT_LEN};
