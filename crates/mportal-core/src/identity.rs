//! # Identity Primitives
//!
//! Passport normalization, reference-id derivation, and the identifier
//! newtypes used across the portal.
//!
//! ## Normalization
//!
//! ```text
//! " a12-345 67 "  ──normalize──▶  "A1234567"  ──derive──▶  RefId (UUID v5)
//! ```
//!
//! Normalization strips every whitespace character and every `-`, then
//! uppercases what remains. It is total: any input, including the empty
//! string, produces a value. Length rules belong to form validation, not
//! to the normalizer.
//!
//! ## Reference identifiers
//!
//! The reference id sent to the CRM is a UUID v5 of the normalized passport
//! under [`REF_ID_NAMESPACE`]. Changing the namespace changes every ref id
//! ever issued, so it is a fixed constant rather than configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Namespace for reference-id derivation. Never change this value.
pub const REF_ID_NAMESPACE: Uuid = Uuid::from_u128(0x3f9c2a71_5e0b_4d8e_9a6c_1b27d4e8f053);

/// Normalize a raw passport number into its canonical business-key form.
pub fn normalize_passport(raw: &str) -> NormalizedPassport {
    NormalizedPassport::new(raw)
}

/// Derive the deterministic reference identifier for a normalized passport.
pub fn derive_ref_id(passport: &NormalizedPassport) -> RefId {
    RefId(Uuid::new_v5(&REF_ID_NAMESPACE, passport.as_str().as_bytes()))
}

// ---------------------------------------------------------------------------
// NormalizedPassport
// ---------------------------------------------------------------------------

/// A passport number in canonical form: no whitespace, no hyphens, uppercase.
///
/// The only constructor normalizes, so a value of this type is always in
/// canonical form. Deserialization normalizes as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedPassport(String);

impl NormalizedPassport {
    pub fn new(raw: &str) -> Self {
        Self(
            raw.chars()
                .filter(|c| !c.is_whitespace() && *c != '-')
                .collect::<String>()
                .to_uppercase(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The reference id this passport maps to.
    pub fn ref_id(&self) -> RefId {
        derive_ref_id(self)
    }
}

impl<'de> Deserialize<'de> for NormalizedPassport {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(&raw))
    }
}

impl std::fmt::Display for NormalizedPassport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// UUID-based identifiers
// ---------------------------------------------------------------------------

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $ty(Uuid);

        impl $ty {
            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $ty {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$ty> for Uuid {
            fn from(id: $ty) -> Self {
                id.0
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidIdentifier(s.to_string()))
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Primary key of a member submission (random v4).
    SubmissionId
);
uuid_identifier!(
    /// Primary key of an outbound call-log row (random v4).
    CallLogId
);
uuid_identifier!(
    /// Authenticated staff member performing an operation.
    ActorId
);
uuid_identifier!(
    /// Deterministic CRM reference id (v5 of the normalized passport).
    RefId
);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl CallLogId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallLogId {
    fn default() -> Self {
        Self::new()
    }
}
