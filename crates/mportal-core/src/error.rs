//! # Validation Errors
//!
//! Every rejected registration field maps to one [`ValidationError`].
//! [`FormErrors`] collects all of them so a client can highlight every
//! offending field in one round trip instead of fixing them one at a time.

use thiserror::Error;

/// A single field-level validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was missing or blank.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// The trimmed passport number is shorter than the minimum.
    #[error("passport number must be at least {min} characters")]
    PassportTooShort { min: usize },

    /// Another submission already uses this normalized passport.
    #[error("passport number is already registered")]
    DuplicatePassport,

    /// The member is younger than the minimum registration age.
    #[error("member must be at least {min_age} years old")]
    Underage { min_age: u32 },

    /// An identifier string could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A request field that should name a record holds no valid identifier.
    #[error("{field} is not a valid identifier: {value}")]
    InvalidReference { field: &'static str, value: String },
}

impl ValidationError {
    /// Name of the form field this error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field } => *field,
            Self::PassportTooShort { .. } | Self::DuplicatePassport => "passport_number",
            Self::Underage { .. } => "date_of_birth",
            Self::InvalidIdentifier(_) => "id",
            Self::InvalidReference { field, .. } => *field,
        }
    }
}

/// All validation failures for one submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(Vec<ValidationError>);

impl FormErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Whether any error refers to the given field.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == field)
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for FormErrors {}

impl From<ValidationError> for FormErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}
