//! # Member Registration Form
//!
//! Raw form input and the validated member record built from it.
//!
//! | Field            | Rule                                         |
//! |------------------|----------------------------------------------|
//! | `passport_number`| required; at least 5 characters once trimmed |
//! | `first_name`     | required                                     |
//! | `last_name`      | required                                     |
//! | `date_of_birth`  | required; member at least 20 on `today`      |
//! | `nationality`    | required                                     |
//!
//! Validation is all-or-nothing and reports every failing field.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{FormErrors, ValidationError};
use crate::identity::{normalize_passport, NormalizedPassport, RefId};

/// Minimum trimmed passport length accepted at registration.
pub const MIN_PASSPORT_LEN: usize = 5;

/// Minimum member age in whole years.
pub const MIN_MEMBER_AGE: u32 = 20;

/// Registration form as submitted by staff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberForm {
    #[serde(default)]
    pub passport_number: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub nationality: String,
}

/// A member that passed validation, with its business key derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMember {
    pub passport: NormalizedPassport,
    pub ref_id: RefId,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub nationality: String,
}

impl MemberForm {
    /// Validate the form against the registration rules as of `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<ValidatedMember, FormErrors> {
        let mut errors = FormErrors::new();

        let passport_raw = self.passport_number.trim();
        if passport_raw.is_empty() {
            errors.push(ValidationError::Required {
                field: "passport_number",
            });
        } else if passport_raw.chars().count() < MIN_PASSPORT_LEN {
            errors.push(ValidationError::PassportTooShort {
                min: MIN_PASSPORT_LEN,
            });
        }

        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors.push(ValidationError::Required { field: "first_name" });
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            errors.push(ValidationError::Required { field: "last_name" });
        }

        match self.date_of_birth {
            None => errors.push(ValidationError::Required {
                field: "date_of_birth",
            }),
            Some(dob) if age_on(dob, today) < MIN_MEMBER_AGE as i32 => {
                errors.push(ValidationError::Underage {
                    min_age: MIN_MEMBER_AGE,
                });
            }
            Some(_) => {}
        }

        let nationality = self.nationality.trim();
        if nationality.is_empty() {
            errors.push(ValidationError::Required {
                field: "nationality",
            });
        }

        let date_of_birth = match self.date_of_birth {
            Some(dob) if errors.is_empty() => dob,
            _ => return Err(errors),
        };

        let passport = normalize_passport(passport_raw);
        Ok(ValidatedMember {
            ref_id: passport.ref_id(),
            passport,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            full_name: format!("{first_name} {last_name}"),
            date_of_birth,
            nationality: nationality.to_string(),
        })
    }
}

/// Age in whole years on `today`. Negative when `date_of_birth` is in the future.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn valid_form() -> MemberForm {
        MemberForm {
            passport_number: " a12-345 67 ".into(),
            first_name: "Siti".into(),
            last_name: "Rahman".into(),
            date_of_birth: Some(date(1990, 6, 15)),
            nationality: "MY".into(),
        }
    }

    #[test]
    fn valid_form_produces_normalized_member() {
        let member = valid_form().validate(date(2026, 1, 1)).unwrap();
        assert_eq!(member.passport.as_str(), "A1234567");
        assert_eq!(member.ref_id, normalize_passport("A1234567").ref_id());
        assert_eq!(member.full_name, "Siti Rahman");
        assert_eq!(member.nationality, "MY");
    }

    #[test]
    fn empty_form_reports_every_field() {
        let errors = MemberForm::default().validate(date(2026, 1, 1)).unwrap_err();
        for field in [
            "passport_number",
            "first_name",
            "last_name",
            "date_of_birth",
            "nationality",
        ] {
            assert!(errors.has_field(field), "missing error for {field}");
        }
        assert_eq!(errors.errors().len(), 5);
    }

    #[test]
    fn short_passport_rejected_after_trim() {
        let mut form = valid_form();
        form.passport_number = "  AB12  ".into();
        let errors = form.validate(date(2026, 1, 1)).unwrap_err();
        assert_eq!(
            errors.errors(),
            &[ValidationError::PassportTooShort { min: 5 }]
        );
    }

    #[test]
    fn blank_name_is_required() {
        let mut form = valid_form();
        form.first_name = "   ".into();
        let errors = form.validate(date(2026, 1, 1)).unwrap_err();
        assert!(errors.has_field("first_name"));
    }

    #[test]
    fn age_boundary_is_birthday_aware() {
        let mut form = valid_form();
        form.date_of_birth = Some(date(2006, 3, 10));
        assert!(form.validate(date(2026, 3, 9)).is_err());
        assert!(form.validate(date(2026, 3, 10)).is_ok());
    }

    #[test]
    fn future_birth_date_is_underage() {
        let mut form = valid_form();
        form.date_of_birth = Some(date(2030, 1, 1));
        let errors = form.validate(date(2026, 1, 1)).unwrap_err();
        assert_eq!(errors.errors(), &[ValidationError::Underage { min_age: 20 }]);
    }

    #[test]
    fn age_on_handles_leap_day() {
        assert_eq!(age_on(date(2004, 2, 29), date(2024, 2, 28)), 19);
        assert_eq!(age_on(date(2004, 2, 29), date(2024, 2, 29)), 20);
    }

    #[test]
    fn form_deserializes_with_missing_fields() {
        let form: MemberForm =
            serde_json::from_str(r#"{"passport_number":"A1234567","date_of_birth":"1990-01-02"}"#)
                .unwrap();
        assert_eq!(form.date_of_birth, Some(date(1990, 1, 2)));
        assert!(form.first_name.is_empty());
    }
}
