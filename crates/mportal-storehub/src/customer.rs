//! StoreHub customer payload.
//!
//! Field mapping from a member submission:
//!
//! | StoreHub field | Source                      |
//! |----------------|-----------------------------|
//! | `refId`        | deterministic reference id  |
//! | `firstName`    | first name                  |
//! | `lastName`     | last name                   |
//! | `address1`     | normalized passport number  |
//! | `state`        | nationality                 |
//! | `birthday`     | date of birth, `YYYY-MM-DD` |
//! | `tags`         | the configured portal tag   |

use chrono::NaiveDate;
use mportal_core::RefId;
use serde::{Deserialize, Serialize};

/// Body of `POST /customers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreHubCustomer {
    pub ref_id: RefId,
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub state: String,
    pub birthday: NaiveDate,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mportal_core::normalize_passport;

    #[test]
    fn serializes_with_storehub_field_names() {
        let passport = normalize_passport("A1234567");
        let customer = StoreHubCustomer {
            ref_id: passport.ref_id(),
            first_name: "Siti".into(),
            last_name: "Rahman".into(),
            address1: passport.to_string(),
            state: "MY".into(),
            birthday: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            tags: vec!["MemberPortal".into()],
        };
        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["refId"], passport.ref_id().to_string());
        assert_eq!(json["firstName"], "Siti");
        assert_eq!(json["lastName"], "Rahman");
        assert_eq!(json["address1"], "A1234567");
        assert_eq!(json["state"], "MY");
        assert_eq!(json["birthday"], "1990-06-15");
        assert_eq!(json["tags"], serde_json::json!(["MemberPortal"]));
    }
}
