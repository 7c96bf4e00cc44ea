use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::VolunteerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volunteer {
    #[serde(rename = "idVol")]
    pub id: VolunteerId,
    #[serde(rename = "nomVol", default, deserialize_with = "super::or_default")]
    pub last_name: String,
    #[serde(rename = "prenomVol", default, deserialize_with = "super::or_default")]
    pub first_name: String,
    #[serde(rename = "emailVol", default)]
    pub email: Option<String>,
    #[serde(rename = "telPortableVol", default)]
    pub phone: Option<String>,
    #[serde(rename = "ethnie", default)]
    pub ethnicity: Option<String>,
    #[serde(default)]
    pub phototype: Option<String>,
    #[serde(default, deserialize_with = "super::flag")]
    pub archive: bool,
}

impl Volunteer {
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.trim(), self.last_name.trim()) {
            ("", "") => format!("#{}", self.id),
            (first, "") => first.to_owned(),
            ("", last) => last.to_uppercase(),
            (first, last) => format!("{first} {}", last.to_uppercase()),
        }
    }
}

/// The details endpoint returns the volunteer plus a long tail of medical fields the console only displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerDetails {
    #[serde(flatten)]
    pub volunteer: Volunteer,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn names() {
        let volunteer: Volunteer = serde_json::from_value(json!({
            "idVol": 100,
            "nomVol": "Martin",
            "prenomVol": "Claire",
            "archive": 0
        }))
        .unwrap();
        assert_eq!(volunteer.display_name(), "Claire MARTIN");
        assert!(!volunteer.archive);

        let anonymous = Volunteer {
            first_name: String::new(),
            last_name: String::new(),
            ..volunteer
        };
        assert_eq!(anonymous.display_name(), "#100");

        let unnamed: Volunteer = serde_json::from_value(json!({
            "idVol": 101,
            "nomVol": null,
            "prenomVol": null
        }))
        .unwrap();
        assert_eq!(unnamed.display_name(), "#101");
    }

    #[test]
    fn details_keep_unknown_fields() {
        let details: VolunteerDetails = serde_json::from_value(json!({
            "idVol": "7",
            "nomVol": "Durand",
            "prenomVol": "Paul",
            "typePeau": "MIXTE"
        }))
        .unwrap();
        assert_eq!(details.volunteer.id, VolunteerId(7));
        assert_eq!(details.extra.get("typePeau"), Some(&json!("MIXTE")));
    }
}
