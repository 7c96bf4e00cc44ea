use serde::{Deserialize, Serialize};

use crate::id::VolunteerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    #[serde(rename = "idVol")]
    pub volunteer_id: VolunteerId,
    #[serde(default, deserialize_with = "super::or_default")]
    pub iban: String,
    #[serde(default, deserialize_with = "super::or_default")]
    pub bic: String,
}
