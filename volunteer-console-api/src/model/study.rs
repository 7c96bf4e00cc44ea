use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::StudyId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Study {
    #[serde(rename = "idEtude")]
    pub id: StudyId,
    #[serde(rename = "ref", default, deserialize_with = "super::or_default")]
    pub reference: String,
    #[serde(rename = "titre", default, deserialize_with = "super::or_default")]
    pub title: String,
    #[serde(rename = "dateDebut", default)]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "dateFin", default)]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "paye", default, deserialize_with = "super::flag")]
    pub paid: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewStudy {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(rename = "dateDebut")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "dateFin")]
    pub end_date: Option<NaiveDate>,
}
