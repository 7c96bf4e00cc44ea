use serde::{Deserialize, Serialize};

use crate::id::{GroupId, StudyId};

/// Eligibility cohort of a study. `iv` is the default per-visit compensation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "idGroupe")]
    pub id: GroupId,
    #[serde(rename = "idEtude")]
    pub study_id: StudyId,
    #[serde(rename = "intitule", default, deserialize_with = "super::or_default")]
    pub title: String,
    #[serde(rename = "ageMinimum", default)]
    pub min_age: Option<u32>,
    #[serde(rename = "ageMaximum", default)]
    pub max_age: Option<u32>,
    /// Semicolon separated, e.g. `CAUCASIEN;ASIATIQUE`.
    #[serde(rename = "ethnie", default)]
    pub ethnicities: Option<String>,
    #[serde(default)]
    pub phototype: Option<String>,
    #[serde(rename = "iv", default, deserialize_with = "super::or_default")]
    pub compensation: u32,
    #[serde(rename = "nbSujet", default)]
    pub subject_count: Option<u32>,
}

impl Group {
    pub fn required_ethnicities(&self) -> impl Iterator<Item = &str> {
        self.ethnicities
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|ethnicity| !ethnicity.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGroup {
    #[serde(rename = "idEtude")]
    pub study_id: StudyId,
    #[serde(rename = "intitule")]
    pub title: String,
    #[serde(rename = "ageMinimum")]
    pub min_age: Option<u32>,
    #[serde(rename = "ageMaximum")]
    pub max_age: Option<u32>,
    #[serde(rename = "ethnie")]
    pub ethnicities: Option<String>,
    pub phototype: Option<String>,
    #[serde(rename = "iv")]
    pub compensation: u32,
    #[serde(rename = "nbSujet")]
    pub subject_count: Option<u32>,
}
