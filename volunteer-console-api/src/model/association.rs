use serde::{Deserialize, Serialize};

use crate::id::{self, GroupId, StudyId, VolunteerId};

pub const STATUS_REGISTERED: &str = "INSCRIT";
pub const STATUS_CANCELLED: &str = "ANNULE";

/// `EtudeVolontaire`: a volunteer's participation in a study group.
///
/// The backend has no surrogate id for these records. The whole tuple is the key, so a record is
/// addressed by sending every field back, and a change produces a new key. Values of this type are
/// never modified in place; the `with_*` methods return the key the record will have afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssociationKey {
    #[serde(rename = "idEtude")]
    study_id: StudyId,
    #[serde(rename = "idGroupe")]
    group_id: GroupId,
    #[serde(rename = "idVolontaire", default, deserialize_with = "id::optional")]
    volunteer_id: Option<VolunteerId>,
    #[serde(rename = "iv", default, deserialize_with = "super::or_default")]
    compensation: u32,
    #[serde(rename = "numsujet", default, deserialize_with = "super::or_default")]
    subject_number: u32,
    #[serde(rename = "paye", default, deserialize_with = "super::flag")]
    paid: bool,
    #[serde(rename = "statut", default, deserialize_with = "super::or_default")]
    status: String,
}

impl AssociationKey {
    /// A fresh registration: no compensation yet, subject number 0, unpaid, `INSCRIT`.
    #[must_use]
    pub fn new(study_id: StudyId, group_id: GroupId, volunteer_id: VolunteerId) -> Self {
        Self {
            study_id,
            group_id,
            volunteer_id: Some(volunteer_id),
            compensation: 0,
            subject_number: 0,
            paid: false,
            status: STATUS_REGISTERED.to_owned(),
        }
    }

    #[must_use]
    pub const fn study_id(&self) -> StudyId {
        self.study_id
    }

    #[must_use]
    pub const fn group_id(&self) -> GroupId {
        self.group_id
    }

    #[must_use]
    pub const fn volunteer_id(&self) -> Option<VolunteerId> {
        self.volunteer_id
    }

    #[must_use]
    pub const fn compensation(&self) -> u32 {
        self.compensation
    }

    #[must_use]
    pub const fn subject_number(&self) -> u32 {
        self.subject_number
    }

    #[must_use]
    pub const fn paid(&self) -> bool {
        self.paid
    }

    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_CANCELLED)
    }

    #[must_use]
    pub fn with_group(&self, group_id: GroupId) -> Self {
        Self {
            group_id,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_volunteer(&self, volunteer_id: Option<VolunteerId>) -> Self {
        Self {
            volunteer_id,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_compensation(&self, compensation: u32) -> Self {
        Self {
            compensation,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_subject_number(&self, subject_number: u32) -> Self {
        Self {
            subject_number,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_paid(&self, paid: bool) -> Self {
        Self {
            paid,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_status(&self, status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..self.clone()
        }
    }
}
