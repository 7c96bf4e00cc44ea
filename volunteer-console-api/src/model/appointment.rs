use core::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::{self, AppointmentId, GroupId, StudyId, VolunteerId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    #[default]
    Planifie,
    Confirme,
    EnAttente,
    Annule,
    Complete,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Planifie => "PLANIFIE",
            Self::Confirme => "CONFIRME",
            Self::EnAttente => "EN_ATTENTE",
            Self::Annule => "ANNULE",
            Self::Complete => "COMPLETE",
        })
    }
}

/// A date and a time as the backend spells it (`09h00`). Two slots clash only when both are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: String,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%d/%m/%Y"), self.time)
    }
}

/// `RendezVous`. Keyed by `(idEtude, idRdv)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(rename = "idEtude")]
    pub study_id: StudyId,
    #[serde(rename = "idRdv")]
    pub id: AppointmentId,
    #[serde(rename = "idGroupe", default, deserialize_with = "id::optional")]
    pub group_id: Option<GroupId>,
    #[serde(rename = "idVolontaire", default, deserialize_with = "id::optional")]
    pub volunteer_id: Option<VolunteerId>,
    pub date: NaiveDate,
    #[serde(rename = "heure", default, deserialize_with = "super::or_default")]
    pub time: String,
    #[serde(rename = "duree", default)]
    pub duration_minutes: Option<u32>,
    #[serde(rename = "etat", default)]
    pub status: AppointmentStatus,
    #[serde(rename = "commentaires", default)]
    pub comment: Option<String>,
}

impl Appointment {
    #[must_use]
    pub fn slot(&self) -> Slot {
        Slot {
            date: self.date,
            time: self.time.clone(),
        }
    }

    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        self.volunteer_id.is_some()
    }
}

/// Body of `PUT /api/rdvs/{idEtude}/{idRdv}`.
///
/// Only obtainable from an existing [`Appointment`], so the ids in the payload are always the ids
/// of the appointment being updated. Everything not explicitly changed is carried over unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentUpdate {
    #[serde(rename = "idEtude")]
    study_id: StudyId,
    #[serde(rename = "idRdv")]
    appointment_id: AppointmentId,
    #[serde(rename = "idGroupe")]
    group_id: Option<GroupId>,
    #[serde(rename = "idVolontaire")]
    volunteer_id: Option<VolunteerId>,
    date: NaiveDate,
    #[serde(rename = "heure")]
    time: String,
    #[serde(rename = "duree")]
    duration_minutes: Option<u32>,
    #[serde(rename = "etat")]
    status: AppointmentStatus,
    #[serde(rename = "commentaires")]
    comment: Option<String>,
}

impl From<&Appointment> for AppointmentUpdate {
    fn from(appointment: &Appointment) -> Self {
        Self {
            study_id: appointment.study_id,
            appointment_id: appointment.id,
            group_id: appointment.group_id,
            volunteer_id: appointment.volunteer_id,
            date: appointment.date,
            time: appointment.time.clone(),
            duration_minutes: appointment.duration_minutes,
            status: appointment.status,
            comment: appointment.comment.clone(),
        }
    }
}

impl AppointmentUpdate {
    #[must_use]
    pub fn with_volunteer(mut self, volunteer_id: Option<VolunteerId>) -> Self {
        self.volunteer_id = volunteer_id;
        self
    }

    #[must_use]
    pub fn with_group(mut self, group_id: Option<GroupId>) -> Self {
        self.group_id = group_id;
        self
    }

    #[must_use]
    pub const fn study_id(&self) -> StudyId {
        self.study_id
    }

    #[must_use]
    pub const fn appointment_id(&self) -> AppointmentId {
        self.appointment_id
    }

    #[must_use]
    pub const fn group_id(&self) -> Option<GroupId> {
        self.group_id
    }

    #[must_use]
    pub const fn volunteer_id(&self) -> Option<VolunteerId> {
        self.volunteer_id
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn time(&self) -> &str {
        &self.time
    }

    #[must_use]
    pub const fn status(&self) -> AppointmentStatus {
        self.status
    }

    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Applies the update to a local copy, the way the backend would.
    pub fn apply_to(&self, appointment: &mut Appointment) {
        appointment.group_id = self.group_id;
        appointment.volunteer_id = self.volunteer_id;
        appointment.date = self.date;
        appointment.time.clone_from(&self.time);
        appointment.duration_minutes = self.duration_minutes;
        appointment.status = self.status;
        appointment.comment.clone_from(&self.comment);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAppointment {
    #[serde(rename = "idEtude")]
    pub study_id: StudyId,
    #[serde(rename = "idGroupe")]
    pub group_id: Option<GroupId>,
    pub date: NaiveDate,
    #[serde(rename = "heure")]
    pub time: String,
    #[serde(rename = "duree")]
    pub duration_minutes: Option<u32>,
    #[serde(rename = "etat")]
    pub status: AppointmentStatus,
    #[serde(rename = "commentaires")]
    pub comment: Option<String>,
}

/// Query of `GET /api/rdvs/search`. Unset filters are left out of the query string.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppointmentFilters {
    #[serde(rename = "idEtude", skip_serializing_if = "Option::is_none")]
    pub study_id: Option<StudyId>,
    #[serde(rename = "idVolontaire", skip_serializing_if = "Option::is_none")]
    pub volunteer_id: Option<VolunteerId>,
    #[serde(rename = "etat", skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(rename = "dateDebut", skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(rename = "dateFin", skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}
