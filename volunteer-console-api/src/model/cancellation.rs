use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::{self, AppointmentId, CancellationId, StudyId, VolunteerId};

/// `Annulation`. Excludes a volunteer's participation and payment from active totals, history is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    #[serde(rename = "idAnnuler")]
    pub id: CancellationId,
    #[serde(rename = "idEtude")]
    pub study_id: StudyId,
    #[serde(rename = "idVol")]
    pub volunteer_id: VolunteerId,
    #[serde(rename = "idRdv", default, deserialize_with = "id::optional")]
    pub appointment_id: Option<AppointmentId>,
    #[serde(rename = "dateAnnulation", default)]
    pub date: Option<NaiveDate>,
    #[serde(rename = "commentaire", default)]
    pub reason: Option<String>,
}
