use tracing::info;
use volunteer_console_api::id::{AppointmentId, StudyId, VolunteerId};
use volunteer_console_api::model::{Appointment, Volunteer};
use volunteer_console_api::ApiError;

use crate::backend::Backend;
use crate::conflicts::ConflictMap;

/// What the assignment screen shows for one study: its appointments, the volunteers that can be
/// picked, and where those volunteers are already booked.
#[derive(Debug, Clone)]
pub struct StudyBoard {
    study_id: StudyId,
    appointments: Vec<Appointment>,
    volunteers: Vec<Volunteer>,
    conflicts: ConflictMap,
}

impl StudyBoard {
    pub async fn load<B: Backend>(backend: &B, study_id: StudyId) -> Result<Self, ApiError> {
        let mut board = Self {
            study_id,
            appointments: Vec::new(),
            volunteers: Vec::new(),
            conflicts: ConflictMap::default(),
        };
        board.reload(backend).await?;
        Ok(board)
    }

    /// Fetches everything again. The board is left untouched if any request fails.
    pub async fn reload<B: Backend>(&mut self, backend: &B) -> Result<(), ApiError> {
        let (mut appointments, volunteers) = futures_util::future::try_join(
            backend.appointments_by_study(self.study_id),
            backend.volunteers(),
        )
        .await?;
        let volunteers: Vec<_> = volunteers
            .into_iter()
            .filter(|volunteer| !volunteer.archive)
            .collect();
        let conflicts =
            ConflictMap::load(backend, volunteers.iter().map(|volunteer| volunteer.id)).await?;

        appointments.sort_by(|a, b| a.slot().cmp(&b.slot()).then(a.id.cmp(&b.id)));
        info!(
            study_id = %self.study_id,
            appointments = appointments.len(),
            volunteers = volunteers.len(),
            "board loaded"
        );
        self.appointments = appointments;
        self.volunteers = volunteers;
        self.conflicts = conflicts;
        Ok(())
    }

    #[must_use]
    pub const fn study_id(&self) -> StudyId {
        self.study_id
    }

    #[must_use]
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    #[must_use]
    pub fn appointment(&self, id: AppointmentId) -> Option<&Appointment> {
        self.appointments
            .iter()
            .find(|appointment| appointment.id == id)
    }

    #[must_use]
    pub fn volunteers(&self) -> &[Volunteer] {
        &self.volunteers
    }

    #[must_use]
    pub fn volunteer(&self, id: VolunteerId) -> Option<&Volunteer> {
        self.volunteers.iter().find(|volunteer| volunteer.id == id)
    }

    #[must_use]
    pub const fn conflicts(&self) -> &ConflictMap {
        &self.conflicts
    }
}
