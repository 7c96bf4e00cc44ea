//! Exchanging the volunteers of two appointments, possibly of different studies.
//!
//! The backend has no transaction, so this takes three updates: free the first appointment, give
//! the second one the first volunteer, give the first one the second volunteer. When step 2 or 3
//! fails, both appointments are put back the way they were as far as the backend lets us.
//!
//! Associations are not touched here. After a switch across groups or studies the association
//! records still point at the old appointments' groups and have to be fixed by hand.

use tracing::{error, info, warn};
use volunteer_console_api::id::{AppointmentId, VolunteerId};
use volunteer_console_api::model::{Appointment, AppointmentUpdate};
use volunteer_console_api::ApiError;

use crate::backend::Backend;
use crate::error::{Rollback, ValidationError, WorkflowError};
use crate::mass_assignment::Outcome;
use crate::operator::{Operator, Prompt, SwitchSide};

/// At most two appointments, in the order they were picked.
#[derive(Debug, Clone, Default)]
pub struct SwitchSelection {
    appointments: Vec<Appointment>,
}

impl SwitchSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when two are already selected.
    pub fn select(&mut self, appointment: &Appointment) -> bool {
        if self.is_selected(appointment) {
            return true;
        }
        if self.appointments.len() >= 2 {
            return false;
        }
        self.appointments.push(appointment.clone());
        true
    }

    pub fn deselect(&mut self, appointment: &Appointment) {
        self.appointments.retain(|selected| !same_appointment(selected, appointment));
    }

    #[must_use]
    pub fn is_selected(&self, appointment: &Appointment) -> bool {
        self.appointments
            .iter()
            .any(|selected| same_appointment(selected, appointment))
    }

    #[must_use]
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    #[must_use]
    pub fn ids(&self) -> Vec<AppointmentId> {
        self.appointments
            .iter()
            .map(|appointment| appointment.id)
            .collect()
    }

    pub fn clear(&mut self) {
        self.appointments.clear();
    }
}

fn same_appointment(a: &Appointment, b: &Appointment) -> bool {
    a.study_id == b.study_id && a.id == b.id
}

pub struct Switcher<'a, B, O: ?Sized> {
    backend: &'a B,
    operator: &'a O,
}

impl<'a, B: Backend, O: Operator + ?Sized> Switcher<'a, B, O> {
    pub const fn new(backend: &'a B, operator: &'a O) -> Self {
        Self { backend, operator }
    }

    async fn name(&self, volunteer_id: Option<VolunteerId>) -> Option<String> {
        let volunteer_id = volunteer_id?;
        Some(match self.backend.volunteer(volunteer_id).await {
            Ok(volunteer) => volunteer.display_name(),
            Err(err) => {
                warn!(%volunteer_id, "could not fetch volunteer name: {err}");
                format!("#{volunteer_id}")
            }
        })
    }

    async fn set_volunteer(
        &self,
        appointment: &Appointment,
        volunteer_id: Option<VolunteerId>,
    ) -> Result<(), ApiError> {
        let update = AppointmentUpdate::from(appointment).with_volunteer(volunteer_id);
        self.backend.update_appointment(&update).await
    }

    /// Puts back the original volunteers of the given appointments.
    async fn roll_back(&self, appointments: &[&Appointment]) -> Rollback {
        let mut rollback = Rollback::Restored;
        for appointment in appointments {
            if let Err(err) = self.set_volunteer(appointment, appointment.volunteer_id).await {
                error!(
                    study_id = %appointment.study_id,
                    appointment = %appointment.id,
                    "rollback failed: {err}"
                );
                rollback = Rollback::Incomplete;
            }
        }
        rollback
    }

    pub async fn switch(&self, selection: &SwitchSelection) -> Result<Outcome<()>, WorkflowError> {
        let [first, second] = selection.appointments() else {
            return Err(ValidationError::SwitchNeedsTwo.into());
        };
        if first.volunteer_id == second.volunteer_id {
            return Err(ValidationError::SameVolunteer.into());
        }

        let prompt = Prompt::Switch {
            first: SwitchSide {
                volunteer: self.name(first.volunteer_id).await,
                slot: first.slot(),
            },
            second: SwitchSide {
                volunteer: self.name(second.volunteer_id).await,
                slot: second.slot(),
            },
        };
        if !self.operator.confirm(&prompt) {
            return Ok(Outcome::Declined);
        }

        info!(first = %Key(first), second = %Key(second), "switching volunteers");
        if let Err(source) = self.set_volunteer(first, None).await {
            return Err(WorkflowError::Switch {
                step: 1,
                rollback: Rollback::NotNeeded,
                source,
            });
        }

        if let Err(source) = self.set_volunteer(second, first.volunteer_id).await {
            let rollback = self.roll_back(&[first]).await;
            return Err(WorkflowError::Switch {
                step: 2,
                rollback,
                source,
            });
        }

        if let Err(source) = self.set_volunteer(first, second.volunteer_id).await {
            let rollback = self.roll_back(&[second, first]).await;
            return Err(WorkflowError::Switch {
                step: 3,
                rollback,
                source,
            });
        }

        info!(first = %Key(first), second = %Key(second), "volunteers switched");
        Ok(Outcome::Applied(()))
    }
}

struct Key<'a>(&'a Appointment);

impl core::fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.0.study_id, self.0.id)
    }
}
