//! Assigning many volunteers to many appointments, or clearing many appointments, in one go.

use tracing::{info, warn};
use volunteer_console_api::model::{Appointment, AppointmentUpdate, Group, Volunteer};
use volunteer_console_api::{ApiError, SessionWatch};

use crate::backend::Backend;
use crate::batch::{run_batch, Job};
use crate::board::StudyBoard;
use crate::conflicts::ConflictMap;
use crate::error::{ValidationError, WorkflowError};
use crate::operator::{Operator, Prompt};
use crate::reconciler::Reconciler;
use crate::selection::{AssignmentSelection, Mode, Strategy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub appointment: Appointment,
    pub volunteer: Volunteer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    pub assignable: Vec<Pair>,
    /// The volunteer already has an appointment at exactly that date and time.
    pub conflicts: Vec<Pair>,
}

/// The i-th appointment goes to the i-th volunteer. Leftovers on the longer side stay unpaired.
#[must_use]
pub fn pair_up(
    appointments: &[Appointment],
    volunteers: &[Volunteer],
    conflicts: &ConflictMap,
) -> Pairing {
    let mut pairing = Pairing::default();
    for (appointment, volunteer) in appointments.iter().zip(volunteers) {
        let pair = Pair {
            appointment: appointment.clone(),
            volunteer: volunteer.clone(),
        };
        if conflicts.conflicts(volunteer.id, &appointment.slot()) {
            pairing.conflicts.push(pair);
        } else {
            pairing.assignable.push(pair);
        }
    }
    pairing
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),
    /// The operator said no, nothing was sent.
    Declined,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub applied: usize,
    /// Pairs left out because of a conflict.
    pub skipped: usize,
}

pub struct MassAssignment<'a, B, O: ?Sized> {
    backend: &'a B,
    operator: &'a O,
    session: Option<SessionWatch>,
}

impl<'a, B: Backend, O: Operator + ?Sized> MassAssignment<'a, B, O> {
    pub const fn new(backend: &'a B, operator: &'a O) -> Self {
        Self {
            backend,
            operator,
            session: None,
        }
    }

    /// Stop batches as soon as this session ends.
    #[must_use]
    pub fn with_session(mut self, session: SessionWatch) -> Self {
        self.session = Some(session);
        self
    }

    /// Validates the selection, asks the operator where needed and applies it.
    ///
    /// Once anything was sent, the board is reloaded whether the batch failed or not. The
    /// selection is cleared only when everything went through.
    pub async fn run(
        &self,
        selection: &mut AssignmentSelection,
        board: &mut StudyBoard,
    ) -> Result<Outcome<BatchReport>, WorkflowError> {
        let result = match selection.mode() {
            Mode::Assign => self.assign(selection, board).await,
            Mode::Unassign => self.unassign(selection).await,
        };

        let sent = !matches!(
            result,
            Ok(Outcome::Declined)
                | Err(WorkflowError::Validation(_) | WorkflowError::NotImplemented)
        );
        if !sent {
            return result;
        }
        if matches!(result, Ok(Outcome::Applied(_))) {
            selection.clear();
        }
        if let Err(err) = board.reload(self.backend).await {
            warn!(study_id = %board.study_id(), "board reload after batch failed: {err}");
        }
        result
    }

    async fn assign(
        &self,
        selection: &AssignmentSelection,
        board: &StudyBoard,
    ) -> Result<Outcome<BatchReport>, WorkflowError> {
        let appointments = selection.appointments();
        let volunteers = selection.volunteers();
        if appointments.is_empty() {
            return Err(ValidationError::NoAppointmentSelected.into());
        }
        if volunteers.is_empty() {
            return Err(ValidationError::NoVolunteerSelected.into());
        }
        let Some(group) = selection.group() else {
            return Err(ValidationError::NoGroupSelected.into());
        };
        if selection.strategy() == Strategy::Manual {
            return Err(WorkflowError::NotImplemented);
        }

        let Pairing {
            assignable,
            conflicts,
        } = pair_up(appointments, volunteers, board.conflicts());
        if assignable.is_empty() {
            return Err(ValidationError::NoAssignablePairs.into());
        }
        let skipped = conflicts.len();
        if !conflicts.is_empty() && !self.operator.confirm(&Prompt::Conflicts { conflicts }) {
            return Ok(Outcome::Declined);
        }
        if appointments.len() != volunteers.len()
            && !self.operator.confirm(&Prompt::PartialPairing {
                appointments: appointments.len(),
                volunteers: volunteers.len(),
                pairs: assignable.len(),
            })
        {
            return Ok(Outcome::Declined);
        }

        info!(group_id = %group.id, pairs = assignable.len(), skipped, "assigning");
        let reconciler = Reconciler::new(self.backend);
        let jobs = assignable
            .iter()
            .map(|pair| Job {
                study: pair.appointment.study_id,
                appointment: pair.appointment.id,
                work: self.assign_pair(&reconciler, pair, group),
            })
            .collect();
        let applied = run_batch(jobs, self.session.clone()).await?;
        Ok(Outcome::Applied(BatchReport { applied, skipped }))
    }

    async fn assign_pair(
        &self,
        reconciler: &Reconciler<'a, B>,
        pair: &Pair,
        group: &Group,
    ) -> Result<(), ApiError> {
        let appointment = &pair.appointment;
        reconciler
            .ensure_association(appointment.study_id, group, pair.volunteer.id)
            .await;
        let update = AppointmentUpdate::from(appointment)
            .with_volunteer(Some(pair.volunteer.id))
            .with_group(Some(group.id));
        self.backend.update_appointment(&update).await
    }

    async fn unassign(
        &self,
        selection: &AssignmentSelection,
    ) -> Result<Outcome<BatchReport>, WorkflowError> {
        let appointments = selection.appointments();
        if appointments.is_empty() {
            return Err(ValidationError::NoAppointmentSelected.into());
        }
        if !self.operator.confirm(&Prompt::Unassign {
            count: appointments.len(),
        }) {
            return Ok(Outcome::Declined);
        }

        info!(count = appointments.len(), "unassigning");
        let reconciler = Reconciler::new(self.backend);
        let jobs = appointments
            .iter()
            .map(|appointment| Job {
                study: appointment.study_id,
                appointment: appointment.id,
                work: self.unassign_one(&reconciler, appointment),
            })
            .collect();
        let applied = run_batch(jobs, self.session.clone()).await?;
        Ok(Outcome::Applied(BatchReport {
            applied,
            skipped: 0,
        }))
    }

    async fn unassign_one(
        &self,
        reconciler: &Reconciler<'a, B>,
        appointment: &Appointment,
    ) -> Result<(), ApiError> {
        if let Some(volunteer_id) = appointment.volunteer_id {
            reconciler
                .remove_association(appointment.study_id, volunteer_id)
                .await;
        }
        let update = AppointmentUpdate::from(appointment).with_volunteer(None);
        self.backend.update_appointment(&update).await
    }
}
