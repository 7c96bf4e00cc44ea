use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;
use volunteer_console_api::id::{StudyId, VolunteerId};
use volunteer_console_api::model::Volunteer;
use volunteer_console_api::{ApiClient, ApiError, Session};
use volunteer_console_config::Config;

use crate::backend::Backend;
use crate::board::StudyBoard;
use crate::error::WorkflowError;
use crate::mass_assignment::{BatchReport, MassAssignment, Outcome};
use crate::operator::Operator;
use crate::overlap::{check_overlap, OverlapReport, DEFAULT_PADDING_DAYS};
use crate::payments::PaymentLedger;
use crate::reconciler::Reconciler;
use crate::selection::AssignmentSelection;
use crate::switcher::{SwitchSelection, Switcher};

/// Entry point of the assignment screens: a backend, the operator answering prompts, and a guard
/// so only one batch runs at a time.
pub struct Console<B, O> {
    backend: B,
    operator: O,
    session: Option<Session>,
    overlap_padding_days: u32,
    busy: AtomicBool,
}

struct Busy<'a>(&'a AtomicBool);

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<O: Operator> Console<ApiClient, O> {
    pub fn connect(config: &Config, operator: O) -> Result<Self, ApiError> {
        let client = ApiClient::new(config)?;
        let session = client.session().clone();
        Ok(Self::new(client, operator)
            .with_session(session)
            .with_overlap_padding_days(config.overlap_padding_days))
    }
}

impl<B: Backend, O: Operator> Console<B, O> {
    pub const fn new(backend: B, operator: O) -> Self {
        Self {
            backend,
            operator,
            session: None,
            overlap_padding_days: DEFAULT_PADDING_DAYS,
            busy: AtomicBool::new(false),
        }
    }

    /// Batches stop when this session expires.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub fn with_overlap_padding_days(mut self, days: u32) -> Self {
        self.overlap_padding_days = days;
        self
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub const fn operator(&self) -> &O {
        &self.operator
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<Busy<'_>, WorkflowError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            debug!("rejected, another operation is running");
            return Err(WorkflowError::Busy);
        }
        Ok(Busy(&self.busy))
    }

    pub const fn reconciler(&self) -> Reconciler<'_, B> {
        Reconciler::new(&self.backend)
    }

    pub async fn load_board(&self, study_id: StudyId) -> Result<StudyBoard, ApiError> {
        StudyBoard::load(&self.backend, study_id).await
    }

    pub fn select_volunteer(
        &self,
        selection: &mut AssignmentSelection,
        volunteer: &Volunteer,
    ) -> bool {
        selection.select_volunteer(volunteer, &self.operator)
    }

    pub fn select_all_volunteers(
        &self,
        selection: &mut AssignmentSelection,
        volunteers: &[Volunteer],
    ) -> usize {
        selection.select_all_volunteers(volunteers, &self.operator)
    }

    pub async fn mass_assign(
        &self,
        selection: &mut AssignmentSelection,
        board: &mut StudyBoard,
    ) -> Result<Outcome<BatchReport>, WorkflowError> {
        let _busy = self.begin()?;
        let mut assignment = MassAssignment::new(&self.backend, &self.operator);
        if let Some(session) = &self.session {
            assignment = assignment.with_session(session.subscribe());
        }
        assignment.run(selection, board).await
    }

    /// Clears the selection once the switch went through.
    pub async fn switch(
        &self,
        selection: &mut SwitchSelection,
    ) -> Result<Outcome<()>, WorkflowError> {
        let _busy = self.begin()?;
        let outcome = Switcher::new(&self.backend, &self.operator)
            .switch(selection)
            .await?;
        if outcome == Outcome::Applied(()) {
            selection.clear();
        }
        Ok(outcome)
    }

    pub async fn check_overlap(
        &self,
        volunteer_id: VolunteerId,
        study_id: StudyId,
    ) -> Result<OverlapReport, ApiError> {
        check_overlap(
            &self.backend,
            volunteer_id,
            study_id,
            self.overlap_padding_days,
        )
        .await
    }

    pub async fn payment_ledger(&self, study_id: StudyId) -> Result<PaymentLedger, ApiError> {
        PaymentLedger::load(&self.backend, study_id).await
    }
}

#[cfg(test)]
mod tests {
    use volunteer_console_api::id::AppointmentId;

    use super::*;
    use crate::operator::Prompt;
    use crate::testing::{appointment, group, volunteer, MemoryBackend, ScriptedOperator};

    fn console(answers: &[bool]) -> Console<MemoryBackend, ScriptedOperator> {
        let backend = MemoryBackend::default();
        backend.insert_appointment(appointment(10, 1, 1, "09h00", Some(100)));
        backend.insert_appointment(appointment(10, 2, 1, "10h00", Some(200)));
        backend.insert_appointment(appointment(20, 3, 5, "09h00", Some(100)));
        backend.insert_volunteer(volunteer(100, "Claire", Some("CAUCASIEN")));
        backend.insert_volunteer(volunteer(200, "Awa", Some("AFRICAIN")));
        Console::new(backend, ScriptedOperator::answering(answers)).with_overlap_padding_days(3)
    }

    #[tokio::test]
    async fn one_operation_at_a_time() {
        let console = console(&[true]);
        let mut board = console.load_board(StudyId(10)).await.unwrap();
        let mut selection = AssignmentSelection::new();
        selection.select_all_appointments(board.appointments());

        let busy = console.begin().unwrap();
        assert!(console.is_busy());
        let err = console
            .mass_assign(&mut selection, &mut board)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Busy));
        let err = console
            .switch(&mut SwitchSelection::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Busy));
        drop(busy);

        // a failed operation releases the guard too
        let err = console
            .switch(&mut SwitchSelection::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert!(!console.is_busy());
    }

    #[tokio::test]
    async fn switch_clears_the_selection() {
        let console = console(&[true]);
        let board = console.load_board(StudyId(10)).await.unwrap();
        let mut selection = SwitchSelection::new();
        selection.select(board.appointment(AppointmentId(1)).unwrap());
        selection.select(board.appointment(AppointmentId(2)).unwrap());

        let outcome = console.switch(&mut selection).await.unwrap();
        assert_eq!(outcome, Outcome::Applied(()));
        assert!(selection.appointments().is_empty());
        assert_eq!(
            console
                .backend()
                .appointment(StudyId(10), AppointmentId(1))
                .volunteer_id,
            Some(VolunteerId(200))
        );
    }

    #[tokio::test]
    async fn selection_goes_through_the_operator() {
        let console = console(&[false]);
        let board = console.load_board(StudyId(10)).await.unwrap();
        let mut selection = AssignmentSelection::new();
        selection.set_group(Some(group(5, 10, 30, Some("CAUCASIEN"))));

        assert_eq!(
            console.select_all_volunteers(&mut selection, board.volunteers()),
            1
        );
        assert_eq!(console.operator().prompts().len(), 1);
        let other = board.volunteer(VolunteerId(200)).unwrap();
        assert!(!console.select_volunteer(&mut selection, other));
    }

    #[tokio::test]
    async fn overlap_uses_the_configured_padding() {
        let console = console(&[]);
        // study 10 is on the 1st, study 20 on the 5th
        let report = console
            .check_overlap(VolunteerId(100), StudyId(10))
            .await
            .unwrap();
        assert!(report.is_empty());

        let console = console.with_overlap_padding_days(4);
        let report = console
            .check_overlap(VolunteerId(100), StudyId(10))
            .await
            .unwrap();
        assert_eq!(report.appointment_count(), 1);
    }

    #[test]
    fn connects_from_config() {
        let config = Config {
            api_url: "http://localhost:8080".to_owned(),
            token: Some("token".to_owned()),
            overlap_padding_days: 2,
            ..Config::default()
        };
        let console = Console::connect(&config, |_: &Prompt| false).unwrap();
        assert_eq!(console.overlap_padding_days, 2);
        assert!(console
            .session
            .as_ref()
            .is_some_and(|session| session.state().is_active()));
        assert!(console.backend().session().state().is_active());
    }
}
