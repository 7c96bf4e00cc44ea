//! In-memory backend and scripted operator for the workflow tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::NaiveDate;
use http::StatusCode;
use volunteer_console_api::id::{AppointmentId, CancellationId, GroupId, StudyId, VolunteerId};
use volunteer_console_api::model::{
    Appointment, AppointmentStatus, AppointmentUpdate, AssociationKey, BankDetails, Cancellation,
    Group, Study, Volunteer,
};
use volunteer_console_api::{ApiError, Session};

use crate::backend::Backend;
use crate::operator::{Operator, Prompt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Study(StudyId),
    Volunteer(VolunteerId),
    Volunteers,
    BankDetails(VolunteerId),
    AppointmentsByStudy(StudyId),
    AppointmentsByVolunteer(VolunteerId),
    UpdateAppointment(AppointmentUpdate),
    AssociationsByStudy(StudyId),
    CreateAssociation(AssociationKey),
    UpdateAssociationVolunteer(AssociationKey, Option<VolunteerId>),
    UpdateAssociationSubjectNumber(AssociationKey, u32),
    UpdateAssociationStatus(AssociationKey, String),
    DeleteAssociation(AssociationKey),
    UnassignVolunteer(StudyId, VolunteerId),
    CancellationsByStudy(StudyId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Study,
    Volunteer,
    Volunteers,
    BankDetails,
    AppointmentsByStudy,
    AppointmentsByVolunteer,
    UpdateAppointment,
    AssociationsByStudy,
    CreateAssociation,
    UpdateAssociationVolunteer,
    UpdateAssociationSubjectNumber,
    UpdateAssociationStatus,
    DeleteAssociation,
    UnassignVolunteer,
    CancellationsByStudy,
}

impl Call {
    const fn operation(&self) -> Operation {
        match self {
            Self::Study(_) => Operation::Study,
            Self::Volunteer(_) => Operation::Volunteer,
            Self::Volunteers => Operation::Volunteers,
            Self::BankDetails(_) => Operation::BankDetails,
            Self::AppointmentsByStudy(_) => Operation::AppointmentsByStudy,
            Self::AppointmentsByVolunteer(_) => Operation::AppointmentsByVolunteer,
            Self::UpdateAppointment(_) => Operation::UpdateAppointment,
            Self::AssociationsByStudy(_) => Operation::AssociationsByStudy,
            Self::CreateAssociation(_) => Operation::CreateAssociation,
            Self::UpdateAssociationVolunteer(..) => Operation::UpdateAssociationVolunteer,
            Self::UpdateAssociationSubjectNumber(..) => Operation::UpdateAssociationSubjectNumber,
            Self::UpdateAssociationStatus(..) => Operation::UpdateAssociationStatus,
            Self::DeleteAssociation(_) => Operation::DeleteAssociation,
            Self::UnassignVolunteer(..) => Operation::UnassignVolunteer,
            Self::CancellationsByStudy(_) => Operation::CancellationsByStudy,
        }
    }

    const fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::UpdateAppointment(_)
                | Self::CreateAssociation(_)
                | Self::UpdateAssociationVolunteer(..)
                | Self::UpdateAssociationSubjectNumber(..)
                | Self::UpdateAssociationStatus(..)
                | Self::DeleteAssociation(_)
                | Self::UnassignVolunteer(..)
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Always,
    /// 1-based.
    Nth(usize),
    From(usize),
    /// Answers 401 on the nth call and expires the session, like the real client.
    ExpireNth(usize),
}

#[derive(Default)]
struct State {
    studies: BTreeMap<StudyId, Study>,
    volunteers: BTreeMap<VolunteerId, Volunteer>,
    bank_details: BTreeMap<VolunteerId, BankDetails>,
    appointments: Vec<Appointment>,
    associations: Vec<AssociationKey>,
    cancellations: Vec<Cancellation>,
    calls: Vec<Call>,
    counts: HashMap<Operation, usize>,
    failures: HashMap<Operation, Failure>,
    session: Option<Session>,
}

fn server_error() -> ApiError {
    ApiError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "injected".to_owned(),
    }
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: StatusCode::NOT_FOUND,
        body: String::new(),
    }
}

fn no_association() -> ApiError {
    ApiError::Status {
        status: StatusCode::BAD_REQUEST,
        body: "no such association".to_owned(),
    }
}

/// Behaves like the backend for the calls the workflow makes and records every one of them.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
    reads_in_flight: AtomicUsize,
    peak_reads_in_flight: AtomicUsize,
}

impl MemoryBackend {
    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    /// Records the call, then applies injected failures.
    fn record(&self, call: Call) -> Result<(), ApiError> {
        self.with_state(|state| {
            let operation = call.operation();
            state.calls.push(call);
            let count = state.counts.entry(operation).or_default();
            *count += 1;
            match state.failures.get(&operation) {
                Some(Failure::Always) => Err(server_error()),
                Some(Failure::Nth(nth)) if *nth == *count => Err(server_error()),
                Some(Failure::From(first)) if *first <= *count => Err(server_error()),
                Some(Failure::ExpireNth(nth)) if *nth == *count => {
                    if let Some(session) = &state.session {
                        session.expire();
                    }
                    Err(ApiError::Unauthorized)
                }
                _ => Ok(()),
            }
        })
    }

    pub fn insert_study(&self, study: Study) {
        self.with_state(|state| state.studies.insert(study.id, study));
    }

    pub fn insert_volunteer(&self, volunteer: Volunteer) {
        self.with_state(|state| state.volunteers.insert(volunteer.id, volunteer));
    }

    pub fn insert_bank_details(&self, details: BankDetails) {
        self.with_state(|state| state.bank_details.insert(details.volunteer_id, details));
    }

    pub fn insert_appointment(&self, appointment: Appointment) {
        self.with_state(|state| state.appointments.push(appointment));
    }

    pub fn insert_association(&self, key: AssociationKey) {
        self.with_state(|state| state.associations.push(key));
    }

    pub fn insert_cancellation(&self, cancellation: Cancellation) {
        self.with_state(|state| state.cancellations.push(cancellation));
    }

    pub fn set_session(&self, session: Session) {
        self.with_state(|state| state.session = Some(session));
    }

    pub fn fail_always(&self, operation: Operation) {
        self.with_state(|state| state.failures.insert(operation, Failure::Always));
    }

    pub fn fail_nth(&self, operation: Operation, nth: usize) {
        self.with_state(|state| state.failures.insert(operation, Failure::Nth(nth)));
    }

    pub fn fail_from(&self, operation: Operation, first: usize) {
        self.with_state(|state| state.failures.insert(operation, Failure::From(first)));
    }

    pub fn expire_on_nth(&self, operation: Operation, nth: usize) {
        self.with_state(|state| state.failures.insert(operation, Failure::ExpireNth(nth)));
    }

    /// Most per-volunteer appointment reads that were pending at the same time.
    pub fn peak_reads_in_flight(&self) -> usize {
        self.peak_reads_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with_state(|state| state.calls.clone())
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.with_state(|state| {
            state
                .calls
                .iter()
                .filter(|call| call.is_mutation())
                .cloned()
                .collect()
        })
    }

    pub fn appointment_updates(&self) -> Vec<AppointmentUpdate> {
        self.with_state(|state| {
            state
                .calls
                .iter()
                .filter_map(|call| match call {
                    Call::UpdateAppointment(update) => Some(update.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn clear_calls(&self) {
        self.with_state(|state| state.calls.clear());
    }

    pub fn appointment(&self, study_id: StudyId, id: AppointmentId) -> Appointment {
        self.with_state(|state| {
            state
                .appointments
                .iter()
                .find(|appointment| appointment.study_id == study_id && appointment.id == id)
                .cloned()
                .unwrap()
        })
    }

    pub fn associations(&self) -> Vec<AssociationKey> {
        self.with_state(|state| state.associations.clone())
    }

    /// Replaces the stored association equal to `key` by `change(key)`.
    fn replace_association(
        &self,
        key: &AssociationKey,
        change: impl FnOnce(&AssociationKey) -> AssociationKey,
    ) -> Result<(), ApiError> {
        self.with_state(|state| {
            let stored = state
                .associations
                .iter_mut()
                .find(|stored| *stored == key)
                .ok_or_else(no_association)?;
            *stored = change(key);
            Ok(())
        })
    }
}

impl Backend for MemoryBackend {
    async fn study(&self, id: StudyId) -> Result<Study, ApiError> {
        self.record(Call::Study(id))?;
        self.with_state(|state| state.studies.get(&id).cloned().ok_or_else(not_found))
    }

    async fn volunteer(&self, id: VolunteerId) -> Result<Volunteer, ApiError> {
        self.record(Call::Volunteer(id))?;
        self.with_state(|state| state.volunteers.get(&id).cloned().ok_or_else(not_found))
    }

    async fn volunteers(&self) -> Result<Vec<Volunteer>, ApiError> {
        self.record(Call::Volunteers)?;
        Ok(self.with_state(|state| state.volunteers.values().cloned().collect()))
    }

    async fn bank_details(&self, id: VolunteerId) -> Result<Option<BankDetails>, ApiError> {
        self.record(Call::BankDetails(id))?;
        Ok(self.with_state(|state| state.bank_details.get(&id).cloned()))
    }

    async fn appointments_by_study(&self, study_id: StudyId) -> Result<Vec<Appointment>, ApiError> {
        self.record(Call::AppointmentsByStudy(study_id))?;
        Ok(self.with_state(|state| {
            state
                .appointments
                .iter()
                .filter(|appointment| appointment.study_id == study_id)
                .cloned()
                .collect()
        }))
    }

    async fn appointments_by_volunteer(
        &self,
        volunteer_id: VolunteerId,
    ) -> Result<Vec<Appointment>, ApiError> {
        self.record(Call::AppointmentsByVolunteer(volunteer_id))?;
        let in_flight = self.reads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_reads_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.reads_in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.with_state(|state| {
            state
                .appointments
                .iter()
                .filter(|appointment| appointment.volunteer_id == Some(volunteer_id))
                .cloned()
                .collect()
        }))
    }

    async fn update_appointment(&self, update: &AppointmentUpdate) -> Result<(), ApiError> {
        self.record(Call::UpdateAppointment(update.clone()))?;
        self.with_state(|state| {
            let appointment = state
                .appointments
                .iter_mut()
                .find(|appointment| {
                    appointment.study_id == update.study_id()
                        && appointment.id == update.appointment_id()
                })
                .ok_or_else(not_found)?;
            update.apply_to(appointment);
            Ok(())
        })
    }

    async fn associations_by_study(
        &self,
        study_id: StudyId,
    ) -> Result<Vec<AssociationKey>, ApiError> {
        self.record(Call::AssociationsByStudy(study_id))?;
        Ok(self.with_state(|state| {
            state
                .associations
                .iter()
                .filter(|key| key.study_id() == study_id)
                .cloned()
                .collect()
        }))
    }

    async fn create_association(&self, key: &AssociationKey) -> Result<(), ApiError> {
        self.record(Call::CreateAssociation(key.clone()))?;
        self.insert_association(key.clone());
        Ok(())
    }

    async fn update_association_volunteer(
        &self,
        key: &AssociationKey,
        volunteer_id: Option<VolunteerId>,
    ) -> Result<(), ApiError> {
        self.record(Call::UpdateAssociationVolunteer(key.clone(), volunteer_id))?;
        self.replace_association(key, |key| key.with_volunteer(volunteer_id))
    }

    async fn update_association_subject_number(
        &self,
        key: &AssociationKey,
        subject_number: u32,
    ) -> Result<(), ApiError> {
        self.record(Call::UpdateAssociationSubjectNumber(
            key.clone(),
            subject_number,
        ))?;
        self.replace_association(key, |key| key.with_subject_number(subject_number))
    }

    async fn update_association_status(
        &self,
        key: &AssociationKey,
        status: &str,
    ) -> Result<(), ApiError> {
        self.record(Call::UpdateAssociationStatus(key.clone(), status.to_owned()))?;
        self.replace_association(key, |key| key.with_status(status))
    }

    async fn delete_association(&self, key: &AssociationKey) -> Result<(), ApiError> {
        self.record(Call::DeleteAssociation(key.clone()))?;
        self.with_state(|state| {
            let before = state.associations.len();
            state.associations.retain(|stored| stored != key);
            if state.associations.len() == before {
                Err(no_association())
            } else {
                Ok(())
            }
        })
    }

    async fn unassign_volunteer_from_study(
        &self,
        study_id: StudyId,
        volunteer_id: VolunteerId,
    ) -> Result<(), ApiError> {
        self.record(Call::UnassignVolunteer(study_id, volunteer_id))?;
        self.with_state(|state| {
            state.associations.retain(|key| {
                key.study_id() != study_id || key.volunteer_id() != Some(volunteer_id)
            });
        });
        Ok(())
    }

    async fn cancellations_by_study(
        &self,
        study_id: StudyId,
    ) -> Result<Vec<Cancellation>, ApiError> {
        self.record(Call::CancellationsByStudy(study_id))?;
        Ok(self.with_state(|state| {
            state
                .cancellations
                .iter()
                .filter(|cancellation| cancellation.study_id == study_id)
                .cloned()
                .collect()
        }))
    }
}

/// Answers prompts from a script, in order, and keeps every prompt it was shown.
/// Runs out of answers by declining.
#[derive(Default)]
pub struct ScriptedOperator {
    answers: RefCell<Vec<bool>>,
    prompts: RefCell<Vec<Prompt>>,
}

impl ScriptedOperator {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().rev().copied().collect()),
            prompts: RefCell::default(),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.borrow().clone()
    }
}

impl Operator for ScriptedOperator {
    fn confirm(&self, prompt: &Prompt) -> bool {
        self.prompts.borrow_mut().push(prompt.clone());
        self.answers.borrow_mut().pop().unwrap_or(false)
    }
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

pub fn appointment(
    study: u32,
    id: u32,
    day: u32,
    time: &str,
    volunteer: Option<u32>,
) -> Appointment {
    Appointment {
        study_id: StudyId(study),
        id: AppointmentId(id),
        group_id: None,
        volunteer_id: volunteer.map(VolunteerId),
        date: date(day),
        time: time.to_owned(),
        duration_minutes: Some(30),
        status: AppointmentStatus::Planifie,
        comment: Some(format!("rdv {id}")),
    }
}

pub fn volunteer(id: u32, first_name: &str, ethnicity: Option<&str>) -> Volunteer {
    Volunteer {
        id: VolunteerId(id),
        last_name: format!("Nom{id}"),
        first_name: first_name.to_owned(),
        email: None,
        phone: None,
        ethnicity: ethnicity.map(str::to_owned),
        phototype: None,
        archive: false,
    }
}

pub fn group(id: u32, study: u32, compensation: u32, ethnicities: Option<&str>) -> Group {
    Group {
        id: GroupId(id),
        study_id: StudyId(study),
        title: format!("Groupe {id}"),
        min_age: Some(18),
        max_age: Some(65),
        ethnicities: ethnicities.map(str::to_owned),
        phototype: None,
        compensation,
        subject_count: None,
    }
}

pub fn study(id: u32, title: &str) -> Study {
    Study {
        id: StudyId(id),
        reference: format!("E{id}"),
        title: title.to_owned(),
        start_date: None,
        end_date: None,
        paid: false,
    }
}

pub fn cancellation(id: u32, study: u32, volunteer: u32) -> Cancellation {
    Cancellation {
        id: CancellationId(id),
        study_id: StudyId(study),
        volunteer_id: VolunteerId(volunteer),
        appointment_id: None,
        date: Some(date(2)),
        reason: Some("desistement".to_owned()),
    }
}
