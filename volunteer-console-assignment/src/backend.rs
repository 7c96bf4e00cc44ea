use volunteer_console_api::id::{StudyId, VolunteerId};
use volunteer_console_api::model::{
    Appointment, AppointmentUpdate, AssociationKey, BankDetails, Cancellation, Study, Volunteer,
};
use volunteer_console_api::{ApiClient, ApiError};

/// The backend calls the workflow needs.
#[expect(
    async_fn_in_trait,
    reason = "the workflow never spawns these futures onto other threads"
)]
pub trait Backend {
    async fn study(&self, id: StudyId) -> Result<Study, ApiError>;

    async fn volunteer(&self, id: VolunteerId) -> Result<Volunteer, ApiError>;

    async fn volunteers(&self) -> Result<Vec<Volunteer>, ApiError>;

    async fn bank_details(&self, id: VolunteerId) -> Result<Option<BankDetails>, ApiError>;

    async fn appointments_by_study(&self, study_id: StudyId) -> Result<Vec<Appointment>, ApiError>;

    async fn appointments_by_volunteer(
        &self,
        volunteer_id: VolunteerId,
    ) -> Result<Vec<Appointment>, ApiError>;

    async fn update_appointment(&self, update: &AppointmentUpdate) -> Result<(), ApiError>;

    async fn associations_by_study(
        &self,
        study_id: StudyId,
    ) -> Result<Vec<AssociationKey>, ApiError>;

    async fn create_association(&self, key: &AssociationKey) -> Result<(), ApiError>;

    async fn update_association_volunteer(
        &self,
        key: &AssociationKey,
        volunteer_id: Option<VolunteerId>,
    ) -> Result<(), ApiError>;

    async fn update_association_subject_number(
        &self,
        key: &AssociationKey,
        subject_number: u32,
    ) -> Result<(), ApiError>;

    async fn update_association_status(
        &self,
        key: &AssociationKey,
        status: &str,
    ) -> Result<(), ApiError>;

    async fn delete_association(&self, key: &AssociationKey) -> Result<(), ApiError>;

    async fn unassign_volunteer_from_study(
        &self,
        study_id: StudyId,
        volunteer_id: VolunteerId,
    ) -> Result<(), ApiError>;

    async fn cancellations_by_study(&self, study_id: StudyId)
        -> Result<Vec<Cancellation>, ApiError>;
}

impl Backend for ApiClient {
    async fn study(&self, id: StudyId) -> Result<Study, ApiError> {
        Self::study(self, id).await
    }

    async fn volunteer(&self, id: VolunteerId) -> Result<Volunteer, ApiError> {
        Self::volunteer(self, id).await
    }

    async fn volunteers(&self) -> Result<Vec<Volunteer>, ApiError> {
        Self::volunteers(self).await
    }

    async fn bank_details(&self, id: VolunteerId) -> Result<Option<BankDetails>, ApiError> {
        Self::bank_details(self, id).await
    }

    async fn appointments_by_study(&self, study_id: StudyId) -> Result<Vec<Appointment>, ApiError> {
        Self::appointments_by_study(self, study_id).await
    }

    async fn appointments_by_volunteer(
        &self,
        volunteer_id: VolunteerId,
    ) -> Result<Vec<Appointment>, ApiError> {
        Self::appointments_by_volunteer(self, volunteer_id).await
    }

    async fn update_appointment(&self, update: &AppointmentUpdate) -> Result<(), ApiError> {
        Self::update_appointment(self, update).await
    }

    async fn associations_by_study(
        &self,
        study_id: StudyId,
    ) -> Result<Vec<AssociationKey>, ApiError> {
        Self::associations_by_study(self, study_id).await
    }

    async fn create_association(&self, key: &AssociationKey) -> Result<(), ApiError> {
        Self::create_association(self, key).await
    }

    async fn update_association_volunteer(
        &self,
        key: &AssociationKey,
        volunteer_id: Option<VolunteerId>,
    ) -> Result<(), ApiError> {
        Self::update_association_volunteer(self, key, volunteer_id).await
    }

    async fn update_association_subject_number(
        &self,
        key: &AssociationKey,
        subject_number: u32,
    ) -> Result<(), ApiError> {
        Self::update_association_subject_number(self, key, subject_number).await
    }

    async fn update_association_status(
        &self,
        key: &AssociationKey,
        status: &str,
    ) -> Result<(), ApiError> {
        Self::update_association_status(self, key, status).await
    }

    async fn delete_association(&self, key: &AssociationKey) -> Result<(), ApiError> {
        Self::delete_association(self, key).await
    }

    async fn unassign_volunteer_from_study(
        &self,
        study_id: StudyId,
        volunteer_id: VolunteerId,
    ) -> Result<(), ApiError> {
        Self::unassign_volunteer_from_study(self, study_id, volunteer_id).await
    }

    async fn cancellations_by_study(
        &self,
        study_id: StudyId,
    ) -> Result<Vec<Cancellation>, ApiError> {
        Self::cancellations_by_study(self, study_id).await
    }
}
