use http::Method;

use crate::client::{with_query, ApiClient};
use crate::error::Result;
use crate::id::{AppointmentId, StudyId, VolunteerId};
use crate::model::{
    Appointment, AppointmentFilters, AppointmentStatus, AppointmentUpdate, NewAppointment,
};

impl ApiClient {
    pub async fn appointment(&self, study_id: StudyId, id: AppointmentId) -> Result<Appointment> {
        self.fetch(Method::GET, &format!("/api/rdvs/{study_id}/{id}"))
            .await
    }

    pub async fn appointments_by_study(&self, study_id: StudyId) -> Result<Vec<Appointment>> {
        self.fetch(Method::GET, &format!("/api/rdvs/etude/{study_id}"))
            .await
    }

    pub async fn appointments_by_volunteer(
        &self,
        volunteer_id: VolunteerId,
    ) -> Result<Vec<Appointment>> {
        self.fetch(Method::GET, &format!("/api/rdvs/volontaire/{volunteer_id}"))
            .await
    }

    pub async fn search_appointments(
        &self,
        filters: &AppointmentFilters,
    ) -> Result<Vec<Appointment>> {
        let path = with_query("/api/rdvs/search", filters)?;
        self.fetch(Method::GET, &path).await
    }

    pub async fn create_appointment(&self, appointment: &NewAppointment) -> Result<Appointment> {
        self.submit(Method::POST, "/api/rdvs", appointment).await
    }

    pub async fn update_appointment(&self, update: &AppointmentUpdate) -> Result<()> {
        self.call_with(
            Method::PUT,
            &format!(
                "/api/rdvs/{}/{}",
                update.study_id(),
                update.appointment_id()
            ),
            update,
        )
        .await
    }

    pub async fn update_appointment_status(
        &self,
        study_id: StudyId,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<()> {
        let path = with_query(
            &format!("/api/rdvs/{study_id}/{id}/etat"),
            &[("etat", status)],
        )?;
        self.call(Method::PATCH, &path).await
    }

    pub async fn delete_appointment(&self, study_id: StudyId, id: AppointmentId) -> Result<()> {
        self.call(Method::DELETE, &format!("/api/rdvs/{study_id}/{id}"))
            .await
    }
}
