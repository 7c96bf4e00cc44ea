use http::Method;

use crate::client::ApiClient;
use crate::error::Result;
use crate::id::{StudyId, VolunteerId};
use crate::model::Cancellation;

impl ApiClient {
    pub async fn cancellations_by_study(&self, study_id: StudyId) -> Result<Vec<Cancellation>> {
        self.fetch(Method::GET, &format!("/api/annulations/etude/{study_id}"))
            .await
    }

    pub async fn cancellations_by_volunteer(
        &self,
        volunteer_id: VolunteerId,
    ) -> Result<Vec<Cancellation>> {
        self.fetch(
            Method::GET,
            &format!("/api/annulations/volontaire/{volunteer_id}"),
        )
        .await
    }

    pub async fn cancellations_by_volunteer_and_study(
        &self,
        volunteer_id: VolunteerId,
        study_id: StudyId,
    ) -> Result<Vec<Cancellation>> {
        self.fetch(
            Method::GET,
            &format!("/api/annulations/volontaire/{volunteer_id}/etude/{study_id}"),
        )
        .await
    }
}
