use http::Method;
use serde::Serialize;

use crate::client::{with_query, ApiClient};
use crate::error::Result;
use crate::id::{StudyId, VolunteerId};
use crate::model::{NewStudy, Page, Study};

#[derive(Serialize)]
struct PageQuery {
    page: u32,
    size: u32,
}

impl ApiClient {
    pub async fn study(&self, id: StudyId) -> Result<Study> {
        self.fetch(Method::GET, &format!("/api/etudes/{id}")).await
    }

    pub async fn studies(&self) -> Result<Vec<Study>> {
        self.fetch(Method::GET, "/api/etudes").await
    }

    pub async fn studies_page(&self, page: u32, size: u32) -> Result<Page<Study>> {
        let path = with_query("/api/etudes/paginated", &PageQuery { page, size })?;
        self.fetch(Method::GET, &path).await
    }

    pub async fn search_studies(&self, query: &str) -> Result<Vec<Study>> {
        let path = with_query("/api/etudes/search", &[("query", query)])?;
        self.fetch(Method::GET, &path).await
    }

    pub async fn create_study(&self, study: &NewStudy) -> Result<Study> {
        self.submit(Method::POST, "/api/etudes", study).await
    }

    pub async fn update_study(&self, id: StudyId, study: &NewStudy) -> Result<Study> {
        self.submit(Method::PUT, &format!("/api/etudes/{id}"), study)
            .await
    }

    pub async fn delete_study(&self, id: StudyId) -> Result<()> {
        self.call(Method::DELETE, &format!("/api/etudes/{id}")).await
    }

    pub async fn set_study_paid(&self, id: StudyId, paid: bool) -> Result<()> {
        let path = with_query(&format!("/api/etudes/{id}/paye"), &[("paye", paid)])?;
        self.call(Method::PATCH, &path).await
    }

    /// Server side unassign of a volunteer from every association of the study.
    pub async fn unassign_volunteer_from_study(
        &self,
        study_id: StudyId,
        volunteer_id: VolunteerId,
    ) -> Result<()> {
        self.call(
            Method::DELETE,
            &format!("/api/etudes/{study_id}/volontaires/{volunteer_id}"),
        )
        .await
    }
}
