use http::Method;
use serde::Serialize;

use crate::client::{with_query, ApiClient};
use crate::error::Result;
use crate::id::{GroupId, StudyId};
use crate::model::{Group, NewGroup};

#[derive(Serialize)]
struct AgeQuery {
    #[serde(rename = "ageMin")]
    min: u32,
    #[serde(rename = "ageMax")]
    max: u32,
}

impl ApiClient {
    pub async fn group(&self, id: GroupId) -> Result<Group> {
        self.fetch(Method::GET, &format!("/api/groupes/{id}")).await
    }

    pub async fn groups_by_study(&self, study_id: StudyId) -> Result<Vec<Group>> {
        self.fetch(Method::GET, &format!("/api/groupes/etude/{study_id}"))
            .await
    }

    pub async fn groups_by_age(&self, min: u32, max: u32) -> Result<Vec<Group>> {
        let path = with_query("/api/groupes/age", &AgeQuery { min, max })?;
        self.fetch(Method::GET, &path).await
    }

    pub async fn groups_by_ethnicity(&self, ethnicity: &str) -> Result<Vec<Group>> {
        let path = with_query("/api/groupes/ethnie", &[("ethnie", ethnicity)])?;
        self.fetch(Method::GET, &path).await
    }

    pub async fn create_group(&self, group: &NewGroup) -> Result<Group> {
        self.submit(Method::POST, "/api/groupes", group).await
    }

    pub async fn update_group(&self, id: GroupId, group: &NewGroup) -> Result<Group> {
        self.submit(Method::PUT, &format!("/api/groupes/{id}"), group)
            .await
    }

    pub async fn delete_group(&self, id: GroupId) -> Result<()> {
        self.call(Method::DELETE, &format!("/api/groupes/{id}")).await
    }
}
