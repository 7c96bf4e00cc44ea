//! `EtudeVolontaire` endpoints. Every mutator identifies the record by its full key in the query
//! string and names the new value in an extra parameter.

use http::Method;
use serde::Serialize;

use crate::client::{with_query, ApiClient};
use crate::error::Result;
use crate::id::{StudyId, VolunteerId};
use crate::model::AssociationKey;

fn keyed<E: Serialize>(path: &str, key: &AssociationKey, extra: &E) -> Result<String> {
    let path = with_query(path, key)?;
    let extra = serde_urlencoded::to_string(extra)?;
    Ok(if extra.is_empty() {
        path
    } else {
        format!("{path}&{extra}")
    })
}

#[derive(Serialize)]
struct NewVolunteer {
    #[serde(rename = "nouveauVolontaireId", skip_serializing_if = "Option::is_none")]
    volunteer_id: Option<VolunteerId>,
}

impl ApiClient {
    pub async fn associations_by_study(&self, study_id: StudyId) -> Result<Vec<AssociationKey>> {
        self.fetch(
            Method::GET,
            &format!("/api/etude-volontaires/etude/{study_id}"),
        )
        .await
    }

    pub async fn associations_by_volunteer(
        &self,
        volunteer_id: VolunteerId,
    ) -> Result<Vec<AssociationKey>> {
        self.fetch(
            Method::GET,
            &format!("/api/etude-volontaires/volontaire/{volunteer_id}"),
        )
        .await
    }

    pub async fn create_association(&self, key: &AssociationKey) -> Result<()> {
        self.call_with(Method::POST, "/api/etude-volontaires", key)
            .await
    }

    pub async fn create_associations(&self, keys: &[AssociationKey]) -> Result<()> {
        self.call_with(Method::POST, "/api/etude-volontaires/batch", keys)
            .await
    }

    pub async fn update_association_status(&self, key: &AssociationKey, status: &str) -> Result<()> {
        let path = keyed(
            "/api/etude-volontaires/update-statut",
            key,
            &[("nouveauStatut", status)],
        )?;
        self.call(Method::PATCH, &path).await
    }

    pub async fn update_association_paid(&self, key: &AssociationKey, paid: bool) -> Result<()> {
        let path = keyed(
            "/api/etude-volontaires/update-paye",
            key,
            &[("nouveauPaye", paid)],
        )?;
        self.call(Method::PATCH, &path).await
    }

    pub async fn update_association_compensation(
        &self,
        key: &AssociationKey,
        compensation: u32,
    ) -> Result<()> {
        let path = keyed(
            "/api/etude-volontaires/update-iv",
            key,
            &[("nouvelIV", compensation)],
        )?;
        self.call(Method::PATCH, &path).await
    }

    /// `None` detaches the record from its volunteer without deleting it.
    pub async fn update_association_volunteer(
        &self,
        key: &AssociationKey,
        volunteer_id: Option<VolunteerId>,
    ) -> Result<()> {
        let path = keyed(
            "/api/etude-volontaires/update-volontaire",
            key,
            &NewVolunteer { volunteer_id },
        )?;
        self.call(Method::PATCH, &path).await
    }

    pub async fn update_association_subject_number(
        &self,
        key: &AssociationKey,
        subject_number: u32,
    ) -> Result<()> {
        let path = keyed(
            "/api/etude-volontaires/update-numsujet",
            key,
            &[("nouveauNumSujet", subject_number)],
        )?;
        self.call(Method::PATCH, &path).await
    }

    pub async fn delete_association(&self, key: &AssociationKey) -> Result<()> {
        let path = with_query("/api/etude-volontaires/delete", key)?;
        self.call(Method::DELETE, &path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::GroupId;

    #[test]
    fn mutator_query_appends_new_value_after_key() {
        let key = AssociationKey::new(StudyId(10), GroupId(5), VolunteerId(100));
        assert_eq!(
            keyed("/x", &key, &NewVolunteer { volunteer_id: None }).unwrap(),
            "/x?idEtude=10&idGroupe=5&idVolontaire=100&iv=0&numsujet=0&paye=false&statut=INSCRIT"
        );
        assert!(keyed("/x", &key, &[("nouveauNumSujet", 0_u32)])
            .unwrap()
            .ends_with("&statut=INSCRIT&nouveauNumSujet=0"));
    }
}
