use bytes::Bytes;
use http::Method;

use crate::client::{ApiClient, Body};
use crate::error::Result;
use crate::id::VolunteerId;
use crate::model::{BankDetails, Volunteer, VolunteerDetails};

impl ApiClient {
    pub async fn volunteer(&self, id: VolunteerId) -> Result<Volunteer> {
        self.fetch(Method::GET, &format!("/api/volontaires/{id}"))
            .await
    }

    pub async fn volunteers(&self) -> Result<Vec<Volunteer>> {
        self.fetch(Method::GET, "/api/volontaires").await
    }

    pub async fn volunteer_details(&self, id: VolunteerId) -> Result<VolunteerDetails> {
        self.fetch(Method::GET, &format!("/api/volontaires/details/{id}"))
            .await
    }

    pub async fn archive_volunteer(&self, id: VolunteerId) -> Result<()> {
        self.call(Method::PUT, &format!("/api/volontaires/{id}/archive"))
            .await
    }

    pub async fn unarchive_volunteer(&self, id: VolunteerId) -> Result<()> {
        self.call(Method::PUT, &format!("/api/volontaires/{id}/unarchive"))
            .await
    }

    pub async fn delete_volunteer(&self, id: VolunteerId) -> Result<()> {
        self.call(Method::DELETE, &format!("/api/volontaires/{id}"))
            .await
    }

    /// `None` when the volunteer has no bank details on file.
    pub async fn bank_details(&self, id: VolunteerId) -> Result<Option<BankDetails>> {
        match self
            .fetch(Method::GET, &format!("/api/infobancaires/volontaire/{id}"))
            .await
        {
            Ok(details) => Ok(Some(details)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn save_bank_details(&self, details: &BankDetails) -> Result<()> {
        self.call_with(
            Method::PUT,
            &format!("/api/infobancaires/volontaire/{}", details.volunteer_id),
            details,
        )
        .await
    }

    pub async fn volunteer_photo(&self, id: VolunteerId) -> Result<Option<Bytes>> {
        match self
            .execute(
                Method::GET,
                &format!("/api/volontaires/{id}/photo"),
                Body::Empty,
            )
            .await
        {
            Ok(photo) if photo.is_empty() => Ok(None),
            Ok(photo) => Ok(Some(photo)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn upload_volunteer_photo(
        &self,
        id: VolunteerId,
        photo: Bytes,
        content_type: &str,
    ) -> Result<()> {
        self.execute(
            Method::PUT,
            &format!("/api/volontaires/{id}/photo"),
            Body::Raw {
                bytes: photo,
                content_type: content_type.to_owned(),
            },
        )
        .await?;
        Ok(())
    }
}
