//! One module per backend resource group, each adding its endpoints to [`crate::ApiClient`].

pub mod appointments;
pub mod associations;
pub mod cancellations;
pub mod groups;
pub mod studies;
pub mod volunteers;
