pub mod appointment;
pub mod association;
pub mod bank;
pub mod cancellation;
pub mod group;
pub mod study;
pub mod volunteer;

pub use appointment::{
    Appointment, AppointmentFilters, AppointmentStatus, AppointmentUpdate, NewAppointment, Slot,
};
pub use association::{AssociationKey, STATUS_CANCELLED, STATUS_REGISTERED};
pub use bank::BankDetails;
pub use cancellation::Cancellation;
pub use group::{Group, NewGroup};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
pub use study::{NewStudy, Study};
pub use volunteer::{Volunteer, VolunteerDetails};

/// Spring style page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

/// Paid/archive flags come as booleans, as `0`/`1` or as strings of either.
pub(crate) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(value)) => value,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|value| value != 0.0),
        Some(Value::String(text)) => matches!(text.trim(), "1" | "true" | "TRUE" | "oui"),
        Some(Value::Null | Value::Array(_) | Value::Object(_)) | None => false,
    })
}

/// Like `#[serde(default)]`, but also for an explicit `null`.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
