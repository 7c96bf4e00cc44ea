use std::collections::{HashMap, HashSet};

use futures_util::{stream, StreamExt as _, TryStreamExt as _};
use volunteer_console_api::id::VolunteerId;
use volunteer_console_api::model::{Appointment, Slot};
use volunteer_console_api::ApiError;

use crate::backend::Backend;

/// Upper bound on appointment requests in flight while loading a [`ConflictMap`].
pub const MAX_CONCURRENT_LOADS: usize = 8;

/// Which slots each volunteer already occupies, across every study.
///
/// Only an identical date and time counts as a clash. Overlapping durations do not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictMap {
    slots: HashMap<VolunteerId, HashSet<Slot>>,
}

impl ConflictMap {
    pub fn from_appointments<'a>(appointments: impl IntoIterator<Item = &'a Appointment>) -> Self {
        let mut map = Self::default();
        for appointment in appointments {
            if let Some(volunteer_id) = appointment.volunteer_id {
                map.insert(volunteer_id, appointment.slot());
            }
        }
        map
    }

    /// Fetches the appointments of every volunteer, at most [`MAX_CONCURRENT_LOADS`] at a time.
    /// The first failed request fails the whole load.
    pub async fn load<B: Backend>(
        backend: &B,
        volunteers: impl IntoIterator<Item = VolunteerId>,
    ) -> Result<Self, ApiError> {
        let appointments: Vec<Vec<Appointment>> = stream::iter(volunteers)
            .map(|volunteer_id| backend.appointments_by_volunteer(volunteer_id))
            .buffer_unordered(MAX_CONCURRENT_LOADS)
            .try_collect()
            .await?;
        Ok(Self::from_appointments(appointments.iter().flatten()))
    }

    pub fn insert(&mut self, volunteer_id: VolunteerId, slot: Slot) {
        self.slots.entry(volunteer_id).or_default().insert(slot);
    }

    #[must_use]
    pub fn conflicts(&self, volunteer_id: VolunteerId, slot: &Slot) -> bool {
        self.slots
            .get(&volunteer_id)
            .is_some_and(|slots| slots.contains(slot))
    }

    #[must_use]
    pub fn slots(&self, volunteer_id: VolunteerId) -> Option<&HashSet<Slot>> {
        self.slots.get(&volunteer_id)
    }
}
