use tracing::debug;
use volunteer_console_api::id::{AppointmentId, VolunteerId};
use volunteer_console_api::model::{Appointment, Group, Volunteer};

use crate::operator::{Operator, Prompt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Assign,
    Unassign,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    #[default]
    Auto,
    Manual,
}

/// Case-insensitive substring match in either direction against any of `required`.
/// A group that requires nothing accepts everyone; a volunteer without an ethnicity matches nothing.
pub fn ethnicity_matches<'a>(
    ethnicity: Option<&str>,
    required: impl IntoIterator<Item = &'a str>,
) -> bool {
    let mut required = required.into_iter().peekable();
    if required.peek().is_none() {
        return true;
    }
    let Some(ethnicity) = ethnicity
        .map(|ethnicity| ethnicity.trim().to_lowercase())
        .filter(|ethnicity| !ethnicity.is_empty())
    else {
        return false;
    };
    required.any(|required| {
        let required = required.to_lowercase();
        ethnicity.contains(&required) || required.contains(&ethnicity)
    })
}

/// What the operator has ticked on the assignment screen. Selection order is pairing order.
#[derive(Debug, Clone, Default)]
pub struct AssignmentSelection {
    mode: Mode,
    strategy: Strategy,
    appointments: Vec<Appointment>,
    volunteers: Vec<Volunteer>,
    group: Option<Group>,
}

impl AssignmentSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Changing the mode drops the selected appointments and volunteers.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            self.mode = mode;
            self.clear();
        }
    }

    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    #[must_use]
    pub const fn group(&self) -> Option<&Group> {
        self.group.as_ref()
    }

    pub fn set_group(&mut self, group: Option<Group>) {
        self.group = group;
    }

    #[must_use]
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    #[must_use]
    pub fn volunteers(&self) -> &[Volunteer] {
        &self.volunteers
    }

    #[must_use]
    pub fn can_select_appointment(&self, appointment: &Appointment) -> bool {
        self.mode == Mode::Assign || appointment.is_assigned()
    }

    /// Returns whether the appointment is selected afterwards.
    pub fn select_appointment(&mut self, appointment: &Appointment) -> bool {
        if !self.can_select_appointment(appointment) {
            debug!(appointment = %appointment.id, "no volunteer to unassign");
            return false;
        }
        if !self.is_appointment_selected(appointment.id) {
            self.appointments.push(appointment.clone());
        }
        true
    }

    /// Selects every eligible appointment, keeping the given order. Returns how many are selected.
    pub fn select_all_appointments(&mut self, appointments: &[Appointment]) -> usize {
        for appointment in appointments {
            self.select_appointment(appointment);
        }
        self.appointments.len()
    }

    pub fn deselect_appointment(&mut self, id: AppointmentId) {
        self.appointments.retain(|appointment| appointment.id != id);
    }

    #[must_use]
    pub fn is_appointment_selected(&self, id: AppointmentId) -> bool {
        self.appointments.iter().any(|appointment| appointment.id == id)
    }

    fn required_ethnicities(&self) -> Vec<String> {
        self.group
            .as_ref()
            .map(|group| group.required_ethnicities().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    fn matches_group(&self, volunteer: &Volunteer) -> bool {
        self.group.as_ref().map_or(true, |group| {
            ethnicity_matches(volunteer.ethnicity.as_deref(), group.required_ethnicities())
        })
    }

    /// Adds the volunteer, asking the operator first when the volunteer does not fit the group's
    /// ethnicities. Returns whether the volunteer is selected afterwards.
    pub fn select_volunteer<O: Operator + ?Sized>(
        &mut self,
        volunteer: &Volunteer,
        operator: &O,
    ) -> bool {
        if self.is_volunteer_selected(volunteer.id) {
            return true;
        }
        if !self.matches_group(volunteer) {
            let prompt = Prompt::EthnicityMismatch {
                volunteers: vec![volunteer.display_name()],
                required: self.required_ethnicities(),
            };
            if !operator.confirm(&prompt) {
                debug!(volunteer = %volunteer.id, "ethnicity override declined");
                return false;
            }
        }
        self.volunteers.push(volunteer.clone());
        true
    }

    /// Adds all volunteers. Mismatching ones are listed in a single prompt; if the operator declines
    /// only the matching ones are added. Returns how many are selected.
    pub fn select_all_volunteers<O: Operator + ?Sized>(
        &mut self,
        volunteers: &[Volunteer],
        operator: &O,
    ) -> usize {
        let candidates: Vec<_> = volunteers
            .iter()
            .filter(|volunteer| !self.is_volunteer_selected(volunteer.id))
            .collect();
        let mismatched: Vec<_> = candidates
            .iter()
            .filter(|volunteer| !self.matches_group(volunteer))
            .map(|volunteer| volunteer.id)
            .collect();

        let include_mismatched = mismatched.is_empty() || {
            let prompt = Prompt::EthnicityMismatch {
                volunteers: candidates
                    .iter()
                    .filter(|volunteer| mismatched.contains(&volunteer.id))
                    .map(|volunteer| volunteer.display_name())
                    .collect(),
                required: self.required_ethnicities(),
            };
            operator.confirm(&prompt)
        };

        for volunteer in candidates {
            if include_mismatched || !mismatched.contains(&volunteer.id) {
                self.volunteers.push(volunteer.clone());
            }
        }
        self.volunteers.len()
    }

    pub fn deselect_volunteer(&mut self, id: VolunteerId) {
        self.volunteers.retain(|volunteer| volunteer.id != id);
    }

    #[must_use]
    pub fn is_volunteer_selected(&self, id: VolunteerId) -> bool {
        self.volunteers.iter().any(|volunteer| volunteer.id == id)
    }

    /// Drops the selected appointments and volunteers. Mode, strategy and group stay.
    pub fn clear(&mut self) {
        self.appointments.clear();
        self.volunteers.clear();
    }
}
