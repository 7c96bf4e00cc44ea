use core::fmt;

use volunteer_console_api::id::{AppointmentId, StudyId};
use volunteer_console_api::ApiError;

/// Caught before anything is sent to the backend.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("select at least one appointment")]
    NoAppointmentSelected,
    #[error("select at least one volunteer")]
    NoVolunteerSelected,
    #[error("select the group the volunteers are assigned to")]
    NoGroupSelected,
    #[error("no appointment is left to assign once conflicts are removed")]
    NoAssignablePairs,
    #[error("select exactly two appointments to switch")]
    SwitchNeedsTwo,
    #[error("both appointments have the same volunteer")]
    SameVolunteer,
}

/// What happened to the first half of a switch after a later step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollback {
    NotNeeded,
    Restored,
    Incomplete,
}

impl fmt::Display for Rollback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotNeeded => "nothing to roll back",
            Self::Restored => "original volunteers restored",
            Self::Incomplete => "rollback failed, check both appointments",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error("backend error: {0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("manual assignment is not implemented yet")]
    NotImplemented,
    #[error("another operation is still running")]
    Busy,
    #[error("session expired after {applied} updates, sign in again and review the rest")]
    SessionExpired { applied: usize },
    #[error(
        "{applied} of {total} updates succeeded, appointment {appointment} of study {study} \
         failed: {source}"
    )]
    Batch {
        applied: usize,
        total: usize,
        study: StudyId,
        appointment: AppointmentId,
        #[source]
        source: ApiError,
    },
    #[error("switch failed at step {step} ({rollback}): {source}")]
    Switch {
        step: u8,
        rollback: Rollback,
        #[source]
        source: ApiError,
    },
}
