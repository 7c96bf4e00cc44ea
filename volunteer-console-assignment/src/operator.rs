use core::fmt;

use volunteer_console_api::model::Slot;

use crate::mass_assignment::Pair;

/// The person at the console. `confirm` blocks until they answer, like the console's dialogs.
pub trait Operator {
    fn confirm(&self, prompt: &Prompt) -> bool;
}

impl<F: Fn(&Prompt) -> bool> Operator for F {
    fn confirm(&self, prompt: &Prompt) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchSide {
    pub volunteer: Option<String>,
    pub slot: Slot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Volunteers whose ethnicity is not among the ones the group asks for.
    EthnicityMismatch {
        volunteers: Vec<String>,
        required: Vec<String>,
    },
    /// Pairs left out because the volunteer already has an appointment in that slot.
    Conflicts { conflicts: Vec<Pair> },
    PartialPairing {
        appointments: usize,
        volunteers: usize,
        pairs: usize,
    },
    Unassign { count: usize },
    Switch { first: SwitchSide, second: SwitchSide },
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EthnicityMismatch {
                volunteers,
                required,
            } => write!(
                f,
                "{} does not match the group's ethnicities ({}). Select anyway?",
                volunteers.join(", "),
                required.join(", ")
            ),
            Self::Conflicts { conflicts } => {
                writeln!(
                    f,
                    "{} volunteer(s) already have an appointment at that time:",
                    conflicts.len()
                )?;
                for pair in conflicts {
                    writeln!(
                        f,
                        "- {} on {}",
                        pair.volunteer.display_name(),
                        pair.appointment.slot()
                    )?;
                }
                f.write_str("Continue with the other appointments only?")
            }
            Self::PartialPairing {
                appointments,
                volunteers,
                pairs,
            } => write!(
                f,
                "{appointments} appointment(s) and {volunteers} volunteer(s) are selected, only \
                 {pairs} assignment(s) will be made. Continue?"
            ),
            Self::Unassign { count } => {
                write!(f, "Remove the volunteer from {count} appointment(s)?")
            }
            Self::Switch { first, second } => {
                let name = |side: &SwitchSide| {
                    side.volunteer
                        .clone()
                        .unwrap_or_else(|| "no volunteer".to_owned())
                };
                write!(
                    f,
                    "Switch {} ({}) with {} ({})?",
                    name(first),
                    first.slot,
                    name(second),
                    second.slot
                )
            }
        }
    }
}
