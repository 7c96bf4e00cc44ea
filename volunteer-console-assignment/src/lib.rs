//! Assignment workflows of the volunteer console: mass assignment, switching, association
//! bookkeeping, overlap warnings and the payment view, on top of any [`Backend`].

pub mod backend;
pub mod batch;
pub mod board;
pub mod conflicts;
pub mod console;
pub mod error;
pub mod mass_assignment;
pub mod operator;
pub mod overlap;
pub mod payments;
pub mod reconciler;
pub mod selection;
pub mod switcher;
#[cfg(test)]
mod testing;

pub use backend::Backend;
pub use board::StudyBoard;
pub use console::Console;
pub use error::{Rollback, ValidationError, WorkflowError};
pub use mass_assignment::{BatchReport, MassAssignment, Outcome};
pub use operator::{Operator, Prompt};
pub use reconciler::{Reconciler, RemovalOutcome, RemovalStrategy};
pub use selection::{AssignmentSelection, Mode, Strategy};
pub use switcher::{SwitchSelection, Switcher};
