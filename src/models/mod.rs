pub mod enums;
pub mod execution;
pub mod notification;
pub mod schedule;
pub mod transition_log;

pub use enums::*;
pub use execution::{Execution, MissedExecution};
pub use notification::Notification;
pub use schedule::{NewSchedule, Schedule};
pub use transition_log::TransitionLogEntry;
