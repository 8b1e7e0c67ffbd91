//! Greenhouse: plant care schedules, due dates and the "Up Next" worklist

pub mod care;
pub mod config;
pub mod recurrence;

pub use care::{CareKind, CareSchedule, CareTask, GardenStorage, MarkStatus, Plant};
pub use config::Settings;
pub use recurrence::{CalendarContext, RecurrenceFields, RecurrenceRule};
