//! Recurrence rules for care schedules
//!
//! This module provides:
//! - The closed rule model (daily, weekly on weekdays, monthly on days)
//! - Next/previous occurrence calculation and date matching
//! - The flat column adapter used by persistence
//! - Display text for rules and due dates

pub mod algorithm;
pub mod errors;
pub mod fields;
pub mod format;
pub mod models;

pub use algorithm::start_of_day;
pub use errors::{RecurrenceError, RecurrenceResult};
pub use fields::RecurrenceFields;
pub use format::{late_text, ordinal_suffix, relative_due_text, weekday_symbols};
pub use models::{CalendarContext, RecurrenceRule};
