//! Recurrence rule error types

use thiserror::Error;

/// Errors raised when a recurrence rule is built from untrusted input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecurrenceError {
    #[error("Unknown recurrence frequency: {0}")]
    UnknownFrequency(String),

    #[error("Recurrence interval must be at least 1, got {0}")]
    InvalidInterval(i64),

    #[error("No days configured for {0} recurrence")]
    EmptyDays(&'static str),

    #[error("Weekday ordinal out of range (1-7): {0}")]
    WeekdayOutOfRange(i64),

    #[error("Day of month out of range (1-31): {0}")]
    DayOfMonthOutOfRange(i64),

    #[error("Invalid rule syntax: {0}")]
    InvalidSyntax(String),
}

/// Result type alias for recurrence operations
pub type RecurrenceResult<T> = Result<T, RecurrenceError>;
