//! Error types for recurrence definitions.

use super::RecurrenceDefinitionId;
use thiserror::Error;

/// Validation and scheduling failures for recurrence definitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecurrenceDomainError {
    /// The frequency label is unknown.
    #[error("unknown recurrence frequency '{0}'")]
    UnknownFrequency(String),

    /// The anchor day is outside 1..=31.
    #[error("anchor day {0} is outside 1..=31")]
    InvalidAnchorDay(u32),

    /// The next due date is past the representable range.
    #[error("recurrence {0} cannot be scheduled any further")]
    ScheduleExhausted(RecurrenceDefinitionId),
}
