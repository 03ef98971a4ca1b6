//! Recurrence administration and the spawning scheduler.

mod definitions;
mod scheduler;

pub use definitions::{
    CreateRecurrenceRequest, RecurrenceError, RecurrenceResult, RecurrenceService,
};
pub use scheduler::{
    DEFAULT_BATCH_SIZE, DEFAULT_TICK_INTERVAL, RecurrenceScheduler, SchedulerError,
    SchedulerSettings, TickReport,
};
