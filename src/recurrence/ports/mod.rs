//! Port contracts for recurring task definitions.

pub mod repository;

pub use repository::{
    RecurrenceRepository, RecurrenceRepositoryError, RecurrenceRepositoryResult, SpawnOutcome,
    SpawnRequest,
};
