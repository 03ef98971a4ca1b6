//! Domain model for recurring task definitions.

mod definition;
mod error;
mod frequency;
mod ids;

pub use definition::{PersistedRecurrenceData, RecurrenceDefinition};
pub use error::RecurrenceDomainError;
pub use frequency::Frequency;
pub use ids::RecurrenceDefinitionId;
