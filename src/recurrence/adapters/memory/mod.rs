//! In-memory adapters for recurrence tests and local runs.

mod definitions;

pub use definitions::InMemoryRecurrenceRepository;
