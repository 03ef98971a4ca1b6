//! `PostgreSQL` adapters for recurrence persistence.

mod models;
mod repository;
mod schema;

pub use repository::PostgresRecurrenceRepository;
