//! `PostgreSQL` adapters for work item lifecycle persistence.

pub(crate) mod models;
mod repository;
pub(crate) mod schema;

pub use repository::{EnginePgPool, PostgresWorkItemRepository};
pub(crate) use repository::{lock_statement, to_new_row};
