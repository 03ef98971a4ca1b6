//! `PostgreSQL` notifier writing in-app records and an email outbox.

mod models;
mod notifier;
mod schema;

pub use notifier::PostgresNotifier;
