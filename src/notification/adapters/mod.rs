//! Adapter implementations for notification delivery.
//!
//! - [`memory`]: recording notifier for tests and local runs.
//! - [`postgres`]: durable in-app records and an outbox for the mail transport.

pub mod memory;
pub mod postgres;
