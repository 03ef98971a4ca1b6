//! Adapter implementations for recurrence persistence.

pub mod memory;
pub mod postgres;
