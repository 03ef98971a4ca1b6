//! Adapter implementations for work item persistence.

pub mod memory;
pub mod postgres;
