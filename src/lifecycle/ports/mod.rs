//! Port contracts for work item lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by lifecycle services.

pub mod repository;

pub use repository::{
    StagedTransition, TransitionFn, TransitionOutcome, WorkItemRepository,
    WorkItemRepositoryError, WorkItemRepositoryResult,
};
