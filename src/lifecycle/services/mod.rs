//! Lifecycle orchestration services.

mod lifecycle;

pub use lifecycle::{
    CreateWorkItemRequest, DEFAULT_RETRY_BACKOFF, LifecycleError, LifecycleErrorKind,
    LifecycleResult, LifecycleService, StagedCreation, TransitionRequest,
};
