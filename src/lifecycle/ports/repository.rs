//! Repository port for work item persistence and audited transitions.

use crate::lifecycle::domain::{
    HistoryEntry, NotificationIntent, TransitionRejection, WorkItem, WorkItemId,
};
use crate::recurrence::domain::RecurrenceDefinitionId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for work item repository operations.
pub type WorkItemRepositoryResult<T> = Result<T, WorkItemRepositoryError>;

/// Decision closure run against the locked, freshly loaded item.
///
/// It must not perform I/O; the repository holds the row lock while it runs.
pub type TransitionFn =
    Box<dyn FnOnce(&WorkItem) -> Result<StagedTransition, TransitionRejection> + Send>;

/// Writes prepared by an accepted decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedTransition {
    /// The item after the transition.
    pub item: WorkItem,
    /// The audit entry to append.
    pub entry: HistoryEntry,
    /// Notifications to emit once the writes commit.
    pub effects: Vec<NotificationIntent>,
}

/// Result of a locked transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Item and history entry were committed together.
    Committed(StagedTransition),
    /// The decision rejected the proposal; nothing was written.
    Rejected(TransitionRejection),
}

/// Work item persistence contract.
#[async_trait]
pub trait WorkItemRepository: Send + Sync {
    /// Stores a new item.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemRepositoryError::DuplicateWorkItem`] when the ID
    /// already exists.
    async fn insert(&self, item: &WorkItem) -> WorkItemRepositoryResult<()>;

    /// Finds an item by identifier.
    ///
    /// Returns `None` when the item does not exist.
    async fn find_by_id(&self, id: WorkItemId) -> WorkItemRepositoryResult<Option<WorkItem>>;

    /// Locks the item, runs `decide` against its current state, and on
    /// acceptance persists the new item state and the history entry in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemRepositoryError::NotFound`] for unknown items,
    /// [`WorkItemRepositoryError::LockTimeout`] when the row lock is not
    /// granted in time, and [`WorkItemRepositoryError::Conflict`] for
    /// transient serialization failures.
    async fn transition(
        &self,
        id: WorkItemId,
        decide: TransitionFn,
    ) -> WorkItemRepositoryResult<TransitionOutcome>;

    /// Returns the item's history, oldest first.
    async fn list_history(&self, id: WorkItemId) -> WorkItemRepositoryResult<Vec<HistoryEntry>>;

    /// Returns the tasks spawned by a recurrence definition, oldest
    /// occurrence first.
    async fn find_by_recurrence(
        &self,
        definition_id: RecurrenceDefinitionId,
    ) -> WorkItemRepositoryResult<Vec<WorkItem>>;
}

/// Errors returned by work item repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkItemRepositoryError {
    /// An item with the same identifier already exists.
    #[error("duplicate work item identifier: {0}")]
    DuplicateWorkItem(WorkItemId),

    /// The recurrence occurrence already produced a task.
    #[error("occurrence {due_at} of recurrence {definition_id} already spawned a task")]
    DuplicateOccurrence {
        /// Spawning definition.
        definition_id: RecurrenceDefinitionId,
        /// Due instant of the occurrence.
        due_at: DateTime<Utc>,
    },

    /// The item was not found.
    #[error("work item not found: {0}")]
    NotFound(WorkItemId),

    /// The store aborted the transaction; retrying may succeed.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// The row lock was not granted within the configured timeout.
    #[error("timed out waiting for the lock on work item {0}")]
    LockTimeout(WorkItemId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkItemRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns whether a single retry of the whole operation is worthwhile.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
