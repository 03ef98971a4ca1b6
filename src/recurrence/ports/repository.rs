//! Repository port for recurrence definitions and occurrence spawning.

use crate::lifecycle::domain::WorkItem;
use crate::recurrence::domain::{RecurrenceDefinition, RecurrenceDefinitionId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for recurrence repository operations.
pub type RecurrenceRepositoryResult<T> = Result<T, RecurrenceRepositoryError>;

/// One occurrence to spawn atomically with the schedule advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Definition being advanced.
    pub definition_id: RecurrenceDefinitionId,
    /// `next_due_at` as read by the tick; a stored value that differs means
    /// another tick or an administrator got there first.
    pub expected_due_at: DateTime<Utc>,
    /// The staged task.
    pub item: WorkItem,
    /// Due instant to store after the spawn.
    pub next_due_at: DateTime<Utc>,
    /// Spawn timestamp.
    pub spawned_at: DateTime<Utc>,
}

/// Result of a spawn attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// The task was inserted and the schedule advanced.
    Spawned,
    /// The definition moved on or was deactivated; nothing was written.
    Superseded,
}

/// Recurrence persistence contract.
#[async_trait]
pub trait RecurrenceRepository: Send + Sync {
    /// Stores a new definition.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceRepositoryError::DuplicateDefinition`] when the
    /// ID already exists.
    async fn insert_definition(
        &self,
        definition: &RecurrenceDefinition,
    ) -> RecurrenceRepositoryResult<()>;

    /// Finds a definition by identifier.
    ///
    /// Returns `None` when the definition does not exist.
    async fn find_definition(
        &self,
        id: RecurrenceDefinitionId,
    ) -> RecurrenceRepositoryResult<Option<RecurrenceDefinition>>;

    /// Persists the template and active flag of an existing definition.
    ///
    /// The schedule columns (`next_due_at`, `last_spawned_at`) belong to
    /// [`Self::spawn_occurrence`] and are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceRepositoryError::NotFound`] when the definition
    /// does not exist.
    async fn update_definition(
        &self,
        definition: &RecurrenceDefinition,
    ) -> RecurrenceRepositoryResult<()>;

    /// Returns up to `limit` active definitions due at or before `now`,
    /// most overdue first.
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> RecurrenceRepositoryResult<Vec<RecurrenceDefinition>>;

    /// Locks the definition, checks it is active and still due at
    /// `expected_due_at`, then inserts the task and advances the schedule in
    /// one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceRepositoryError::NotFound`] for unknown
    /// definitions, [`RecurrenceRepositoryError::LockTimeout`] when the row
    /// lock is not granted in time, and other variants for store failures.
    /// Nothing is written on error.
    async fn spawn_occurrence(
        &self,
        request: SpawnRequest,
    ) -> RecurrenceRepositoryResult<SpawnOutcome>;
}

/// Errors returned by recurrence repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RecurrenceRepositoryError {
    /// A definition with the same identifier already exists.
    #[error("duplicate recurrence definition identifier: {0}")]
    DuplicateDefinition(RecurrenceDefinitionId),

    /// The occurrence already produced a task.
    #[error("occurrence {due_at} of recurrence {definition_id} already spawned a task")]
    DuplicateOccurrence {
        /// Spawning definition.
        definition_id: RecurrenceDefinitionId,
        /// Due instant of the occurrence.
        due_at: DateTime<Utc>,
    },

    /// The definition was not found.
    #[error("recurrence definition not found: {0}")]
    NotFound(RecurrenceDefinitionId),

    /// The store aborted the transaction.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// The definition lock was not granted within the configured timeout.
    #[error("timed out waiting for the lock on recurrence definition {0}")]
    LockTimeout(RecurrenceDefinitionId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RecurrenceRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
