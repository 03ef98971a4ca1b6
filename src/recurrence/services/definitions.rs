//! Administration of recurrence definitions.

use crate::lifecycle::{
    domain::{
        Actor, ActorId, ActorRole, Priority, WorkItem, WorkItemDomainError, WorkItemTemplate,
        WorkItemTitle,
    },
    ports::{WorkItemRepository, WorkItemRepositoryError},
};
use crate::recurrence::{
    domain::{Frequency, RecurrenceDefinition, RecurrenceDefinitionId},
    ports::{RecurrenceRepository, RecurrenceRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for a new recurrence definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRecurrenceRequest {
    title: String,
    description: Option<String>,
    priority: Priority,
    assignee: Option<ActorId>,
    frequency: Frequency,
    first_due_at: DateTime<Utc>,
}

impl CreateRecurrenceRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, frequency: Frequency, first_due_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::default(),
            assignee: None,
            frequency,
            first_due_at,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the task priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the assignee of every spawned task.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: ActorId) -> Self {
        self.assignee = Some(assignee);
        self
    }
}

/// Service-level errors for recurrence administration.
#[derive(Debug, Error)]
pub enum RecurrenceError {
    /// Template validation failed.
    #[error(transparent)]
    ValidationFailed(#[from] WorkItemDomainError),
    /// Only administrators manage recurrence definitions.
    #[error("role {0} may not manage recurrence definitions")]
    Forbidden(ActorRole),
    /// The definition does not exist.
    #[error("recurrence definition not found: {0}")]
    NotFound(RecurrenceDefinitionId),
    /// Recurrence repository operation failed.
    #[error(transparent)]
    Storage(RecurrenceRepositoryError),
    /// Work item repository operation failed.
    #[error(transparent)]
    WorkItemStorage(#[from] WorkItemRepositoryError),
}

impl From<RecurrenceRepositoryError> for RecurrenceError {
    fn from(err: RecurrenceRepositoryError) -> Self {
        match err {
            RecurrenceRepositoryError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

/// Result type for recurrence administration.
pub type RecurrenceResult<T> = Result<T, RecurrenceError>;

/// Creates, deactivates, and inspects recurrence definitions.
pub struct RecurrenceService<R, W, C>
where
    R: RecurrenceRepository,
    W: WorkItemRepository,
    C: Clock + Send + Sync,
{
    recurrences: Arc<R>,
    work_items: Arc<W>,
    clock: Arc<C>,
}

impl<R, W, C> Clone for RecurrenceService<R, W, C>
where
    R: RecurrenceRepository,
    W: WorkItemRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            recurrences: Arc::clone(&self.recurrences),
            work_items: Arc::clone(&self.work_items),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, W, C> RecurrenceService<R, W, C>
where
    R: RecurrenceRepository,
    W: WorkItemRepository,
    C: Clock + Send + Sync,
{
    /// Creates a recurrence service.
    #[must_use]
    pub const fn new(recurrences: Arc<R>, work_items: Arc<W>, clock: Arc<C>) -> Self {
        Self {
            recurrences,
            work_items,
            clock,
        }
    }

    /// Creates an active definition.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceError::Forbidden`] for non-administrators,
    /// [`RecurrenceError::ValidationFailed`] for an invalid template, and
    /// [`RecurrenceError::Storage`] when persistence fails.
    pub async fn create_definition(
        &self,
        request: CreateRecurrenceRequest,
        actor: &Actor,
    ) -> RecurrenceResult<RecurrenceDefinition> {
        ensure_admin(actor)?;

        let mut template = WorkItemTemplate::new(WorkItemTitle::new(request.title)?)
            .with_priority(request.priority);
        if let Some(description) = request.description {
            template = template.with_description(description);
        }
        if let Some(assignee) = request.assignee {
            template = template.with_assignee(assignee);
        }

        let definition = RecurrenceDefinition::new(
            template,
            request.frequency,
            request.first_due_at,
            actor.id(),
            &*self.clock,
        );
        self.recurrences.insert_definition(&definition).await?;
        info!(
            recurrence_id = %definition.id(),
            frequency = %definition.frequency(),
            next_due_at = %definition.next_due_at(),
            "recurrence definition created"
        );
        Ok(definition)
    }

    /// Stops a definition from spawning further tasks. Deactivating an
    /// inactive definition succeeds without changes.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceError::Forbidden`] for non-administrators,
    /// [`RecurrenceError::NotFound`] for unknown definitions, and
    /// [`RecurrenceError::Storage`] when persistence fails.
    pub async fn deactivate_definition(
        &self,
        id: RecurrenceDefinitionId,
        actor: &Actor,
    ) -> RecurrenceResult<RecurrenceDefinition> {
        ensure_admin(actor)?;

        let mut definition = self.find_definition(id).await?;
        if definition.deactivate(&*self.clock) {
            self.recurrences.update_definition(&definition).await?;
            info!(recurrence_id = %id, "recurrence definition deactivated");
        }
        Ok(definition)
    }

    /// Retrieves a definition.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceError::NotFound`] for unknown definitions and
    /// [`RecurrenceError::Storage`] when the lookup fails.
    pub async fn find_definition(
        &self,
        id: RecurrenceDefinitionId,
    ) -> RecurrenceResult<RecurrenceDefinition> {
        self.recurrences
            .find_definition(id)
            .await?
            .ok_or(RecurrenceError::NotFound(id))
    }

    /// Returns the tasks a definition has spawned, oldest occurrence first.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceError::NotFound`] for unknown definitions and a
    /// storage variant when a lookup fails.
    pub async fn list_spawned_tasks(
        &self,
        id: RecurrenceDefinitionId,
    ) -> RecurrenceResult<Vec<WorkItem>> {
        self.find_definition(id).await?;
        Ok(self.work_items.find_by_recurrence(id).await?)
    }
}

fn ensure_admin(actor: &Actor) -> RecurrenceResult<()> {
    match actor.role() {
        ActorRole::Admin => Ok(()),
        role => Err(RecurrenceError::Forbidden(role)),
    }
}
