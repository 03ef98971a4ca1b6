//! In-memory recurrence repository sharing storage with the work item
//! repository, so spawns insert tasks and advance schedules together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

use crate::lifecycle::{
    adapters::memory::{InMemoryWorkItemRepository, InjectedFault, StoreOperation},
    ports::WorkItemRepositoryError,
};
use crate::recurrence::{
    domain::{RecurrenceDefinition, RecurrenceDefinitionId},
    ports::{
        RecurrenceRepository, RecurrenceRepositoryError, RecurrenceRepositoryResult, SpawnOutcome,
        SpawnRequest,
    },
};

/// Thread-safe in-memory recurrence repository.
#[derive(Debug, Clone)]
pub struct InMemoryRecurrenceRepository {
    definitions: Arc<RwLock<HashMap<RecurrenceDefinitionId, Arc<Mutex<RecurrenceDefinition>>>>>,
    work_items: InMemoryWorkItemRepository,
}

impl InMemoryRecurrenceRepository {
    /// Creates an empty repository that spawns tasks into `work_items`.
    ///
    /// Faults armed on `work_items` also apply to this repository.
    #[must_use]
    pub fn new(work_items: InMemoryWorkItemRepository) -> Self {
        Self {
            definitions: Arc::default(),
            work_items,
        }
    }

    fn row(
        &self,
        id: RecurrenceDefinitionId,
    ) -> RecurrenceRepositoryResult<Option<Arc<Mutex<RecurrenceDefinition>>>> {
        let definitions = self.definitions.read().map_err(|err| {
            RecurrenceRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(definitions.get(&id).cloned())
    }

    fn rows(&self) -> RecurrenceRepositoryResult<Vec<Arc<Mutex<RecurrenceDefinition>>>> {
        let definitions = self.definitions.read().map_err(|err| {
            RecurrenceRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(definitions.values().cloned().collect())
    }

    fn take_fault(&self, operation: StoreOperation) -> RecurrenceRepositoryResult<()> {
        match self.work_items.faults().take(operation) {
            None => Ok(()),
            Some(InjectedFault::Conflict) => Err(RecurrenceRepositoryError::Conflict(
                "injected serialization failure".to_owned(),
            )),
            Some(InjectedFault::Unavailable) => Err(RecurrenceRepositoryError::persistence(
                std::io::Error::other("injected outage"),
            )),
        }
    }
}

fn from_work_item_error(err: WorkItemRepositoryError) -> RecurrenceRepositoryError {
    match err {
        WorkItemRepositoryError::DuplicateOccurrence {
            definition_id,
            due_at,
        } => RecurrenceRepositoryError::DuplicateOccurrence {
            definition_id,
            due_at,
        },
        other => RecurrenceRepositoryError::persistence(other),
    }
}

#[async_trait]
impl RecurrenceRepository for InMemoryRecurrenceRepository {
    async fn insert_definition(
        &self,
        definition: &RecurrenceDefinition,
    ) -> RecurrenceRepositoryResult<()> {
        let mut definitions = self.definitions.write().map_err(|err| {
            RecurrenceRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if definitions.contains_key(&definition.id()) {
            return Err(RecurrenceRepositoryError::DuplicateDefinition(
                definition.id(),
            ));
        }
        definitions.insert(definition.id(), Arc::new(Mutex::new(definition.clone())));
        Ok(())
    }

    async fn find_definition(
        &self,
        id: RecurrenceDefinitionId,
    ) -> RecurrenceRepositoryResult<Option<RecurrenceDefinition>> {
        let Some(row) = self.row(id)? else {
            return Ok(None);
        };
        let definition = row.lock().await.clone();
        Ok(Some(definition))
    }

    async fn update_definition(
        &self,
        definition: &RecurrenceDefinition,
    ) -> RecurrenceRepositoryResult<()> {
        let row = self
            .row(definition.id())?
            .ok_or(RecurrenceRepositoryError::NotFound(definition.id()))?;
        let mut stored = row.lock().await;
        let (next_due_at, last_spawned_at) = (stored.next_due_at(), stored.last_spawned_at());
        let mut updated = definition.clone();
        updated.keep_schedule(next_due_at, last_spawned_at);
        *stored = updated;
        Ok(())
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> RecurrenceRepositoryResult<Vec<RecurrenceDefinition>> {
        self.take_fault(StoreOperation::FindDue)?;

        let mut due = Vec::new();
        for row in self.rows()? {
            let definition = row.lock().await;
            if definition.is_due(now) {
                due.push(definition.clone());
            }
        }
        due.sort_by_key(RecurrenceDefinition::next_due_at);
        due.truncate(limit);
        Ok(due)
    }

    async fn spawn_occurrence(
        &self,
        request: SpawnRequest,
    ) -> RecurrenceRepositoryResult<SpawnOutcome> {
        let row = self
            .row(request.definition_id)?
            .ok_or(RecurrenceRepositoryError::NotFound(request.definition_id))?;
        let mut definition = tokio::time::timeout(self.work_items.lock_timeout(), row.lock())
            .await
            .map_err(|_| RecurrenceRepositoryError::LockTimeout(request.definition_id))?;

        self.take_fault(StoreOperation::SpawnOccurrence)?;

        if !definition.is_active() || definition.next_due_at() != request.expected_due_at {
            return Ok(SpawnOutcome::Superseded);
        }

        self.work_items
            .insert_row(&request.item)
            .map_err(from_work_item_error)?;
        definition.record_spawn(request.next_due_at, request.spawned_at);
        Ok(SpawnOutcome::Spawned)
    }
}
