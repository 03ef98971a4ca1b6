//! In-memory work item repository with per-row locks.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::Mutex;

use super::{FaultInjector, InjectedFault, StoreOperation};
use crate::lifecycle::{
    domain::{HistoryEntry, RecurrenceOrigin, WorkItem, WorkItemId},
    ports::{
        TransitionFn, TransitionOutcome, WorkItemRepository, WorkItemRepositoryError,
        WorkItemRepositoryResult,
    },
};
use crate::recurrence::domain::RecurrenceDefinitionId;

/// Lock wait used when no timeout is configured.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Thread-safe in-memory work item repository.
///
/// Each item has its own async lock, so transitions on different items
/// never wait for each other. Reads see the last committed snapshot and
/// never wait on a lock held by an in-flight transition.
#[derive(Debug, Clone)]
pub struct InMemoryWorkItemRepository {
    state: Arc<RwLock<WorkItemStore>>,
    faults: FaultInjector,
    lock_timeout: Duration,
}

#[derive(Debug, Default)]
struct WorkItemStore {
    locks: HashMap<WorkItemId, Arc<Mutex<()>>>,
    committed: HashMap<WorkItemId, WorkItem>,
    history: HashMap<WorkItemId, Vec<HistoryEntry>>,
    occurrences: HashMap<RecurrenceOrigin, WorkItemId>,
}

impl Default for InMemoryWorkItemRepository {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            faults: FaultInjector::default(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl InMemoryWorkItemRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long a transition waits for a row lock.
    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Returns the fault registry shared with sibling adapters.
    #[must_use]
    pub const fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Arms a one-shot fault for the next call of `operation`.
    pub fn inject_fault(&self, operation: StoreOperation, fault: InjectedFault) {
        self.faults.inject(operation, fault);
    }

    pub(crate) const fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Inserts a row without consulting the fault registry.
    ///
    /// Used by the recurrence adapter while it holds a definition lock.
    pub(crate) fn insert_row(&self, item: &WorkItem) -> WorkItemRepositoryResult<()> {
        let mut store = self.write_store()?;
        if store.committed.contains_key(&item.id()) {
            return Err(WorkItemRepositoryError::DuplicateWorkItem(item.id()));
        }
        if let Some(origin) = item.recurrence().copied() {
            if store.occurrences.contains_key(&origin) {
                return Err(WorkItemRepositoryError::DuplicateOccurrence {
                    definition_id: origin.definition_id,
                    due_at: origin.due_at,
                });
            }
            store.occurrences.insert(origin, item.id());
        }
        store.locks.insert(item.id(), Arc::default());
        store.committed.insert(item.id(), item.clone());
        Ok(())
    }

    fn row_lock(&self, id: WorkItemId) -> WorkItemRepositoryResult<Option<Arc<Mutex<()>>>> {
        Ok(self.read_store()?.locks.get(&id).cloned())
    }

    fn read_store(&self) -> WorkItemRepositoryResult<RwLockReadGuard<'_, WorkItemStore>> {
        self.state.read().map_err(|err| {
            WorkItemRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write_store(&self) -> WorkItemRepositoryResult<RwLockWriteGuard<'_, WorkItemStore>> {
        self.state.write().map_err(|err| {
            WorkItemRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn injected(fault: InjectedFault) -> WorkItemRepositoryError {
    match fault {
        InjectedFault::Conflict => {
            WorkItemRepositoryError::Conflict("injected serialization failure".to_owned())
        }
        InjectedFault::Unavailable => {
            WorkItemRepositoryError::persistence(std::io::Error::other("injected outage"))
        }
    }
}

#[async_trait]
impl WorkItemRepository for InMemoryWorkItemRepository {
    async fn insert(&self, item: &WorkItem) -> WorkItemRepositoryResult<()> {
        if let Some(fault) = self.faults.take(StoreOperation::InsertWorkItem) {
            return Err(injected(fault));
        }
        self.insert_row(item)
    }

    async fn find_by_id(&self, id: WorkItemId) -> WorkItemRepositoryResult<Option<WorkItem>> {
        Ok(self.read_store()?.committed.get(&id).cloned())
    }

    async fn transition(
        &self,
        id: WorkItemId,
        decide: TransitionFn,
    ) -> WorkItemRepositoryResult<TransitionOutcome> {
        let lock = self
            .row_lock(id)?
            .ok_or(WorkItemRepositoryError::NotFound(id))?;
        let _guard = tokio::time::timeout(self.lock_timeout, lock.lock())
            .await
            .map_err(|_| WorkItemRepositoryError::LockTimeout(id))?;

        if let Some(fault) = self.faults.take(StoreOperation::Transition) {
            return Err(injected(fault));
        }

        let current = self
            .read_store()?
            .committed
            .get(&id)
            .cloned()
            .ok_or(WorkItemRepositoryError::NotFound(id))?;
        let staged = match decide(&current) {
            Ok(staged) => staged,
            Err(rejection) => return Ok(TransitionOutcome::Rejected(rejection)),
        };

        let mut store = self.write_store()?;
        store
            .history
            .entry(id)
            .or_default()
            .push(staged.entry.clone());
        store.committed.insert(id, staged.item.clone());
        Ok(TransitionOutcome::Committed(staged))
    }

    async fn list_history(&self, id: WorkItemId) -> WorkItemRepositoryResult<Vec<HistoryEntry>> {
        let store = self.read_store()?;
        Ok(store.history.get(&id).cloned().unwrap_or_default())
    }

    async fn find_by_recurrence(
        &self,
        definition_id: RecurrenceDefinitionId,
    ) -> WorkItemRepositoryResult<Vec<WorkItem>> {
        let store = self.read_store()?;
        let mut spawned: Vec<_> = store
            .occurrences
            .iter()
            .filter(|(origin, _)| origin.definition_id == definition_id)
            .collect();
        spawned.sort_by_key(|(origin, _)| origin.due_at);
        Ok(spawned
            .into_iter()
            .filter_map(|(_, id)| store.committed.get(id).cloned())
            .collect())
    }
}
