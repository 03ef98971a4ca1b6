//! One-shot fault injection for the in-memory adapters.
//!
//! Faults fire before any write, so an injected failure always leaves the
//! store as it was. Tests use this to simulate serialization conflicts and
//! outages in the middle of a tick or transition.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Store operation a fault can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Inserting a directly created work item.
    InsertWorkItem,
    /// Committing a lifecycle transition.
    Transition,
    /// Spawning a recurrence occurrence.
    SpawnOccurrence,
    /// Querying due recurrence definitions.
    FindDue,
}

/// Failure to raise on the next matching operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFault {
    /// A transient serialization conflict.
    Conflict,
    /// The store is unreachable.
    Unavailable,
}

/// Shared registry of pending faults.
#[derive(Debug, Clone, Default)]
pub struct FaultInjector {
    pending: Arc<Mutex<HashMap<StoreOperation, VecDeque<InjectedFault>>>>,
}

impl FaultInjector {
    /// Arms `fault` for the next call of `operation`. Repeated calls queue
    /// further faults for subsequent calls.
    pub fn inject(&self, operation: StoreOperation, fault: InjectedFault) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.entry(operation).or_default().push_back(fault);
        }
    }

    /// Takes the oldest fault armed for `operation`, if any.
    pub(crate) fn take(&self, operation: StoreOperation) -> Option<InjectedFault> {
        let mut pending = self.pending.lock().ok()?;
        pending.get_mut(&operation)?.pop_front()
    }
}
