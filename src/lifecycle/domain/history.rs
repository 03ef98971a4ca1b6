//! Append-only audit records of accepted transitions.

use super::{ActorId, HistoryEntryId, WorkItemId, WorkItemState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted transition. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    id: HistoryEntryId,
    work_item_id: WorkItemId,
    actor: Option<ActorId>,
    from_state: WorkItemState,
    to_state: WorkItemState,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Records a new entry with a fresh identifier.
    #[must_use]
    pub fn record(
        work_item_id: WorkItemId,
        actor: Option<ActorId>,
        from_state: WorkItemState,
        to_state: WorkItemState,
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::from_persisted(
            HistoryEntryId::new(),
            work_item_id,
            actor,
            (from_state, to_state),
            note,
            created_at,
        )
    }

    /// Reconstructs an entry from storage.
    #[must_use]
    pub const fn from_persisted(
        id: HistoryEntryId,
        work_item_id: WorkItemId,
        actor: Option<ActorId>,
        (from_state, to_state): (WorkItemState, WorkItemState),
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            work_item_id,
            actor,
            from_state,
            to_state,
            note,
            created_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> HistoryEntryId {
        self.id
    }

    /// Returns the item the entry belongs to.
    #[must_use]
    pub const fn work_item_id(&self) -> WorkItemId {
        self.work_item_id
    }

    /// Returns the acting actor; `None` for system-generated transitions.
    #[must_use]
    pub const fn actor(&self) -> Option<ActorId> {
        self.actor
    }

    /// Returns the state before the transition.
    #[must_use]
    pub const fn from_state(&self) -> WorkItemState {
        self.from_state
    }

    /// Returns the state after the transition.
    #[must_use]
    pub const fn to_state(&self) -> WorkItemState {
        self.to_state
    }

    /// Returns the recorded note.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Returns when the transition committed.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
