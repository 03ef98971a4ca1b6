//! Work item aggregate root.

use super::{
    Actor, ActorId, ContactEmail, CreationDecision, Decision, HistoryEntry, Priority,
    ResolutionNote, WorkItemId, WorkItemKind, WorkItemState, WorkItemTemplate, WorkItemTitle,
};
use crate::recurrence::domain::RecurrenceDefinitionId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Link from a spawned task back to the recurrence occurrence it fulfils.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecurrenceOrigin {
    /// Definition that spawned the task.
    pub definition_id: RecurrenceDefinitionId,
    /// Due instant of the occurrence.
    pub due_at: DateTime<Utc>,
}

/// Everything needed to create a work item besides the creation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemDraft {
    /// Title, description, priority and initial assignee.
    pub template: WorkItemTemplate,
    /// Creating actor; `None` for anonymous or system creation.
    pub creator: Option<ActorId>,
    /// Address of an anonymous submitter.
    pub contact_email: Option<ContactEmail>,
    /// Set when a recurrence definition spawned the item.
    pub recurrence: Option<RecurrenceOrigin>,
}

/// Ticket or task governed by the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    id: WorkItemId,
    state: WorkItemState,
    title: WorkItemTitle,
    description: Option<String>,
    priority: Priority,
    assignee: Option<ActorId>,
    creator: Option<ActorId>,
    contact_email: Option<ContactEmail>,
    resolution_note: Option<ResolutionNote>,
    recurrence: Option<RecurrenceOrigin>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedWorkItemData {
    /// Persisted identifier.
    pub id: WorkItemId,
    /// Persisted state, which also fixes the kind.
    pub state: WorkItemState,
    /// Persisted title.
    pub title: WorkItemTitle,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted assignee.
    pub assignee: Option<ActorId>,
    /// Persisted creator.
    pub creator: Option<ActorId>,
    /// Persisted submitter address.
    pub contact_email: Option<ContactEmail>,
    /// Persisted resolution note.
    pub resolution_note: Option<ResolutionNote>,
    /// Persisted recurrence link.
    pub recurrence: Option<RecurrenceOrigin>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest transition timestamp.
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    /// Creates a new item in the state chosen by the creation decision.
    #[must_use]
    pub fn create(decision: &CreationDecision, draft: WorkItemDraft, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        let WorkItemDraft {
            template,
            creator,
            contact_email,
            recurrence,
        } = draft;

        Self {
            id: WorkItemId::new(),
            state: decision.initial_state,
            title: template.title().clone(),
            description: template.description().map(str::to_owned),
            priority: template.priority(),
            assignee: template.assignee(),
            creator,
            contact_email,
            resolution_note: None,
            recurrence,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an item from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedWorkItemData) -> Self {
        Self {
            id: data.id,
            state: data.state,
            title: data.title,
            description: data.description,
            priority: data.priority,
            assignee: data.assignee,
            creator: data.creator,
            contact_email: data.contact_email,
            resolution_note: data.resolution_note,
            recurrence: data.recurrence,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Applies an accepted decision and returns the matching history entry.
    ///
    /// Callers obtain `decision` from [`super::decide`] against this item's
    /// current state; the method records whatever the decision says.
    pub fn apply(&mut self, decision: &Decision, actor: &Actor, clock: &impl Clock) -> HistoryEntry {
        let timestamp = clock.utc();
        self.state = decision.to;
        if let Some(assignee) = decision.assignee {
            self.assignee = Some(assignee);
        }
        if decision.to.is_terminal() && decision.resolution_note.is_some() {
            self.resolution_note.clone_from(&decision.resolution_note);
        }
        self.updated_at = timestamp;

        HistoryEntry::record(
            self.id,
            actor.id(),
            decision.from,
            decision.to,
            decision.resolution_note.as_ref().map(|note| note.as_str().to_owned()),
            timestamp,
        )
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> WorkItemId {
        self.id
    }

    /// Returns the kind, derived from the state vocabulary.
    #[must_use]
    pub const fn kind(&self) -> WorkItemKind {
        self.state.kind()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> WorkItemState {
        self.state
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &WorkItemTitle {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<ActorId> {
        self.assignee
    }

    /// Returns the creator; `None` for anonymous or system-created items.
    #[must_use]
    pub const fn creator(&self) -> Option<ActorId> {
        self.creator
    }

    /// Returns the anonymous submitter's address, if any.
    #[must_use]
    pub const fn contact_email(&self) -> Option<&ContactEmail> {
        self.contact_email.as_ref()
    }

    /// Returns the resolution note, if any.
    #[must_use]
    pub const fn resolution_note(&self) -> Option<&ResolutionNote> {
        self.resolution_note.as_ref()
    }

    /// Returns the recurrence link for scheduler-spawned tasks.
    #[must_use]
    pub const fn recurrence(&self) -> Option<&RecurrenceOrigin> {
        self.recurrence.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the timestamp of the latest accepted transition.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
