//! Transient notification events produced after a lifecycle commit.

use crate::lifecycle::domain::{ActorId, ContactEmail, WorkItem, WorkItemId, WorkItemKind, WorkItemState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to the work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEventType {
    /// The item was created.
    Created,
    /// The item was given an assignee.
    Assigned,
    /// Work started on the item.
    StatusChanged,
    /// The item reached its terminal state.
    Closed,
}

impl NotificationEventType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Assigned => "assigned",
            Self::StatusChanged => "status_changed",
            Self::Closed => "closed",
        }
    }
}

impl TryFrom<&str> for NotificationEventType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "created" => Ok(Self::Created),
            "assigned" => Ok(Self::Assigned),
            "status_changed" => Ok(Self::StatusChanged),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown notification event type: {other}")),
        }
    }
}

impl fmt::Display for NotificationEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Party a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationRecipient {
    /// A known actor; also receives an in-app record.
    Actor(ActorId),
    /// An anonymous submitter reachable only by email.
    Email(ContactEmail),
}

impl NotificationRecipient {
    /// Returns the actor when the recipient is one.
    #[must_use]
    pub const fn actor(&self) -> Option<ActorId> {
        match self {
            Self::Actor(id) => Some(*id),
            Self::Email(_) => None,
        }
    }
}

impl fmt::Display for NotificationRecipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actor(id) => write!(f, "actor:{id}"),
            Self::Email(address) => write!(f, "email:{address}"),
        }
    }
}

/// Snapshot of the item used to render messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Item title.
    pub title: String,
    /// Item kind.
    pub kind: WorkItemKind,
    /// State before the change; `None` on creation.
    pub previous_state: Option<WorkItemState>,
    /// State after the change.
    pub state: WorkItemState,
    /// Resolution note recorded on close.
    pub resolution_note: Option<String>,
}

impl NotificationPayload {
    /// Captures the committed item.
    #[must_use]
    pub fn snapshot(item: &WorkItem, previous_state: Option<WorkItemState>) -> Self {
        Self {
            title: item.title().as_str().to_owned(),
            kind: item.kind(),
            previous_state,
            state: item.state(),
            resolution_note: item.resolution_note().map(|note| note.as_str().to_owned()),
        }
    }
}

/// One notification to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Item the event concerns.
    pub work_item_id: WorkItemId,
    /// What happened.
    pub event_type: NotificationEventType,
    /// Who should hear about it.
    pub recipient: NotificationRecipient,
    /// Rendering data.
    pub payload: NotificationPayload,
    /// When the underlying change committed.
    pub occurred_at: DateTime<Utc>,
}
