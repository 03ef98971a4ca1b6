//! Rendered deliverables: outbound email and in-app records.

use super::{NotificationEventType, NotificationRecipient};
use crate::lifecycle::domain::{ActorId, WorkItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an in-app notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InAppNotificationId(Uuid);

impl InAppNotificationId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for InAppNotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InAppNotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Email handed to the external mail transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    /// Recipient; actor addresses are resolved by the transport.
    pub recipient: NotificationRecipient,
    /// Rendered subject line.
    pub subject: String,
    /// Rendered plain-text body.
    pub body: String,
    /// When the dispatcher produced the message.
    pub queued_at: DateTime<Utc>,
}

/// Durable notification shown in the recipient's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InAppNotification {
    /// Record identifier.
    pub id: InAppNotificationId,
    /// Receiving actor.
    pub recipient: ActorId,
    /// Item the notification concerns.
    pub work_item_id: WorkItemId,
    /// What happened.
    pub event_type: NotificationEventType,
    /// Rendered one-line message.
    pub message: String,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}
