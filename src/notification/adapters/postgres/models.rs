//! Diesel row models for notification persistence.

use super::schema::{in_app_notifications, outbound_emails};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Insert model for in-app notifications.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = in_app_notifications)]
pub struct NewInAppNotificationRow {
    /// Record identifier.
    pub id: uuid::Uuid,
    /// Receiving actor.
    pub recipient_id: uuid::Uuid,
    /// Item the notification concerns.
    pub work_item_id: uuid::Uuid,
    /// Event type label.
    pub event_type: String,
    /// Rendered message.
    pub message: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for the email outbox.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = outbound_emails)]
pub struct NewOutboundEmailRow {
    /// Outbox row identifier.
    pub id: uuid::Uuid,
    /// Receiving actor.
    pub recipient_actor_id: Option<uuid::Uuid>,
    /// Receiving address.
    pub recipient_email: Option<String>,
    /// Rendered subject.
    pub subject: String,
    /// Rendered body.
    pub body: String,
    /// Enqueue timestamp.
    pub created_at: DateTime<Utc>,
}
