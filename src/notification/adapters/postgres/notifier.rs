//! `PostgreSQL`-backed notifier.

use super::{
    models::{NewInAppNotificationRow, NewOutboundEmailRow},
    schema::{in_app_notifications, outbound_emails},
};
use crate::lifecycle::adapters::postgres::EnginePgPool;
use crate::notification::{
    domain::{InAppNotification, NotificationRecipient, OutboundEmail},
    ports::{Notifier, NotifierError, NotifierResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

/// Notifier that persists in-app records and queues emails in an outbox
/// table drained by the mail transport.
#[derive(Debug, Clone)]
pub struct PostgresNotifier {
    pool: EnginePgPool,
}

impl PostgresNotifier {
    /// Creates a notifier from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: EnginePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> NotifierResult<T>
    where
        F: FnOnce(&mut PgConnection) -> NotifierResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(|err| NotifierError::Unavailable(err.to_string()))?;
            f(&mut connection)
        })
        .await
        .map_err(NotifierError::persistence)?
    }
}

#[async_trait]
impl Notifier for PostgresNotifier {
    async fn send_email(&self, email: &OutboundEmail) -> NotifierResult<()> {
        let (recipient_actor_id, recipient_email) = match &email.recipient {
            NotificationRecipient::Actor(id) => (Some(id.into_inner()), None),
            NotificationRecipient::Email(address) => (None, Some(address.as_str().to_owned())),
        };
        let row = NewOutboundEmailRow {
            id: uuid::Uuid::new_v4(),
            recipient_actor_id,
            recipient_email,
            subject: email.subject.clone(),
            body: email.body.clone(),
            created_at: email.queued_at,
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(outbound_emails::table)
                .values(&row)
                .execute(connection)
                .map_err(NotifierError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn record_in_app(&self, notification: &InAppNotification) -> NotifierResult<()> {
        let row = NewInAppNotificationRow {
            id: notification.id.into_inner(),
            recipient_id: notification.recipient.into_inner(),
            work_item_id: notification.work_item_id.into_inner(),
            event_type: notification.event_type.as_str().to_owned(),
            message: notification.message.clone(),
            created_at: notification.created_at,
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(in_app_notifications::table)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(connection)
                .map_err(NotifierError::persistence)?;
            Ok(())
        })
        .await
    }
}
