//! Diesel schema for notification persistence.

diesel::table! {
    /// In-app notifications shown in an actor's inbox.
    in_app_notifications (id) {
        /// Record identifier.
        id -> Uuid,
        /// Receiving actor.
        recipient_id -> Uuid,
        /// Item the notification concerns.
        work_item_id -> Uuid,
        /// Event type label.
        #[max_length = 50]
        event_type -> Varchar,
        /// Rendered message.
        message -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Rendered emails waiting for the external mail transport.
    outbound_emails (id) {
        /// Outbox row identifier.
        id -> Uuid,
        /// Receiving actor, when the recipient is known.
        recipient_actor_id -> Nullable<Uuid>,
        /// Receiving address, for anonymous submitters.
        #[max_length = 320]
        recipient_email -> Nullable<Varchar>,
        /// Rendered subject.
        subject -> Text,
        /// Rendered body.
        body -> Text,
        /// Enqueue timestamp.
        created_at -> Timestamptz,
    }
}
