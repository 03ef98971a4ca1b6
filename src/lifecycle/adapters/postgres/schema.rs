//! Diesel schema for work item persistence.

diesel::table! {
    /// Tickets and tasks.
    work_items (id) {
        /// Work item identifier.
        id -> Uuid,
        /// Work item kind.
        #[max_length = 20]
        kind -> Varchar,
        /// Lifecycle state within the kind's vocabulary.
        #[max_length = 50]
        state -> Varchar,
        /// Title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Priority label.
        #[max_length = 20]
        priority -> Varchar,
        /// Current assignee.
        assignee_id -> Nullable<Uuid>,
        /// Creating actor; null for anonymous or system creation.
        creator_id -> Nullable<Uuid>,
        /// Anonymous submitter address.
        #[max_length = 320]
        contact_email -> Nullable<Varchar>,
        /// Resolution note recorded on close.
        resolution_note -> Nullable<Text>,
        /// Spawning recurrence definition.
        recurrence_id -> Nullable<Uuid>,
        /// Due instant of the spawning occurrence.
        occurrence_due_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last transition timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit trail of accepted transitions.
    work_item_history (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Insertion order.
        seq -> Int8,
        /// Owning work item.
        work_item_id -> Uuid,
        /// Work item kind, needed to parse the states.
        #[max_length = 20]
        kind -> Varchar,
        /// Acting actor; null for system transitions.
        actor_id -> Nullable<Uuid>,
        /// State before the transition.
        #[max_length = 50]
        from_state -> Varchar,
        /// State after the transition.
        #[max_length = 50]
        to_state -> Varchar,
        /// Optional note.
        note -> Nullable<Text>,
        /// Commit timestamp.
        created_at -> Timestamptz,
    }
}
