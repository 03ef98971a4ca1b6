//! Diesel schema for recurrence persistence.

diesel::table! {
    /// Recurring task definitions. Rows are never deleted.
    recurrence_definitions (id) {
        /// Definition identifier.
        id -> Uuid,
        /// Template title.
        #[max_length = 255]
        title -> Varchar,
        /// Template description.
        description -> Nullable<Text>,
        /// Template priority label.
        #[max_length = 20]
        priority -> Varchar,
        /// Template assignee.
        assignee_id -> Nullable<Uuid>,
        /// Frequency label.
        #[max_length = 20]
        frequency -> Varchar,
        /// Day of month monthly schedules return to.
        anchor_day -> Int4,
        /// Due instant of the next occurrence.
        next_due_at -> Timestamptz,
        /// Whether the definition still spawns tasks.
        is_active -> Bool,
        /// Creating administrator.
        created_by -> Nullable<Uuid>,
        /// Timestamp of the latest spawn.
        last_spawned_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
