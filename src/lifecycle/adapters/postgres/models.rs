//! Diesel row models for work item persistence.

use super::schema::{work_item_history, work_items};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for work items.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = work_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkItemRow {
    /// Work item identifier.
    pub id: uuid::Uuid,
    /// Kind label.
    pub kind: String,
    /// State label.
    pub state: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Priority label.
    pub priority: String,
    /// Assignee.
    pub assignee_id: Option<uuid::Uuid>,
    /// Creator.
    pub creator_id: Option<uuid::Uuid>,
    /// Submitter address.
    pub contact_email: Option<String>,
    /// Resolution note.
    pub resolution_note: Option<String>,
    /// Spawning recurrence definition.
    pub recurrence_id: Option<uuid::Uuid>,
    /// Occurrence due instant.
    pub occurrence_due_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last transition timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for work items.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = work_items)]
pub struct NewWorkItemRow {
    /// Work item identifier.
    pub id: uuid::Uuid,
    /// Kind label.
    pub kind: String,
    /// State label.
    pub state: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Priority label.
    pub priority: String,
    /// Assignee.
    pub assignee_id: Option<uuid::Uuid>,
    /// Creator.
    pub creator_id: Option<uuid::Uuid>,
    /// Submitter address.
    pub contact_email: Option<String>,
    /// Resolution note.
    pub resolution_note: Option<String>,
    /// Spawning recurrence definition.
    pub recurrence_id: Option<uuid::Uuid>,
    /// Occurrence due instant.
    pub occurrence_due_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last transition timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Columns a transition may change.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = work_items, treat_none_as_null = true)]
pub struct WorkItemTransitionChangeset {
    /// New state label.
    pub state: String,
    /// Assignee after the transition.
    pub assignee_id: Option<uuid::Uuid>,
    /// Resolution note after the transition.
    pub resolution_note: Option<String>,
    /// Transition timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for history entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = work_item_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Owning work item.
    pub work_item_id: uuid::Uuid,
    /// Kind label.
    pub kind: String,
    /// Acting actor.
    pub actor_id: Option<uuid::Uuid>,
    /// State before.
    pub from_state: String,
    /// State after.
    pub to_state: String,
    /// Note.
    pub note: Option<String>,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for history entries; `seq` is assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = work_item_history)]
pub struct NewHistoryRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Owning work item.
    pub work_item_id: uuid::Uuid,
    /// Kind label.
    pub kind: String,
    /// Acting actor.
    pub actor_id: Option<uuid::Uuid>,
    /// State before.
    pub from_state: String,
    /// State after.
    pub to_state: String,
    /// Note.
    pub note: Option<String>,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
}
