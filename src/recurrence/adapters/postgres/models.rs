//! Diesel row models for recurrence persistence.

use super::schema::recurrence_definitions;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result and insert row for recurrence definitions.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = recurrence_definitions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecurrenceDefinitionRow {
    /// Definition identifier.
    pub id: uuid::Uuid,
    /// Template title.
    pub title: String,
    /// Template description.
    pub description: Option<String>,
    /// Template priority label.
    pub priority: String,
    /// Template assignee.
    pub assignee_id: Option<uuid::Uuid>,
    /// Frequency label.
    pub frequency: String,
    /// Monthly anchor day.
    pub anchor_day: i32,
    /// Next due instant.
    pub next_due_at: DateTime<Utc>,
    /// Active flag.
    pub is_active: bool,
    /// Creating administrator.
    pub created_by: Option<uuid::Uuid>,
    /// Latest spawn timestamp.
    pub last_spawned_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Columns an administrator may change.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = recurrence_definitions, treat_none_as_null = true)]
pub struct RecurrenceSettingsChangeset {
    /// Template title.
    pub title: String,
    /// Template description.
    pub description: Option<String>,
    /// Template priority label.
    pub priority: String,
    /// Template assignee.
    pub assignee_id: Option<uuid::Uuid>,
    /// Active flag.
    pub is_active: bool,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Columns advanced by a spawn.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = recurrence_definitions)]
pub struct ScheduleAdvanceChangeset {
    /// Next due instant.
    pub next_due_at: DateTime<Utc>,
    /// Spawn timestamp.
    pub last_spawned_at: DateTime<Utc>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}
