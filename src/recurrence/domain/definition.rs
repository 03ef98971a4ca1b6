//! Recurrence definition aggregate.

use super::{Frequency, RecurrenceDefinitionId, RecurrenceDomainError};
use crate::lifecycle::domain::{ActorId, WorkItemTemplate};
use chrono::{DateTime, Datelike, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Template and schedule for periodically spawned tasks.
///
/// Definitions are never deleted; deactivation stops further spawns and
/// keeps the link from already spawned tasks intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceDefinition {
    id: RecurrenceDefinitionId,
    template: WorkItemTemplate,
    frequency: Frequency,
    anchor_day: u32,
    next_due_at: DateTime<Utc>,
    is_active: bool,
    created_by: Option<ActorId>,
    last_spawned_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecurrenceData {
    /// Persisted identifier.
    pub id: RecurrenceDefinitionId,
    /// Persisted task template.
    pub template: WorkItemTemplate,
    /// Persisted frequency.
    pub frequency: Frequency,
    /// Persisted anchor day of month.
    pub anchor_day: u32,
    /// Persisted next due instant.
    pub next_due_at: DateTime<Utc>,
    /// Persisted active flag.
    pub is_active: bool,
    /// Persisted creator.
    pub created_by: Option<ActorId>,
    /// Persisted last spawn timestamp.
    pub last_spawned_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl RecurrenceDefinition {
    /// Creates an active definition whose first occurrence is due at
    /// `first_due_at`. The day of month of `first_due_at` becomes the
    /// monthly anchor.
    #[must_use]
    pub fn new(
        template: WorkItemTemplate,
        frequency: Frequency,
        first_due_at: DateTime<Utc>,
        created_by: Option<ActorId>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: RecurrenceDefinitionId::new(),
            template,
            frequency,
            anchor_day: first_due_at.day(),
            next_due_at: first_due_at,
            is_active: true,
            created_by,
            last_spawned_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a definition from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceDomainError::InvalidAnchorDay`] when the stored
    /// anchor day is outside 1..=31.
    pub fn from_persisted(data: PersistedRecurrenceData) -> Result<Self, RecurrenceDomainError> {
        if !(1..=31).contains(&data.anchor_day) {
            return Err(RecurrenceDomainError::InvalidAnchorDay(data.anchor_day));
        }
        Ok(Self {
            id: data.id,
            template: data.template,
            frequency: data.frequency,
            anchor_day: data.anchor_day,
            next_due_at: data.next_due_at,
            is_active: data.is_active,
            created_by: data.created_by,
            last_spawned_at: data.last_spawned_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    /// Returns whether an occurrence should spawn at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.next_due_at <= now
    }

    /// Returns the due instant after the current one.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceDomainError::ScheduleExhausted`] past the
    /// representable date range.
    pub fn following_due_at(&self) -> Result<DateTime<Utc>, RecurrenceDomainError> {
        self.frequency
            .advance(self.next_due_at, self.anchor_day)
            .ok_or(RecurrenceDomainError::ScheduleExhausted(self.id))
    }

    /// Records a spawned occurrence and moves the schedule forward.
    pub fn record_spawn(&mut self, next_due_at: DateTime<Utc>, spawned_at: DateTime<Utc>) {
        self.next_due_at = next_due_at;
        self.last_spawned_at = Some(spawned_at);
        self.updated_at = spawned_at;
    }

    /// Restores schedule columns owned by the spawn path.
    pub(crate) const fn keep_schedule(
        &mut self,
        next_due_at: DateTime<Utc>,
        last_spawned_at: Option<DateTime<Utc>>,
    ) {
        self.next_due_at = next_due_at;
        self.last_spawned_at = last_spawned_at;
    }

    /// Stops further spawns. Returns `false` when already inactive.
    pub fn deactivate(&mut self, clock: &impl Clock) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_active = false;
        self.updated_at = clock.utc();
        true
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> RecurrenceDefinitionId {
        self.id
    }

    /// Returns the task template.
    #[must_use]
    pub const fn template(&self) -> &WorkItemTemplate {
        &self.template
    }

    /// Returns the frequency.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Returns the monthly anchor day.
    #[must_use]
    pub const fn anchor_day(&self) -> u32 {
        self.anchor_day
    }

    /// Returns when the next occurrence is due.
    #[must_use]
    pub const fn next_due_at(&self) -> DateTime<Utc> {
        self.next_due_at
    }

    /// Returns whether the definition still spawns tasks.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the creating administrator.
    #[must_use]
    pub const fn created_by(&self) -> Option<ActorId> {
        self.created_by
    }

    /// Returns when the latest occurrence spawned.
    #[must_use]
    pub const fn last_spawned_at(&self) -> Option<DateTime<Utc>> {
        self.last_spawned_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
