//! `PostgreSQL` repository implementation for recurrence storage.

use super::{
    models::{RecurrenceDefinitionRow, RecurrenceSettingsChangeset, ScheduleAdvanceChangeset},
    schema::recurrence_definitions,
};
use crate::lifecycle::{
    adapters::postgres::{EnginePgPool, lock_statement, schema::work_items, to_new_row},
    domain::{ActorId, Priority, WorkItemTemplate, WorkItemTitle},
};
use crate::recurrence::{
    domain::{Frequency, PersistedRecurrenceData, RecurrenceDefinition, RecurrenceDefinitionId},
    ports::{
        RecurrenceRepository, RecurrenceRepositoryError, RecurrenceRepositoryResult, SpawnOutcome,
        SpawnRequest,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::time::Duration;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// `PostgreSQL`-backed recurrence repository.
#[derive(Debug, Clone)]
pub struct PostgresRecurrenceRepository {
    pool: EnginePgPool,
    lock_timeout: Duration,
}

impl PostgresRecurrenceRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: EnginePgPool) -> Self {
        Self {
            pool,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Sets how long a spawn waits for the definition row lock.
    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    async fn run_blocking<F, T>(&self, f: F) -> RecurrenceRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> RecurrenceRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(RecurrenceRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(RecurrenceRepositoryError::persistence)?
    }
}

impl From<DieselError> for RecurrenceRepositoryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, ref info) => {
                Self::Conflict(info.message().to_owned())
            }
            _ => Self::persistence(err),
        }
    }
}

#[async_trait]
impl RecurrenceRepository for PostgresRecurrenceRepository {
    async fn insert_definition(
        &self,
        definition: &RecurrenceDefinition,
    ) -> RecurrenceRepositoryResult<()> {
        let definition_id = definition.id();
        let row = to_row(definition)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(recurrence_definitions::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        RecurrenceRepositoryError::DuplicateDefinition(definition_id)
                    }
                    other => RecurrenceRepositoryError::from(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_definition(
        &self,
        id: RecurrenceDefinitionId,
    ) -> RecurrenceRepositoryResult<Option<RecurrenceDefinition>> {
        self.run_blocking(move |connection| {
            let row = recurrence_definitions::table
                .filter(recurrence_definitions::id.eq(id.into_inner()))
                .select(RecurrenceDefinitionRow::as_select())
                .first::<RecurrenceDefinitionRow>(connection)
                .optional()?;
            row.map(row_to_definition).transpose()
        })
        .await
    }

    async fn update_definition(
        &self,
        definition: &RecurrenceDefinition,
    ) -> RecurrenceRepositoryResult<()> {
        let id = definition.id();
        let template = definition.template();
        let changeset = RecurrenceSettingsChangeset {
            title: template.title().as_str().to_owned(),
            description: template.description().map(str::to_owned),
            priority: template.priority().as_str().to_owned(),
            assignee_id: template.assignee().map(ActorId::into_inner),
            is_active: definition.is_active(),
            updated_at: definition.updated_at(),
        };

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                recurrence_definitions::table
                    .filter(recurrence_definitions::id.eq(id.into_inner())),
            )
            .set(&changeset)
            .execute(connection)?;
            if updated == 0 {
                return Err(RecurrenceRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> RecurrenceRepositoryResult<Vec<RecurrenceDefinition>> {
        let max_rows = i64::try_from(limit).map_err(RecurrenceRepositoryError::persistence)?;
        self.run_blocking(move |connection| {
            let rows = recurrence_definitions::table
                .filter(recurrence_definitions::is_active.eq(true))
                .filter(recurrence_definitions::next_due_at.le(now))
                .order(recurrence_definitions::next_due_at.asc())
                .limit(max_rows)
                .select(RecurrenceDefinitionRow::as_select())
                .load::<RecurrenceDefinitionRow>(connection)?;
            rows.into_iter().map(row_to_definition).collect()
        })
        .await
    }

    async fn spawn_occurrence(
        &self,
        request: SpawnRequest,
    ) -> RecurrenceRepositoryResult<SpawnOutcome> {
        let lock_timeout = self.lock_timeout;
        let definition_id = request.definition_id;
        let new_item = to_new_row(&request.item);
        let advance = ScheduleAdvanceChangeset {
            next_due_at: request.next_due_at,
            last_spawned_at: request.spawned_at,
            updated_at: request.spawned_at,
        };

        self.run_blocking(move |connection| {
            connection.transaction::<_, RecurrenceRepositoryError, _>(|tx| {
                diesel::sql_query(lock_statement(lock_timeout)).execute(tx)?;

                let (is_active, stored_due_at) = recurrence_definitions::table
                    .filter(recurrence_definitions::id.eq(definition_id.into_inner()))
                    .select((
                        recurrence_definitions::is_active,
                        recurrence_definitions::next_due_at,
                    ))
                    .for_update()
                    .first::<(bool, DateTime<Utc>)>(tx)
                    .optional()
                    .map_err(|err| lock_error(err, definition_id))?
                    .ok_or(RecurrenceRepositoryError::NotFound(definition_id))?;

                if !is_active || stored_due_at != request.expected_due_at {
                    return Ok(SpawnOutcome::Superseded);
                }

                diesel::insert_into(work_items::table)
                    .values(&new_item)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            RecurrenceRepositoryError::DuplicateOccurrence {
                                definition_id,
                                due_at: request.expected_due_at,
                            }
                        }
                        other => RecurrenceRepositoryError::from(other),
                    })?;
                diesel::update(
                    recurrence_definitions::table
                        .filter(recurrence_definitions::id.eq(definition_id.into_inner())),
                )
                .set(&advance)
                .execute(tx)?;

                Ok(SpawnOutcome::Spawned)
            })
        })
        .await
    }
}

fn lock_error(err: DieselError, id: RecurrenceDefinitionId) -> RecurrenceRepositoryError {
    match err {
        DieselError::DatabaseError(_, ref info) if info.message().contains("lock timeout") => {
            RecurrenceRepositoryError::LockTimeout(id)
        }
        other => RecurrenceRepositoryError::from(other),
    }
}

fn to_row(definition: &RecurrenceDefinition) -> RecurrenceRepositoryResult<RecurrenceDefinitionRow> {
    let template = definition.template();
    let anchor_day =
        i32::try_from(definition.anchor_day()).map_err(RecurrenceRepositoryError::persistence)?;
    Ok(RecurrenceDefinitionRow {
        id: definition.id().into_inner(),
        title: template.title().as_str().to_owned(),
        description: template.description().map(str::to_owned),
        priority: template.priority().as_str().to_owned(),
        assignee_id: template.assignee().map(ActorId::into_inner),
        frequency: definition.frequency().as_str().to_owned(),
        anchor_day,
        next_due_at: definition.next_due_at(),
        is_active: definition.is_active(),
        created_by: definition.created_by().map(ActorId::into_inner),
        last_spawned_at: definition.last_spawned_at(),
        created_at: definition.created_at(),
        updated_at: definition.updated_at(),
    })
}

fn row_to_definition(row: RecurrenceDefinitionRow) -> RecurrenceRepositoryResult<RecurrenceDefinition> {
    let title = WorkItemTitle::new(row.title).map_err(RecurrenceRepositoryError::persistence)?;
    let priority =
        Priority::try_from(row.priority.as_str()).map_err(RecurrenceRepositoryError::persistence)?;
    let mut template = WorkItemTemplate::new(title).with_priority(priority);
    if let Some(description) = row.description {
        template = template.with_description(description);
    }
    if let Some(assignee) = row.assignee_id {
        template = template.with_assignee(ActorId::from_uuid(assignee));
    }
    let frequency = Frequency::try_from(row.frequency.as_str())
        .map_err(RecurrenceRepositoryError::persistence)?;
    let anchor_day =
        u32::try_from(row.anchor_day).map_err(RecurrenceRepositoryError::persistence)?;

    RecurrenceDefinition::from_persisted(PersistedRecurrenceData {
        id: RecurrenceDefinitionId::from_uuid(row.id),
        template,
        frequency,
        anchor_day,
        next_due_at: row.next_due_at,
        is_active: row.is_active,
        created_by: row.created_by.map(ActorId::from_uuid),
        last_spawned_at: row.last_spawned_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
    .map_err(RecurrenceRepositoryError::persistence)
}
