//! `PostgreSQL` repository implementation for work item storage.

use super::{
    models::{HistoryRow, NewHistoryRow, NewWorkItemRow, WorkItemRow, WorkItemTransitionChangeset},
    schema::{work_item_history, work_items},
};
use crate::lifecycle::{
    domain::{
        ActorId, ContactEmail, HistoryEntry, HistoryEntryId, PersistedWorkItemData, Priority,
        RecurrenceOrigin, ResolutionNote, WorkItem, WorkItemId, WorkItemKind, WorkItemState,
        WorkItemTitle,
    },
    ports::{
        TransitionFn, TransitionOutcome, WorkItemRepository, WorkItemRepositoryError,
        WorkItemRepositoryResult,
    },
};
use crate::recurrence::domain::RecurrenceDefinitionId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::time::Duration;

/// `PostgreSQL` connection pool type shared by the engine's adapters.
pub type EnginePgPool = Pool<ConnectionManager<PgConnection>>;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Partial unique index guaranteeing one task per recurrence occurrence.
const OCCURRENCE_INDEX: &str = "idx_work_items_occurrence";

/// `PostgreSQL`-backed work item repository.
#[derive(Debug, Clone)]
pub struct PostgresWorkItemRepository {
    pool: EnginePgPool,
    lock_timeout: Duration,
}

impl PostgresWorkItemRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: EnginePgPool) -> Self {
        Self {
            pool,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Sets how long a transition waits for the row lock.
    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    async fn run_blocking<F, T>(&self, f: F) -> WorkItemRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> WorkItemRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(WorkItemRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(WorkItemRepositoryError::persistence)?
    }
}

impl From<DieselError> for WorkItemRepositoryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, ref info) => {
                Self::Conflict(info.message().to_owned())
            }
            _ => Self::persistence(err),
        }
    }
}

/// Builds the statement bounding lock waits for the current transaction.
pub(crate) fn lock_statement(lock_timeout: Duration) -> String {
    format!("SET LOCAL lock_timeout = '{}ms'", lock_timeout.as_millis())
}

/// Maps unique violations on insert to the matching duplicate error.
fn unique_violation(
    err: DieselError,
    item_id: WorkItemId,
    origin: Option<RecurrenceOrigin>,
) -> WorkItemRepositoryError {
    match (&err, origin) {
        (DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info), Some(origin))
            if info.constraint_name() == Some(OCCURRENCE_INDEX) =>
        {
            WorkItemRepositoryError::DuplicateOccurrence {
                definition_id: origin.definition_id,
                due_at: origin.due_at,
            }
        }
        (DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _), _) => {
            WorkItemRepositoryError::DuplicateWorkItem(item_id)
        }
        _ => WorkItemRepositoryError::from(err),
    }
}

fn is_lock_timeout(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(_, info) if info.message().contains("lock timeout")
    )
}

#[async_trait]
impl WorkItemRepository for PostgresWorkItemRepository {
    async fn insert(&self, item: &WorkItem) -> WorkItemRepositoryResult<()> {
        let item_id = item.id();
        let origin = item.recurrence().copied();
        let new_row = to_new_row(item);

        self.run_blocking(move |connection| {
            diesel::insert_into(work_items::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| unique_violation(err, item_id, origin))?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: WorkItemId) -> WorkItemRepositoryResult<Option<WorkItem>> {
        self.run_blocking(move |connection| {
            let row = work_items::table
                .filter(work_items::id.eq(id.into_inner()))
                .select(WorkItemRow::as_select())
                .first::<WorkItemRow>(connection)
                .optional()?;
            row.map(row_to_work_item).transpose()
        })
        .await
    }

    async fn transition(
        &self,
        id: WorkItemId,
        decide: TransitionFn,
    ) -> WorkItemRepositoryResult<TransitionOutcome> {
        let lock_timeout = self.lock_timeout;
        self.run_blocking(move |connection| {
            connection.transaction::<_, WorkItemRepositoryError, _>(|tx| {
                diesel::sql_query(lock_statement(lock_timeout)).execute(tx)?;

                let row = work_items::table
                    .filter(work_items::id.eq(id.into_inner()))
                    .select(WorkItemRow::as_select())
                    .for_update()
                    .first::<WorkItemRow>(tx)
                    .optional()
                    .map_err(|err| {
                        if is_lock_timeout(&err) {
                            WorkItemRepositoryError::LockTimeout(id)
                        } else {
                            WorkItemRepositoryError::from(err)
                        }
                    })?
                    .ok_or(WorkItemRepositoryError::NotFound(id))?;
                let current = row_to_work_item(row)?;

                let staged = match decide(&current) {
                    Ok(staged) => staged,
                    Err(rejection) => return Ok(TransitionOutcome::Rejected(rejection)),
                };

                diesel::update(work_items::table.filter(work_items::id.eq(id.into_inner())))
                    .set(&to_changeset(&staged.item))
                    .execute(tx)?;
                diesel::insert_into(work_item_history::table)
                    .values(&to_history_row(&staged.entry))
                    .execute(tx)?;

                Ok(TransitionOutcome::Committed(staged))
            })
        })
        .await
    }

    async fn list_history(&self, id: WorkItemId) -> WorkItemRepositoryResult<Vec<HistoryEntry>> {
        self.run_blocking(move |connection| {
            let rows = work_item_history::table
                .filter(work_item_history::work_item_id.eq(id.into_inner()))
                .order(work_item_history::seq.asc())
                .select(HistoryRow::as_select())
                .load::<HistoryRow>(connection)?;
            rows.into_iter().map(row_to_history_entry).collect()
        })
        .await
    }

    async fn find_by_recurrence(
        &self,
        definition_id: RecurrenceDefinitionId,
    ) -> WorkItemRepositoryResult<Vec<WorkItem>> {
        self.run_blocking(move |connection| {
            let rows = work_items::table
                .filter(work_items::recurrence_id.eq(definition_id.into_inner()))
                .order(work_items::occurrence_due_at.asc())
                .select(WorkItemRow::as_select())
                .load::<WorkItemRow>(connection)?;
            rows.into_iter().map(row_to_work_item).collect()
        })
        .await
    }
}

/// Maps a domain item to its insert row.
pub(crate) fn to_new_row(item: &WorkItem) -> NewWorkItemRow {
    NewWorkItemRow {
        id: item.id().into_inner(),
        kind: item.kind().as_str().to_owned(),
        state: item.state().as_str().to_owned(),
        title: item.title().as_str().to_owned(),
        description: item.description().map(str::to_owned),
        priority: item.priority().as_str().to_owned(),
        assignee_id: item.assignee().map(ActorId::into_inner),
        creator_id: item.creator().map(ActorId::into_inner),
        contact_email: item.contact_email().map(|email| email.as_str().to_owned()),
        resolution_note: item.resolution_note().map(|note| note.as_str().to_owned()),
        recurrence_id: item
            .recurrence()
            .map(|origin| origin.definition_id.into_inner()),
        occurrence_due_at: item.recurrence().map(|origin| origin.due_at),
        created_at: item.created_at(),
        updated_at: item.updated_at(),
    }
}

fn to_changeset(item: &WorkItem) -> WorkItemTransitionChangeset {
    WorkItemTransitionChangeset {
        state: item.state().as_str().to_owned(),
        assignee_id: item.assignee().map(ActorId::into_inner),
        resolution_note: item.resolution_note().map(|note| note.as_str().to_owned()),
        updated_at: item.updated_at(),
    }
}

fn to_history_row(entry: &HistoryEntry) -> NewHistoryRow {
    NewHistoryRow {
        id: entry.id().into_inner(),
        work_item_id: entry.work_item_id().into_inner(),
        kind: entry.to_state().kind().as_str().to_owned(),
        actor_id: entry.actor().map(ActorId::into_inner),
        from_state: entry.from_state().as_str().to_owned(),
        to_state: entry.to_state().as_str().to_owned(),
        note: entry.note().map(str::to_owned),
        created_at: entry.created_at(),
    }
}

/// Reconstructs a domain item from a stored row.
pub(crate) fn row_to_work_item(row: WorkItemRow) -> WorkItemRepositoryResult<WorkItem> {
    let kind =
        WorkItemKind::try_from(row.kind.as_str()).map_err(WorkItemRepositoryError::persistence)?;
    let state = WorkItemState::parse(kind, &row.state).map_err(WorkItemRepositoryError::persistence)?;
    let title = WorkItemTitle::new(row.title).map_err(WorkItemRepositoryError::persistence)?;
    let priority =
        Priority::try_from(row.priority.as_str()).map_err(WorkItemRepositoryError::persistence)?;
    let contact_email = row
        .contact_email
        .map(ContactEmail::new)
        .transpose()
        .map_err(WorkItemRepositoryError::persistence)?;
    let recurrence = match (row.recurrence_id, row.occurrence_due_at) {
        (Some(definition_id), Some(due_at)) => Some(RecurrenceOrigin {
            definition_id: RecurrenceDefinitionId::from_uuid(definition_id),
            due_at,
        }),
        _ => None,
    };

    Ok(WorkItem::from_persisted(PersistedWorkItemData {
        id: WorkItemId::from_uuid(row.id),
        state,
        title,
        description: row.description,
        priority,
        assignee: row.assignee_id.map(ActorId::from_uuid),
        creator: row.creator_id.map(ActorId::from_uuid),
        contact_email,
        resolution_note: row.resolution_note.as_deref().and_then(ResolutionNote::parse),
        recurrence,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn row_to_history_entry(row: HistoryRow) -> WorkItemRepositoryResult<HistoryEntry> {
    let kind =
        WorkItemKind::try_from(row.kind.as_str()).map_err(WorkItemRepositoryError::persistence)?;
    let from_state =
        WorkItemState::parse(kind, &row.from_state).map_err(WorkItemRepositoryError::persistence)?;
    let to_state =
        WorkItemState::parse(kind, &row.to_state).map_err(WorkItemRepositoryError::persistence)?;

    Ok(HistoryEntry::from_persisted(
        HistoryEntryId::from_uuid(row.id),
        WorkItemId::from_uuid(row.work_item_id),
        row.actor_id.map(ActorId::from_uuid),
        (from_state, to_state),
        row.note,
        row.created_at,
    ))
}
