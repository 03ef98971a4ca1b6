//! Periodic spawning of tasks from due recurrence definitions.

use crate::lifecycle::{
    domain::{Actor, RecurrenceOrigin, WorkItemDraft, WorkItemKind},
    ports::WorkItemRepository,
    services::{LifecycleError, LifecycleService},
};
use crate::recurrence::{
    domain::{RecurrenceDefinition, RecurrenceDomainError},
    ports::{RecurrenceRepository, RecurrenceRepositoryError, SpawnOutcome, SpawnRequest},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default pause between scheduler ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Default number of due definitions handled per tick.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Tuning for the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Pause between ticks.
    pub tick_interval: Duration,
    /// Maximum definitions spawned per tick.
    pub batch_size: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Counts from a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Occurrences that produced a task.
    pub spawned: usize,
    /// Definitions another tick or an administrator changed first.
    pub superseded: usize,
    /// Definitions that failed and stay due for the next tick.
    pub failed: usize,
}

/// Failure spawning one occurrence.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The creation policy rejected the staged task.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    /// The schedule could not be advanced.
    #[error(transparent)]
    Schedule(#[from] RecurrenceDomainError),
    /// The spawn transaction failed.
    #[error(transparent)]
    Storage(#[from] RecurrenceRepositoryError),
}

/// Spawns one task per due occurrence.
///
/// Each occurrence is inserted and its definition advanced in one
/// repository transaction, so concurrent schedulers and restarts never
/// produce a second task for the same occurrence. A definition that is
/// several periods behind catches up one occurrence per tick.
pub struct RecurrenceScheduler<R, W, C>
where
    R: RecurrenceRepository,
    W: WorkItemRepository,
    C: Clock + Send + Sync,
{
    recurrences: Arc<R>,
    lifecycle: LifecycleService<W, C>,
    clock: Arc<C>,
    settings: SchedulerSettings,
}

impl<R, W, C> RecurrenceScheduler<R, W, C>
where
    R: RecurrenceRepository,
    W: WorkItemRepository,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a scheduler that stages tasks through `lifecycle`.
    #[must_use]
    pub const fn new(
        recurrences: Arc<R>,
        lifecycle: LifecycleService<W, C>,
        clock: Arc<C>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            recurrences,
            lifecycle,
            clock,
            settings,
        }
    }

    /// Spawns the current occurrence of every due definition.
    ///
    /// Failures of single definitions are logged and counted; the
    /// definition stays due and is retried on the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceRepositoryError`] when the due definitions cannot
    /// be listed.
    pub async fn tick(&self) -> Result<TickReport, RecurrenceRepositoryError> {
        let now = self.clock.utc();
        let due = self
            .recurrences
            .find_due(now, self.settings.batch_size)
            .await?;

        let mut report = TickReport::default();
        for definition in &due {
            match self.spawn(definition, now).await {
                Ok(SpawnOutcome::Spawned) => report.spawned += 1,
                Ok(SpawnOutcome::Superseded) => {
                    debug!(recurrence_id = %definition.id(), "occurrence superseded");
                    report.superseded += 1;
                }
                Err(err) => {
                    warn!(
                        recurrence_id = %definition.id(),
                        due_at = %definition.next_due_at(),
                        error = %err,
                        "failed to spawn occurrence"
                    );
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    async fn spawn(
        &self,
        definition: &RecurrenceDefinition,
        now: DateTime<Utc>,
    ) -> Result<SpawnOutcome, SchedulerError> {
        let actor = Actor::system();
        let draft = WorkItemDraft {
            template: definition.template().clone(),
            creator: None,
            contact_email: None,
            recurrence: Some(RecurrenceOrigin {
                definition_id: definition.id(),
                due_at: definition.next_due_at(),
            }),
        };
        let staged = self
            .lifecycle
            .stage_creation(WorkItemKind::Task, draft, &actor)?;
        let next_due_at = definition.following_due_at()?;

        let outcome = self
            .recurrences
            .spawn_occurrence(SpawnRequest {
                definition_id: definition.id(),
                expected_due_at: definition.next_due_at(),
                item: staged.item.clone(),
                next_due_at,
                spawned_at: now,
            })
            .await?;

        if outcome == SpawnOutcome::Spawned {
            info!(
                recurrence_id = %definition.id(),
                work_item_id = %staged.item.id(),
                due_at = %definition.next_due_at(),
                %next_due_at,
                "recurring task spawned"
            );
            self.lifecycle.publish_creation(&staged, &actor);
        }
        Ok(outcome)
    }

    /// Ticks until `cancel` fires. Missed ticks are skipped rather than
    /// replayed in a burst.
    pub async fn run(self, cancel: CancellationToken) {
        let period = self.settings.tick_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            tick_interval_ms = period.as_millis(),
            batch_size = self.settings.batch_size,
            "recurrence scheduler started"
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => match self.tick().await {
                    Ok(report) if report != TickReport::default() => {
                        info!(
                            spawned = report.spawned,
                            superseded = report.superseded,
                            failed = report.failed,
                            "scheduler tick complete"
                        );
                    }
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "scheduler tick failed"),
                },
            }
        }
        info!("recurrence scheduler stopped");
    }
}
