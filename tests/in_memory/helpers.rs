//! Shared test helpers for in-memory integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Utc};
use deskflow::lifecycle::{
    adapters::memory::InMemoryWorkItemRepository,
    domain::{Actor, ActorId, WorkItem, WorkItemKind},
    services::{CreateWorkItemRequest, LifecycleService},
};
use deskflow::notification::services::{NotificationReceiver, notification_channel};
use deskflow::recurrence::{
    adapters::memory::InMemoryRecurrenceRepository,
    services::{RecurrenceScheduler, RecurrenceService, SchedulerSettings},
};
use mockable::Clock;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock lock") = now;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Builds a UTC instant.
#[must_use]
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

/// Lifecycle service over the in-memory repository.
pub type MemoryLifecycle = LifecycleService<InMemoryWorkItemRepository, ManualClock>;

/// Recurrence administration over the in-memory repositories.
pub type MemoryRecurrence =
    RecurrenceService<InMemoryRecurrenceRepository, InMemoryWorkItemRepository, ManualClock>;

/// Scheduler over the in-memory repositories.
pub type MemoryScheduler =
    RecurrenceScheduler<InMemoryRecurrenceRepository, InMemoryWorkItemRepository, ManualClock>;

/// Fully wired engine sharing one in-memory store.
pub struct Engine {
    pub clock: Arc<ManualClock>,
    pub work_items: Arc<InMemoryWorkItemRepository>,
    pub recurrences: Arc<InMemoryRecurrenceRepository>,
    pub lifecycle: MemoryLifecycle,
    pub admin: MemoryRecurrence,
    pub receiver: NotificationReceiver,
}

impl Engine {
    /// Wires an engine whose row locks time out after `lock_timeout`.
    #[must_use]
    pub fn new(now: DateTime<Utc>, lock_timeout: Duration) -> Self {
        let clock = Arc::new(ManualClock::at(now));
        let store = InMemoryWorkItemRepository::new().with_lock_timeout(lock_timeout);
        let recurrences = Arc::new(InMemoryRecurrenceRepository::new(store.clone()));
        let work_items = Arc::new(store);
        let (queue, receiver) = notification_channel(256);
        let lifecycle = LifecycleService::new(Arc::clone(&work_items), Arc::clone(&clock), queue)
            .with_retry_backoff(Duration::from_millis(1));
        let admin = RecurrenceService::new(
            Arc::clone(&recurrences),
            Arc::clone(&work_items),
            Arc::clone(&clock),
        );
        Self {
            clock,
            work_items,
            recurrences,
            lifecycle,
            admin,
            receiver,
        }
    }

    /// Builds a scheduler sharing this engine's store.
    #[must_use]
    pub fn scheduler(&self) -> MemoryScheduler {
        RecurrenceScheduler::new(
            Arc::clone(&self.recurrences),
            self.lifecycle.clone(),
            Arc::clone(&self.clock),
            SchedulerSettings {
                tick_interval: Duration::from_millis(10),
                batch_size: 50,
            },
        )
    }

    /// Opens a ticket as an authenticated requester.
    pub async fn open_ticket(&self, title: &str) -> WorkItem {
        self.lifecycle
            .create_work_item(
                CreateWorkItemRequest::new(WorkItemKind::Ticket, title),
                &Actor::requester(ActorId::new()),
            )
            .await
            .expect("ticket creation should succeed")
    }

    /// Drains every queued notification.
    pub async fn drain(&self) -> usize {
        let mut count = 0;
        while self.receiver.try_recv().await.is_some() {
            count += 1;
        }
        count
    }
}
