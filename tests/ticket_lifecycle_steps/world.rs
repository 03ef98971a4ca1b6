//! Shared world state for ticket lifecycle BDD scenarios.

use std::sync::Arc;

use deskflow::lifecycle::{
    adapters::memory::InMemoryWorkItemRepository,
    domain::{Actor, ActorId, WorkItem},
    services::{LifecycleError, LifecycleService},
};
use deskflow::notification::services::{NotificationReceiver, notification_channel};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestLifecycleService = LifecycleService<InMemoryWorkItemRepository, DefaultClock>;

/// Scenario world for ticket lifecycle behaviour tests.
pub struct TicketLifecycleWorld {
    pub service: TestLifecycleService,
    pub staff: Actor,
    pub ticket: Option<WorkItem>,
    pub last_result: Option<Result<WorkItem, LifecycleError>>,
    pub receiver: NotificationReceiver,
}

impl TicketLifecycleWorld {
    /// Creates a world with an empty repository and one staff member.
    #[must_use]
    pub fn new() -> Self {
        let (queue, receiver) = notification_channel(64);
        let service = LifecycleService::new(
            Arc::new(InMemoryWorkItemRepository::new()),
            Arc::new(DefaultClock),
            queue,
        );

        Self {
            service,
            staff: Actor::staff(ActorId::new()),
            ticket: None,
            last_result: None,
            receiver,
        }
    }

    /// Returns the ticket under test.
    pub fn ticket(&self) -> Result<&WorkItem, eyre::Report> {
        self.ticket
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing ticket in scenario world"))
    }

    /// Stores a transition result, keeping the ticket current on success.
    pub fn record(&mut self, result: Result<WorkItem, LifecycleError>) {
        if let Ok(ref updated) = result {
            self.ticket = Some(updated.clone());
        }
        self.last_result = Some(result);
    }
}

impl Default for TicketLifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TicketLifecycleWorld {
    TicketLifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
