//! Concurrency tests for per-item locking.

use std::time::Duration;

use super::helpers::{Engine, ManualClock, utc};
use deskflow::lifecycle::{
    domain::{
        Actor, ActorId, ProposedTransition, TicketState, WorkItem, WorkItemState, decide,
    },
    ports::{
        StagedTransition, TransitionFn, TransitionOutcome, WorkItemRepository,
        WorkItemRepositoryError,
    },
    services::{LifecycleErrorKind, TransitionRequest},
};
use rstest::{fixture, rstest};

#[fixture]
fn engine() -> Engine {
    Engine::new(utc(2026, 4, 1, 10, 0), Duration::from_millis(50))
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_assignments_serialize(engine: Engine) {
    let ticket = engine.open_ticket("Shared drive offline").await;
    let first_assignee = ActorId::new();
    let second_assignee = ActorId::new();

    let first = engine.lifecycle.clone();
    let second = engine.lifecycle.clone();
    let id = ticket.id();
    let (left, right) = tokio::join!(
        tokio::spawn(async move {
            first
                .request_transition(
                    id,
                    TransitionRequest::new("assigned").with_assignee(first_assignee),
                    &Actor::staff(ActorId::new()),
                )
                .await
        }),
        tokio::spawn(async move {
            second
                .request_transition(
                    id,
                    TransitionRequest::new("assigned").with_assignee(second_assignee),
                    &Actor::staff(ActorId::new()),
                )
                .await
        }),
    );
    let results = [
        left.expect("task completes"),
        right.expect("task completes"),
    ];

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let losers: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(losers.len(), 1);
    assert!(losers.iter().all(|err| err.kind() == LifecycleErrorKind::InvalidEdge));

    let stored = engine
        .lifecycle
        .find_work_item(id)
        .await
        .expect("ticket exists");
    let winner = winners.first().expect("one winner");
    assert_eq!(stored.assignee(), winner.assignee());
    let history = engine
        .lifecycle
        .list_history(id)
        .await
        .expect("history lookup succeeds");
    assert_eq!(history.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_closes_commit_once(engine: Engine) {
    let ticket = engine.open_ticket("Badge reader").await;
    let staff = Actor::staff(ActorId::new());
    engine
        .lifecycle
        .request_transition(
            ticket.id(),
            TransitionRequest::new("assigned").with_assignee(ActorId::new()),
            &staff,
        )
        .await
        .expect("assignment succeeds");

    let mut handles = Vec::new();
    for attempt in 0..8 {
        let service = engine.lifecycle.clone();
        let id = ticket.id();
        handles.push(tokio::spawn(async move {
            service
                .request_transition(
                    id,
                    TransitionRequest::new("closed")
                        .with_resolution_note(format!("closed by attempt {attempt}")),
                    &Actor::staff(ActorId::new()),
                )
                .await
        }));
    }
    let mut committed = 0;
    for handle in handles {
        if handle.await.expect("task completes").is_ok() {
            committed += 1;
        }
    }

    assert_eq!(committed, 1);
    let history = engine
        .lifecycle
        .list_history(ticket.id())
        .await
        .expect("history lookup succeeds");
    assert_eq!(history.len(), 2);
    let last = history.last().expect("close entry");
    assert_eq!(last.to_state(), WorkItemState::Ticket(TicketState::Closed));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn transitions_on_different_items_do_not_wait(engine: Engine) {
    let busy = engine.open_ticket("Busy").await;
    let idle = engine.open_ticket("Idle").await;
    let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
    let repository = std::sync::Arc::clone(&engine.work_items);
    let holder = tokio::spawn(async move {
        repository
            .transition(busy.id(), slow_assignment(locked_tx, Duration::from_millis(300)))
            .await
    });
    locked_rx.await.expect("holder acquired the lock");

    let result = engine
        .lifecycle
        .request_transition(
            idle.id(),
            TransitionRequest::new("assigned").with_assignee(ActorId::new()),
            &Actor::staff(ActorId::new()),
        )
        .await;

    assert!(result.is_ok());
    holder.await.expect("holder completes").expect("holder commits");
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lock_wait_times_out_without_partial_writes(engine: Engine) {
    let ticket = engine.open_ticket("Projector flicker").await;
    let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
    let repository = std::sync::Arc::clone(&engine.work_items);
    let id = ticket.id();
    let holder = tokio::spawn(async move {
        repository
            .transition(id, slow_assignment(locked_tx, Duration::from_millis(300)))
            .await
    });
    locked_rx.await.expect("holder acquired the lock");

    let clock = ManualClock::at(utc(2026, 4, 1, 10, 5));
    let waiter = engine
        .work_items
        .transition(id, assignment(ActorId::new(), clock))
        .await;

    assert!(matches!(
        waiter,
        Err(WorkItemRepositoryError::LockTimeout(timed_out)) if timed_out == id
    ));
    let outcome = holder.await.expect("holder completes").expect("holder commits");
    assert!(matches!(outcome, TransitionOutcome::Committed(_)));
    let history = engine
        .work_items
        .list_history(id)
        .await
        .expect("history lookup succeeds");
    assert_eq!(history.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn service_transition_fails_closed_on_lock_timeout(engine: Engine) {
    let ticket = engine.open_ticket("Badge reader offline").await;
    let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
    let repository = std::sync::Arc::clone(&engine.work_items);
    let id = ticket.id();
    let holder = tokio::spawn(async move {
        repository
            .transition(id, slow_assignment(locked_tx, Duration::from_millis(300)))
            .await
    });
    locked_rx.await.expect("holder acquired the lock");

    let started = std::time::Instant::now();
    let err = engine
        .lifecycle
        .request_transition(
            id,
            TransitionRequest::new("assigned").with_assignee(ActorId::new()),
            &Actor::staff(ActorId::new()),
        )
        .await
        .expect_err("waiter times out behind the holder");
    let waited = started.elapsed();

    assert_eq!(err.kind(), LifecycleErrorKind::StorageError);
    assert!(
        waited < Duration::from_millis(250),
        "waited {waited:?} for the row lock"
    );
    let during = engine
        .work_items
        .list_history(id)
        .await
        .expect("history lookup succeeds");
    assert!(during.is_empty());

    holder
        .await
        .expect("holder completes")
        .expect("holder commits");
    let after = engine
        .work_items
        .list_history(id)
        .await
        .expect("history lookup succeeds");
    assert_eq!(after.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_do_not_wait_for_an_in_flight_transition(engine: Engine) {
    let ticket = engine.open_ticket("Printer jam").await;
    let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
    let repository = std::sync::Arc::clone(&engine.work_items);
    let id = ticket.id();
    let holder = tokio::spawn(async move {
        repository
            .transition(id, slow_assignment(locked_tx, Duration::from_millis(300)))
            .await
    });
    locked_rx.await.expect("holder acquired the lock");

    let snapshot = tokio::time::timeout(
        Duration::from_millis(100),
        engine.lifecycle.find_work_item(id),
    )
    .await
    .expect("read does not wait for the row lock")
    .expect("item exists");
    assert_eq!(snapshot.state(), WorkItemState::Ticket(TicketState::Open));

    holder
        .await
        .expect("holder completes")
        .expect("holder commits");
}

fn assignment(assignee: ActorId, clock: ManualClock) -> TransitionFn {
    let actor = Actor::staff(ActorId::new());
    Box::new(move |current: &WorkItem| {
        let decision = decide(
            current.state(),
            &ProposedTransition::assign(assignee),
            actor.role(),
        )?;
        let mut item = current.clone();
        let entry = item.apply(&decision, &actor, &clock);
        Ok(StagedTransition {
            item,
            entry,
            effects: decision.effects,
        })
    })
}

fn slow_assignment(
    locked: tokio::sync::oneshot::Sender<()>,
    hold_for: Duration,
) -> TransitionFn {
    let inner = assignment(ActorId::new(), ManualClock::at(utc(2026, 4, 1, 10, 1)));
    Box::new(move |current: &WorkItem| {
        locked.send(()).unwrap_or_default();
        std::thread::sleep(hold_for);
        inner(current)
    })
}
