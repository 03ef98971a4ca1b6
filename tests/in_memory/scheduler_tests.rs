//! Exactly-once spawning under overlapping ticks and failed transactions.

use std::time::Duration;

use super::helpers::{Engine, utc};
use deskflow::lifecycle::{
    adapters::memory::{InjectedFault, StoreOperation},
    domain::{Actor, ActorId},
};
use deskflow::recurrence::{
    domain::{Frequency, RecurrenceDefinition},
    ports::RecurrenceRepository,
    services::CreateRecurrenceRequest,
};
use rstest::{fixture, rstest};

#[fixture]
fn engine() -> Engine {
    Engine::new(utc(2026, 2, 2, 6, 0), Duration::from_secs(1))
}

async fn daily(engine: &Engine, title: &str) -> RecurrenceDefinition {
    engine
        .admin
        .create_definition(
            CreateRecurrenceRequest::new(title, Frequency::Daily, utc(2026, 2, 2, 6, 0)),
            &Actor::admin(ActorId::new()),
        )
        .await
        .expect("definition created")
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_ticks_spawn_each_occurrence_once(engine: Engine) {
    let mut definitions = Vec::new();
    for index in 0..5 {
        definitions.push(daily(&engine, &format!("Job {index}")).await);
    }
    let first = engine.scheduler();
    let second = engine.scheduler();

    let (left, right) = tokio::join!(first.tick(), second.tick());
    let left_report = left.expect("tick succeeds");
    let right_report = right.expect("tick succeeds");

    assert_eq!(left_report.spawned + right_report.spawned, 5);
    assert_eq!(left_report.failed + right_report.failed, 0);
    for definition in &definitions {
        let tasks = engine
            .admin
            .list_spawned_tasks(definition.id())
            .await
            .expect("definition exists");
        assert_eq!(tasks.len(), 1, "definition {} spawned twice", definition.id());
        let stored = engine
            .admin
            .find_definition(definition.id())
            .await
            .expect("definition exists");
        assert_eq!(stored.next_due_at(), utc(2026, 2, 3, 6, 0));
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn aborted_spawn_is_retried_without_duplicate(engine: Engine) {
    let definition = daily(&engine, "Rotate logs").await;
    engine
        .work_items
        .inject_fault(StoreOperation::SpawnOccurrence, InjectedFault::Conflict);
    let scheduler = engine.scheduler();

    let aborted = scheduler.tick().await.expect("tick succeeds");
    let untouched = engine
        .recurrences
        .find_definition(definition.id())
        .await
        .expect("lookup succeeds")
        .expect("definition exists");
    let retried = scheduler.tick().await.expect("tick succeeds");
    let settled = scheduler.tick().await.expect("tick succeeds");

    assert_eq!(aborted.failed, 1);
    assert_eq!(untouched.next_due_at(), utc(2026, 2, 2, 6, 0));
    assert_eq!(untouched.last_spawned_at(), None);
    assert_eq!(retried.spawned, 1);
    assert_eq!(settled.spawned, 0);
    let tasks = engine
        .admin
        .list_spawned_tasks(definition.id())
        .await
        .expect("definition exists");
    assert_eq!(tasks.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn one_failing_definition_does_not_block_others(engine: Engine) {
    daily(&engine, "First").await;
    daily(&engine, "Second").await;
    daily(&engine, "Third").await;
    engine
        .work_items
        .inject_fault(StoreOperation::SpawnOccurrence, InjectedFault::Unavailable);

    let report = engine.scheduler().tick().await.expect("tick succeeds");

    assert_eq!(report.failed, 1);
    assert_eq!(report.spawned, 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn next_day_tick_spawns_next_occurrence(engine: Engine) {
    let definition = daily(&engine, "Rotate logs").await;
    let scheduler = engine.scheduler();
    scheduler.tick().await.expect("tick succeeds");

    engine.clock.set(utc(2026, 2, 3, 5, 59));
    let early = scheduler.tick().await.expect("tick succeeds");
    engine.clock.set(utc(2026, 2, 3, 6, 0));
    let on_time = scheduler.tick().await.expect("tick succeeds");

    assert_eq!(early.spawned, 0);
    assert_eq!(on_time.spawned, 1);
    let tasks = engine
        .admin
        .list_spawned_tasks(definition.id())
        .await
        .expect("definition exists");
    assert_eq!(tasks.len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn run_loop_spawns_and_stops_on_cancel(engine: Engine) {
    let definition = daily(&engine, "Rotate logs").await;
    let cancel = tokio_util::sync::CancellationToken::new();
    let handle = tokio::spawn(engine.scheduler().run(cancel.clone()));

    for _ in 0..200 {
        let spawned = engine
            .admin
            .list_spawned_tasks(definition.id())
            .await
            .expect("definition exists");
        if !spawned.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cancel.cancel();
    handle.await.expect("scheduler stops cleanly");

    let tasks = engine
        .admin
        .list_spawned_tasks(definition.id())
        .await
        .expect("definition exists");
    assert_eq!(tasks.len(), 1);
}
