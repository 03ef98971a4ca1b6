//! End-to-end delivery from committed transitions to the notifier.

use std::sync::Arc;
use std::time::Duration;

use super::helpers::{Engine, utc};
use deskflow::lifecycle::{
    domain::{Actor, ActorId, WorkItemKind},
    services::{CreateWorkItemRequest, TransitionRequest},
};
use deskflow::notification::{
    adapters::memory::RecordingNotifier,
    domain::NotificationRecipient,
    services::{DispatcherSettings, NotificationDispatcher},
};
use rstest::{fixture, rstest};
use tokio_util::sync::CancellationToken;

#[fixture]
fn engine() -> Engine {
    Engine::new(utc(2026, 3, 9, 14, 0), Duration::from_secs(1))
}

async fn wait_for_emails(notifier: &RecordingNotifier, expected: usize) {
    for _ in 0..200 {
        if notifier.emails().len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ticket_walkthrough_reaches_customer_and_assignee(engine: Engine) {
    let notifier = Arc::new(RecordingNotifier::new());
    let dispatcher = NotificationDispatcher::new(
        Arc::clone(&notifier),
        Arc::clone(&engine.clock),
        DispatcherSettings {
            workers: 2,
            retry_delay: Duration::from_millis(1),
        },
    );
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(dispatcher.run(engine.receiver.clone(), cancel.clone()));
    let staff = Actor::staff(ActorId::new());
    let assignee = ActorId::new();

    let ticket = engine
        .lifecycle
        .create_work_item(
            CreateWorkItemRequest::new(WorkItemKind::Ticket, "Printer jam")
                .with_contact_email("customer@example.com"),
            &Actor::anonymous(),
        )
        .await
        .expect("ticket created");
    for request in [
        TransitionRequest::new("assigned").with_assignee(assignee),
        TransitionRequest::new("in_progress"),
        TransitionRequest::new("closed").with_resolution_note("fixed"),
    ] {
        engine
            .lifecycle
            .request_transition(ticket.id(), request, &staff)
            .await
            .expect("transition succeeds");
    }
    wait_for_emails(&notifier, 4).await;
    cancel.cancel();
    handle.await.expect("dispatcher stops cleanly");

    let emails = notifier.emails();
    assert_eq!(emails.len(), 4);
    let customer_emails = emails
        .iter()
        .filter(|email| matches!(email.recipient, NotificationRecipient::Email(_)))
        .count();
    assert_eq!(customer_emails, 3);
    assert!(
        emails
            .iter()
            .any(|email| email.body.contains("Resolution: fixed"))
    );
    let in_app = notifier.in_app();
    assert_eq!(in_app.len(), 1);
    assert_eq!(in_app.first().map(|record| record.recipient), Some(assignee));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notifier_outage_never_fails_the_transition(engine: Engine) {
    let notifier = Arc::new(RecordingNotifier::new());
    notifier.fail_next_emails(10);
    notifier.fail_next_in_app(10);
    let dispatcher = NotificationDispatcher::new(
        Arc::clone(&notifier),
        Arc::clone(&engine.clock),
        DispatcherSettings {
            workers: 1,
            retry_delay: Duration::from_millis(1),
        },
    );
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(dispatcher.run(engine.receiver.clone(), cancel.clone()));
    let ticket = engine.open_ticket("Keyboard sticky").await;

    let assigned = engine
        .lifecycle
        .request_transition(
            ticket.id(),
            TransitionRequest::new("assigned").with_assignee(ActorId::new()),
            &Actor::staff(ActorId::new()),
        )
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    handle.await.expect("dispatcher stops cleanly");

    assert!(assigned.is_ok());
    assert!(notifier.emails().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn full_queue_drops_events_without_failing(engine: Engine) {
    for index in 0..300 {
        engine
            .lifecycle
            .create_work_item(
                CreateWorkItemRequest::new(WorkItemKind::Ticket, format!("Ticket {index}"))
                    .with_contact_email("customer@example.com"),
                &Actor::anonymous(),
            )
            .await
            .expect("creation succeeds even when the queue is full");
    }

    assert_eq!(engine.drain().await, 256);
}
