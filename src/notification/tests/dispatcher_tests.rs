//! Dispatcher delivery and retry tests.

use std::sync::Arc;
use std::time::Duration;

use super::event;
use crate::lifecycle::domain::{ContactEmail, WorkItemKind};
use crate::notification::{
    adapters::memory::RecordingNotifier,
    domain::{NotificationEventType, NotificationRecipient},
    ports::{MockNotifier, NotifierError},
    services::{
        DeliveryOutcome, DispatchReport, DispatcherSettings, NotificationDispatcher,
        notification_channel,
    },
};
use crate::test_support::{ManualClock, utc};
use mockall::Sequence;
use rstest::{fixture, rstest};
use tokio_util::sync::CancellationToken;

#[fixture]
fn settings() -> DispatcherSettings {
    DispatcherSettings {
        workers: 2,
        retry_delay: Duration::from_millis(1),
    }
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at(utc(2026, 6, 1, 12, 1)))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn actor_recipient_gets_email_and_in_app(settings: DispatcherSettings) {
    let mut notifier = MockNotifier::new();
    notifier
        .expect_send_email()
        .withf(|email| email.subject == "[ticket] Printer jam was created")
        .times(1)
        .returning(|_| Ok(()));
    notifier
        .expect_record_in_app()
        .withf(|record| record.message == "[ticket] Printer jam was created")
        .times(1)
        .returning(|_| Ok(()));
    let dispatcher = NotificationDispatcher::new(Arc::new(notifier), clock(), settings);

    let report = dispatcher
        .dispatch(&event(
            NotificationEventType::Created,
            WorkItemKind::Ticket,
            "unassigned",
            None,
        ))
        .await;

    assert_eq!(
        report,
        DispatchReport {
            email: DeliveryOutcome::Delivered,
            in_app: DeliveryOutcome::Delivered,
        }
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn email_recipient_skips_in_app(settings: DispatcherSettings) {
    let mut notifier = MockNotifier::new();
    notifier.expect_send_email().times(1).returning(|_| Ok(()));
    notifier.expect_record_in_app().never();
    let dispatcher = NotificationDispatcher::new(Arc::new(notifier), clock(), settings);
    let mut anonymous = event(
        NotificationEventType::Created,
        WorkItemKind::Ticket,
        "unassigned",
        None,
    );
    anonymous.recipient = NotificationRecipient::Email(
        ContactEmail::new("customer@example.com").expect("valid address"),
    );

    let report = dispatcher.dispatch(&anonymous).await;

    assert_eq!(report.email, DeliveryOutcome::Delivered);
    assert_eq!(report.in_app, DeliveryOutcome::Skipped);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_delivery_is_retried_once(settings: DispatcherSettings) {
    let mut notifier = MockNotifier::new();
    let mut sequence = Sequence::new();
    notifier
        .expect_send_email()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Err(NotifierError::Unavailable("smtp timeout".to_owned())));
    notifier
        .expect_send_email()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(()));
    notifier.expect_record_in_app().times(1).returning(|_| Ok(()));
    let dispatcher = NotificationDispatcher::new(Arc::new(notifier), clock(), settings);

    let report = dispatcher
        .dispatch(&event(
            NotificationEventType::Assigned,
            WorkItemKind::Ticket,
            "assigned",
            Some("unassigned"),
        ))
        .await;

    assert_eq!(report.email, DeliveryOutcome::Delivered);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_failure_drops_the_channel(settings: DispatcherSettings) {
    let mut notifier = MockNotifier::new();
    notifier
        .expect_send_email()
        .times(1)
        .returning(|_| Ok(()));
    notifier
        .expect_record_in_app()
        .times(2)
        .returning(|_| Err(NotifierError::Unavailable("inbox offline".to_owned())));
    let dispatcher = NotificationDispatcher::new(Arc::new(notifier), clock(), settings);

    let report = dispatcher
        .dispatch(&event(
            NotificationEventType::StatusChanged,
            WorkItemKind::Task,
            "in_progress",
            Some("open"),
        ))
        .await;

    assert_eq!(
        report,
        DispatchReport {
            email: DeliveryOutcome::Delivered,
            in_app: DeliveryOutcome::Dropped,
        }
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn outbound_email_is_stamped_with_dispatch_time(settings: DispatcherSettings) {
    let notifier = Arc::new(RecordingNotifier::new());
    let dispatcher = NotificationDispatcher::new(Arc::clone(&notifier), clock(), settings);

    dispatcher
        .dispatch(&event(
            NotificationEventType::Closed,
            WorkItemKind::Task,
            "completed",
            Some("open"),
        ))
        .await;

    let emails = notifier.emails();
    let email = emails.first().expect("one email recorded");
    assert_eq!(email.queued_at, utc(2026, 6, 1, 12, 1));
    assert_eq!(notifier.in_app().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn run_drains_queue_until_cancelled(settings: DispatcherSettings) {
    let notifier = Arc::new(RecordingNotifier::new());
    let dispatcher = NotificationDispatcher::new(Arc::clone(&notifier), clock(), settings);
    let (queue, receiver) = notification_channel(8);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(dispatcher.run(receiver, cancel.clone()));

    for _ in 0..3 {
        queue
            .enqueue(event(
                NotificationEventType::Created,
                WorkItemKind::Ticket,
                "unassigned",
                None,
            ))
            .expect("queue has room");
    }
    for _ in 0..200 {
        if notifier.emails().len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cancel.cancel();
    handle.await.expect("dispatcher stops cleanly");

    assert_eq!(notifier.emails().len(), 3);
    assert_eq!(notifier.in_app().len(), 3);
}
