//! Asynchronous delivery of notification events.
//!
//! Workers drain the shared queue and hand each event to the [`Notifier`]
//! as one email and, for actor recipients, one in-app record. Every call is
//! tried at most twice. Failures are logged and dropped: the lifecycle
//! transaction that produced the event has already committed.

use crate::notification::{
    domain::{
        InAppNotification, InAppNotificationId, MessageRenderer, NotificationEvent, OutboundEmail,
    },
    ports::{Notifier, NotifierResult},
    services::NotificationReceiver,
};
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What happened to one delivery channel of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The notifier accepted the call.
    Delivered,
    /// Both attempts failed, or rendering failed.
    Dropped,
    /// The channel does not apply to the recipient.
    Skipped,
}

/// Per-event delivery summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Email outcome.
    pub email: DeliveryOutcome,
    /// In-app record outcome.
    pub in_app: DeliveryOutcome,
}

/// Tunables for the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherSettings {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Pause before the single retry.
    pub retry_delay: Duration,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Delivers queued notification events.
pub struct NotificationDispatcher<N, C>
where
    N: Notifier,
    C: Clock + Send + Sync,
{
    notifier: Arc<N>,
    clock: Arc<C>,
    renderer: MessageRenderer,
    settings: DispatcherSettings,
}

impl<N, C> Clone for NotificationDispatcher<N, C>
where
    N: Notifier,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            notifier: Arc::clone(&self.notifier),
            clock: Arc::clone(&self.clock),
            renderer: self.renderer.clone(),
            settings: self.settings,
        }
    }
}

impl<N, C> NotificationDispatcher<N, C>
where
    N: Notifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(notifier: Arc<N>, clock: Arc<C>, settings: DispatcherSettings) -> Self {
        Self {
            notifier,
            clock,
            renderer: MessageRenderer::new(),
            settings,
        }
    }

    /// Delivers one event, retrying each notifier call once.
    pub async fn dispatch(&self, event: &NotificationEvent) -> DispatchReport {
        let rendered = match self.renderer.render(event) {
            Ok(rendered) => rendered,
            Err(err) => {
                error!(
                    work_item_id = %event.work_item_id,
                    event_type = %event.event_type,
                    error = %err,
                    "dropping notification that failed to render"
                );
                return DispatchReport {
                    email: DeliveryOutcome::Dropped,
                    in_app: DeliveryOutcome::Dropped,
                };
            }
        };

        let now = self.clock.utc();
        let in_app = event.recipient.actor().map(|recipient| InAppNotification {
            id: InAppNotificationId::new(),
            recipient,
            work_item_id: event.work_item_id,
            event_type: event.event_type,
            message: rendered.subject.clone(),
            created_at: now,
        });
        let email = OutboundEmail {
            recipient: event.recipient.clone(),
            subject: rendered.subject,
            body: rendered.body,
            queued_at: now,
        };

        let notifier = &*self.notifier;
        let email_ref = &email;
        let email_outcome = self
            .with_retry("email", event, move || notifier.send_email(email_ref))
            .await;
        let in_app_outcome = match &in_app {
            Some(record) => {
                self.with_retry("in_app", event, move || notifier.record_in_app(record))
                    .await
            }
            None => DeliveryOutcome::Skipped,
        };

        DispatchReport {
            email: email_outcome,
            in_app: in_app_outcome,
        }
    }

    async fn with_retry<F, Fut>(
        &self,
        channel: &'static str,
        event: &NotificationEvent,
        attempt: F,
    ) -> DeliveryOutcome
    where
        F: Fn() -> Fut,
        Fut: Future<Output = NotifierResult<()>>,
    {
        let Err(first) = attempt().await else {
            return DeliveryOutcome::Delivered;
        };
        warn!(
            channel,
            work_item_id = %event.work_item_id,
            event_type = %event.event_type,
            error = %first,
            "notification delivery failed, retrying once"
        );
        tokio::time::sleep(self.settings.retry_delay).await;

        match attempt().await {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(second) => {
                warn!(
                    channel,
                    work_item_id = %event.work_item_id,
                    event_type = %event.event_type,
                    recipient = %event.recipient,
                    error = %second,
                    "notification dropped after retry"
                );
                DeliveryOutcome::Dropped
            }
        }
    }

    /// Runs the worker pool until `cancel` fires or the queue closes.
    pub async fn run(self, receiver: NotificationReceiver, cancel: CancellationToken) {
        let workers = self.settings.workers.max(1);
        info!(workers, "starting notification dispatcher");

        let mut pool = JoinSet::new();
        for worker in 0..workers {
            let dispatcher = self.clone();
            let queue = receiver.clone();
            let token = cancel.clone();
            pool.spawn(async move { dispatcher.work(worker, &queue, &token).await });
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "notification worker terminated abnormally");
            }
        }
        info!("notification dispatcher stopped");
    }

    async fn work(&self, worker: usize, queue: &NotificationReceiver, cancel: &CancellationToken) {
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                next = queue.recv() => next,
            };
            let Some(event) = next else {
                debug!(worker, "notification queue closed");
                break;
            };
            let report = self.dispatch(&event).await;
            debug!(
                worker,
                work_item_id = %event.work_item_id,
                event_type = %event.event_type,
                ?report,
                "notification processed"
            );
        }
    }
}
