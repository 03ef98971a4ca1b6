//! Bounded in-process queue between the lifecycle engine and the dispatcher.

use crate::notification::domain::NotificationEvent;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

/// Reason an event could not be queued.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum EnqueueError {
    /// The queue is at capacity.
    #[error("notification queue is full")]
    Full,
    /// Every receiver has been dropped.
    #[error("notification queue is closed")]
    Closed,
}

/// Creates a queue holding at most `capacity` pending events.
///
/// A zero capacity is raised to one.
#[must_use]
pub fn notification_channel(capacity: usize) -> (NotificationQueue, NotificationReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        NotificationQueue { sender },
        NotificationReceiver {
            inner: Arc::new(Mutex::new(receiver)),
        },
    )
}

/// Producer half, cloned into every service that emits notifications.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<NotificationEvent>,
}

impl NotificationQueue {
    /// Queues `event` without waiting for space.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Full`] when the queue is at capacity and
    /// [`EnqueueError::Closed`] when the dispatcher has shut down.
    pub fn enqueue(&self, event: NotificationEvent) -> Result<(), EnqueueError> {
        self.sender.try_send(event).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}

/// Consumer half shared by the dispatcher workers.
#[derive(Debug, Clone)]
pub struct NotificationReceiver {
    inner: Arc<Mutex<mpsc::Receiver<NotificationEvent>>>,
}

impl NotificationReceiver {
    /// Waits for the next event; `None` once every producer is gone.
    pub async fn recv(&self) -> Option<NotificationEvent> {
        self.inner.lock().await.recv().await
    }

    /// Returns an already queued event without waiting.
    pub async fn try_recv(&self) -> Option<NotificationEvent> {
        self.inner.lock().await.try_recv().ok()
    }
}
