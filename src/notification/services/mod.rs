//! Notification queue and dispatcher.

mod dispatcher;
mod queue;

pub use dispatcher::{DeliveryOutcome, DispatchReport, DispatcherSettings, NotificationDispatcher};
pub use queue::{EnqueueError, NotificationQueue, NotificationReceiver, notification_channel};
