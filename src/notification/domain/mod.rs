//! Notification events and their rendered forms.

mod event;
mod message;
mod render;

pub use event::{NotificationEvent, NotificationEventType, NotificationPayload, NotificationRecipient};
pub use message::{InAppNotification, InAppNotificationId, OutboundEmail};
pub use render::{MessageRenderer, RenderError, RenderedMessage};
