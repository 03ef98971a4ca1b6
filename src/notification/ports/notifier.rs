//! Notifier port for outbound email and in-app records.

use crate::notification::domain::{InAppNotification, OutboundEmail};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for notifier operations.
pub type NotifierResult<T> = Result<T, NotifierError>;

/// Delivery contract used by the dispatcher.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Hands a rendered email to the mail transport.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when the transport rejects the message.
    async fn send_email(&self, email: &OutboundEmail) -> NotifierResult<()>;

    /// Stores an in-app notification record.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when the record cannot be written.
    async fn record_in_app(&self, notification: &InAppNotification) -> NotifierResult<()>;
}

/// Errors returned by notifier implementations.
#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    /// The downstream transport refused or timed out.
    #[error("notification transport unavailable: {0}")]
    Unavailable(String),

    /// Persistence-layer failure while recording in-app notifications.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotifierError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
