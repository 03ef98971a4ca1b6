//! In-memory notifier that records deliveries for tests and local runs.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::notification::{
    domain::{InAppNotification, OutboundEmail},
    ports::{Notifier, NotifierError, NotifierResult},
};

/// Thread-safe notifier that keeps every delivered message in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    emails: Vec<OutboundEmail>,
    in_app: Vec<InAppNotification>,
    email_failures_remaining: usize,
    in_app_failures_remaining: usize,
}

impl RecordingNotifier {
    /// Creates an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` email sends fail with `Unavailable`.
    pub fn fail_next_emails(&self, count: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.email_failures_remaining = count;
        }
    }

    /// Makes the next `count` in-app writes fail with `Unavailable`.
    pub fn fail_next_in_app(&self, count: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.in_app_failures_remaining = count;
        }
    }

    /// Returns every email delivered so far.
    #[must_use]
    pub fn emails(&self) -> Vec<OutboundEmail> {
        self.state
            .lock()
            .map(|state| state.emails.clone())
            .unwrap_or_default()
    }

    /// Returns every in-app record written so far.
    #[must_use]
    pub fn in_app(&self) -> Vec<InAppNotification> {
        self.state
            .lock()
            .map(|state| state.in_app.clone())
            .unwrap_or_default()
    }
}

fn poisoned(err: &impl ToString) -> NotifierError {
    NotifierError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_email(&self, email: &OutboundEmail) -> NotifierResult<()> {
        let mut state = self.state.lock().map_err(|err| poisoned(&err))?;
        if state.email_failures_remaining > 0 {
            state.email_failures_remaining -= 1;
            return Err(NotifierError::Unavailable("injected email failure".to_owned()));
        }
        state.emails.push(email.clone());
        Ok(())
    }

    async fn record_in_app(&self, notification: &InAppNotification) -> NotifierResult<()> {
        let mut state = self.state.lock().map_err(|err| poisoned(&err))?;
        if state.in_app_failures_remaining > 0 {
            state.in_app_failures_remaining -= 1;
            return Err(NotifierError::Unavailable(
                "injected in-app failure".to_owned(),
            ));
        }
        state.in_app.push(notification.clone());
        Ok(())
    }
}
