//! Port contracts for notification delivery.

pub mod notifier;

#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notifier, NotifierError, NotifierResult};
