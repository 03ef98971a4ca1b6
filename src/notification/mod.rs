//! Side-effect dispatch for lifecycle changes.
//!
//! Committed transitions and creations produce [`domain::NotificationEvent`]s
//! that travel through a bounded queue ([`services::notification_channel`]) to
//! a pool of [`services::NotificationDispatcher`] workers. Workers render each
//! event with `minijinja` templates and deliver it through the
//! [`ports::Notifier`] port. Delivery never affects the lifecycle
//! transaction that produced the event.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
