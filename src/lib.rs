//! Deskflow: work item lifecycle engine for support tickets and internal
//! tasks.
//!
//! Tickets are opened by customers (anonymous or authenticated) and worked
//! by staff; tasks are internal and may be spawned on a schedule. Every
//! state change passes through a single state machine, is committed with
//! its audit entry under a row lock, and only then produces notifications.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence and delivery
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//! - **Services**: Orchestration over ports
//!
//! # Modules
//!
//! - [`lifecycle`]: Ticket and task state machine, repository, and service
//! - [`notification`]: Notification events, rendering, and dispatch
//! - [`recurrence`]: Recurring task definitions and the spawning scheduler
//! - [`config`]: Engine configuration loading

pub mod config;
pub mod lifecycle;
pub mod notification;
pub mod recurrence;

#[cfg(test)]
mod test_support;
