//! Work item lifecycle for tickets and tasks.
//!
//! Tickets are customer-facing and move `unassigned -> assigned ->
//! in_progress -> closed`; tasks are internal and move `open -> in_progress
//! -> completed`. One pure state machine decides every change, and the
//! service commits each accepted change together with its history entry
//! before handing notifications to the dispatcher. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
