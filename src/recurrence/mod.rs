//! Recurring internal tasks.
//!
//! Administrators define a task template with a daily, weekly, or monthly
//! frequency. The scheduler wakes periodically, finds definitions whose
//! next occurrence is due, and spawns exactly one task per occurrence
//! through the lifecycle service's creation path. Monthly schedules keep
//! their anchor day and clamp it to shorter months.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
