//! Step definitions for ticket lifecycle scenarios.

mod given;
mod then;
mod when;
pub mod world;
