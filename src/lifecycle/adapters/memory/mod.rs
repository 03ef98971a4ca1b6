//! In-memory adapters for lifecycle tests and local runs.

mod faults;
mod work_item;

pub use faults::{FaultInjector, InjectedFault, StoreOperation};
pub use work_item::InMemoryWorkItemRepository;
