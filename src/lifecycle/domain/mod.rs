//! Domain model for the work-item lifecycle.
//!
//! Tickets and tasks share one aggregate, [`WorkItem`], whose state is a
//! tagged [`WorkItemState`]. The pure functions in the state machine decide
//! every transition; nothing here touches storage.

mod actor;
mod error;
mod history;
mod ids;
mod item;
mod machine;
mod state;
mod template;

pub use actor::{Actor, ActorRole};
pub use error::{GuardedAction, ParseWorkItemStateError, TransitionRejection, WorkItemDomainError};
pub use history::HistoryEntry;
pub use ids::{ActorId, HistoryEntryId, WorkItemId};
pub use item::{PersistedWorkItemData, RecurrenceOrigin, WorkItem, WorkItemDraft};
pub use machine::{
    CreationDecision, Decision, NotificationIntent, ProposedTransition, RecipientRole, decide,
    decide_creation,
};
pub use state::{TaskState, TicketState, WorkItemKind, WorkItemState};
pub use template::{ContactEmail, Priority, ResolutionNote, WorkItemTemplate, WorkItemTitle};
