//! Error types for work item validation and lifecycle decisions.

use super::{ActorRole, WorkItemKind, WorkItemState};
use std::fmt;
use thiserror::Error;

/// Malformed input caught before the state machine runs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkItemDomainError {
    /// The title is empty after trimming.
    #[error("work item title must not be empty")]
    EmptyTitle,

    /// The title exceeds the storage limit.
    #[error("work item title is {actual} characters, limit is {max}")]
    TitleTooLong {
        /// Length of the rejected title in characters.
        actual: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// The contact address is not a plausible email address.
    #[error("invalid contact email '{0}'")]
    InvalidContactEmail(String),

    /// The priority label is unknown.
    #[error("unknown priority '{0}'")]
    UnknownPriority(String),

    /// The target state does not belong to the item's kind.
    #[error(transparent)]
    InvalidState(#[from] ParseWorkItemStateError),

    /// An assignment was requested without naming the assignee.
    #[error("assigning a ticket requires an assignee")]
    MissingAssignee,

    /// An assignee was supplied for a transition that does not assign.
    #[error("an assignee may only be supplied when transitioning to assigned, not {0}")]
    UnexpectedAssignee(WorkItemState),

    /// Tickets start unassigned; ownership is granted by a transition.
    #[error("tickets cannot be created with an assignee")]
    TicketCreatedWithAssignee,
}

/// Error returned while parsing kinds or states from external input or
/// persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseWorkItemStateError {
    /// The work item kind is unknown.
    #[error("unknown work item kind: {0}")]
    UnknownKind(String),

    /// The state is not part of the kind's vocabulary.
    #[error("unknown {kind} state: {value}")]
    UnknownState {
        /// Kind whose vocabulary was searched.
        kind: WorkItemKind,
        /// The rejected value.
        value: String,
    },
}

/// Operation guarded by the role policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardedAction {
    /// Creating an internal task.
    CreateTask,
    /// Driving any state transition.
    Transition,
}

impl fmt::Display for GuardedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateTask => f.write_str("create tasks"),
            Self::Transition => f.write_str("transition work items"),
        }
    }
}

/// Classified rejection produced by the state machine.
///
/// These are business outcomes and are returned to callers unchanged.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransitionRejection {
    /// No edge exists from the current state to the target.
    #[error("no transition from {from} to {to}")]
    InvalidEdge {
        /// State the item is in.
        from: WorkItemState,
        /// Proposed target state.
        to: WorkItemState,
    },

    /// The actor's role does not permit the operation.
    #[error("role {role} may not {action}")]
    Forbidden {
        /// Role of the rejected actor.
        role: ActorRole,
        /// The operation that was attempted.
        action: GuardedAction,
    },

    /// Closing a ticket requires a non-empty resolution note.
    #[error("closing a ticket requires a resolution note")]
    MissingResolution,
}
