//! Work item kinds and their fixed state vocabularies.

use super::ParseWorkItemStateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of work item governed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    /// Customer-facing support ticket.
    Ticket,
    /// Internal staff task.
    Task,
}

impl WorkItemKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ticket => "ticket",
            Self::Task => "task",
        }
    }

    /// Returns the state every new item of this kind starts in.
    #[must_use]
    pub const fn initial_state(self) -> WorkItemState {
        match self {
            Self::Ticket => WorkItemState::Ticket(TicketState::Unassigned),
            Self::Task => WorkItemState::Task(TaskState::Open),
        }
    }
}

impl TryFrom<&str> for WorkItemKind {
    type Error = ParseWorkItemStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ticket" => Ok(Self::Ticket),
            "task" => Ok(Self::Task),
            _ => Err(ParseWorkItemStateError::UnknownKind(value.to_owned())),
        }
    }
}

impl fmt::Display for WorkItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
    /// Submitted, nobody owns it yet.
    Unassigned,
    /// A staff member owns the ticket.
    Assigned,
    /// The assignee is working on it.
    InProgress,
    /// Resolved. Terminal.
    Closed,
}

impl TicketState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }

    /// Returns whether the ticket edge table contains `self -> target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Unassigned, Self::Assigned)
                | (Self::Assigned, Self::InProgress | Self::Closed)
                | (Self::InProgress, Self::Closed)
        )
    }

    /// Returns whether no outbound edges exist.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl TryFrom<&str> for TicketState {
    type Error = ParseWorkItemStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unassigned" => Ok(Self::Unassigned),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseWorkItemStateError::UnknownState {
                kind: WorkItemKind::Ticket,
                value: value.to_owned(),
            }),
        }
    }
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Created, work has not started.
    Open,
    /// Work is under way.
    InProgress,
    /// Done. Terminal.
    Completed,
}

impl TaskState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Returns whether the task edge table contains `self -> target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::InProgress | Self::Completed) | (Self::InProgress, Self::Completed)
        )
    }

    /// Returns whether no outbound edges exist.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl TryFrom<&str> for TaskState {
    type Error = ParseWorkItemStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseWorkItemStateError::UnknownState {
                kind: WorkItemKind::Task,
                value: value.to_owned(),
            }),
        }
    }
}

/// State of a work item, tagged with the kind whose vocabulary it uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum WorkItemState {
    /// A ticket state.
    Ticket(TicketState),
    /// A task state.
    Task(TaskState),
}

impl WorkItemState {
    /// Parses a state name within the vocabulary of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseWorkItemStateError::UnknownState`] when `value` is not a
    /// state of `kind`.
    pub fn parse(kind: WorkItemKind, value: &str) -> Result<Self, ParseWorkItemStateError> {
        match kind {
            WorkItemKind::Ticket => TicketState::try_from(value).map(Self::Ticket),
            WorkItemKind::Task => TaskState::try_from(value).map(Self::Task),
        }
    }

    /// Returns the kind this state belongs to.
    #[must_use]
    pub const fn kind(self) -> WorkItemKind {
        match self {
            Self::Ticket(_) => WorkItemKind::Ticket,
            Self::Task(_) => WorkItemKind::Task,
        }
    }

    /// Returns the canonical storage representation of the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ticket(state) => state.as_str(),
            Self::Task(state) => state.as_str(),
        }
    }

    /// Returns whether the state is Closed or Completed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        match self {
            Self::Ticket(state) => state.is_terminal(),
            Self::Task(state) => state.is_terminal(),
        }
    }

    /// Returns whether an edge `self -> target` exists for the item's kind.
    ///
    /// States of different kinds are never connected.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match (self, target) {
            (Self::Ticket(from), Self::Ticket(to)) => from.can_transition_to(to),
            (Self::Task(from), Self::Task(to)) => from.can_transition_to(to),
            _ => false,
        }
    }
}

impl fmt::Display for WorkItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.as_str())
    }
}
