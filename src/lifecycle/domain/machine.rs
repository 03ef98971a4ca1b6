//! Pure transition policy shared by tickets and tasks.
//!
//! [`decide`] and [`decide_creation`] never touch storage or the clock. They
//! answer whether an actor may move an item along an edge and which
//! notifications the move implies, so the lifecycle service can act without
//! restating any policy.

use super::{
    ActorId, ActorRole, GuardedAction, ResolutionNote, TaskState, TicketState,
    TransitionRejection, WorkItemDomainError, WorkItemKind, WorkItemState,
};
use crate::notification::domain::NotificationEventType;

/// Who should hear about an accepted change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipientRole {
    /// The actor who created the item, or the submitter's contact address.
    Creator,
    /// The current assignee.
    Assignee,
}

/// A notification the lifecycle service should emit after commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationIntent {
    /// Kind of event to emit.
    pub event_type: NotificationEventType,
    /// Party that receives it.
    pub recipient: RecipientRole,
}

impl NotificationIntent {
    const fn new(event_type: NotificationEventType, recipient: RecipientRole) -> Self {
        Self {
            event_type,
            recipient,
        }
    }
}

/// A proposed state change, validated for shape but not yet for policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedTransition {
    target: WorkItemState,
    assignee: Option<ActorId>,
    resolution_note: Option<ResolutionNote>,
}

impl ProposedTransition {
    /// Creates a proposal.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemDomainError::MissingAssignee`] when the target is
    /// `assigned` without an assignee and
    /// [`WorkItemDomainError::UnexpectedAssignee`] when an assignee accompanies
    /// any other target.
    pub fn new(
        target: WorkItemState,
        assignee: Option<ActorId>,
        resolution_note: Option<ResolutionNote>,
    ) -> Result<Self, WorkItemDomainError> {
        let assigns = target == WorkItemState::Ticket(TicketState::Assigned);
        match (assigns, assignee) {
            (true, None) => Err(WorkItemDomainError::MissingAssignee),
            (false, Some(_)) => Err(WorkItemDomainError::UnexpectedAssignee(target)),
            _ => Ok(Self {
                target,
                assignee,
                resolution_note,
            }),
        }
    }

    /// Proposes assigning a ticket to `assignee`.
    #[must_use]
    pub const fn assign(assignee: ActorId) -> Self {
        Self {
            target: WorkItemState::Ticket(TicketState::Assigned),
            assignee: Some(assignee),
            resolution_note: None,
        }
    }

    /// Returns the target state.
    #[must_use]
    pub const fn target(&self) -> WorkItemState {
        self.target
    }

    /// Returns the proposed assignee.
    #[must_use]
    pub const fn assignee(&self) -> Option<ActorId> {
        self.assignee
    }

    /// Returns the accompanying note.
    #[must_use]
    pub const fn resolution_note(&self) -> Option<&ResolutionNote> {
        self.resolution_note.as_ref()
    }
}

/// Outcome of an accepted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// State before the transition.
    pub from: WorkItemState,
    /// State after the transition.
    pub to: WorkItemState,
    /// Assignee to record, when the transition assigns.
    pub assignee: Option<ActorId>,
    /// Note recorded in history; stored on the item for terminal targets.
    pub resolution_note: Option<ResolutionNote>,
    /// Notifications to emit after commit.
    pub effects: Vec<NotificationIntent>,
}

/// Outcome of an accepted creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationDecision {
    /// State the new item starts in.
    pub initial_state: WorkItemState,
    /// Notifications to emit after commit.
    pub effects: Vec<NotificationIntent>,
}

/// Decides whether `role` may move an item from `current` as proposed.
///
/// The role is checked first, then the edge table of the item's kind, then
/// the resolution note precondition for closing tickets.
///
/// # Errors
///
/// Returns [`TransitionRejection::Forbidden`] for non-elevated roles,
/// [`TransitionRejection::InvalidEdge`] when the edge does not exist (every
/// edge out of a terminal state), and [`TransitionRejection::MissingResolution`]
/// when closing a ticket without a note.
pub fn decide(
    current: WorkItemState,
    proposal: &ProposedTransition,
    role: ActorRole,
) -> Result<Decision, TransitionRejection> {
    if !role.is_elevated() {
        return Err(TransitionRejection::Forbidden {
            role,
            action: GuardedAction::Transition,
        });
    }

    let target = proposal.target();
    if !current.can_transition_to(target) {
        return Err(TransitionRejection::InvalidEdge {
            from: current,
            to: target,
        });
    }

    if target == WorkItemState::Ticket(TicketState::Closed) && proposal.resolution_note().is_none()
    {
        return Err(TransitionRejection::MissingResolution);
    }

    Ok(Decision {
        from: current,
        to: target,
        assignee: proposal.assignee(),
        resolution_note: proposal.resolution_note().cloned(),
        effects: effects_for(target),
    })
}

/// Decides whether `role` may create an item of `kind`.
///
/// Anyone may open a ticket; tasks are internal and need an elevated role.
///
/// # Errors
///
/// Returns [`TransitionRejection::Forbidden`] when a non-elevated role tries
/// to create a task.
pub fn decide_creation(
    kind: WorkItemKind,
    role: ActorRole,
    has_assignee: bool,
) -> Result<CreationDecision, TransitionRejection> {
    if kind == WorkItemKind::Task && !role.is_elevated() {
        return Err(TransitionRejection::Forbidden {
            role,
            action: GuardedAction::CreateTask,
        });
    }

    let mut effects = vec![NotificationIntent::new(
        NotificationEventType::Created,
        RecipientRole::Creator,
    )];
    if has_assignee {
        effects.push(NotificationIntent::new(
            NotificationEventType::Assigned,
            RecipientRole::Assignee,
        ));
    }

    Ok(CreationDecision {
        initial_state: kind.initial_state(),
        effects,
    })
}

fn effects_for(target: WorkItemState) -> Vec<NotificationIntent> {
    match target {
        WorkItemState::Ticket(TicketState::Assigned) => vec![NotificationIntent::new(
            NotificationEventType::Assigned,
            RecipientRole::Assignee,
        )],
        WorkItemState::Ticket(TicketState::InProgress)
        | WorkItemState::Task(TaskState::InProgress) => vec![NotificationIntent::new(
            NotificationEventType::StatusChanged,
            RecipientRole::Creator,
        )],
        WorkItemState::Ticket(TicketState::Closed) | WorkItemState::Task(TaskState::Completed) => {
            vec![NotificationIntent::new(
                NotificationEventType::Closed,
                RecipientRole::Creator,
            )]
        }
        WorkItemState::Ticket(TicketState::Unassigned) | WorkItemState::Task(TaskState::Open) => {
            Vec::new()
        }
    }
}
