//! Lifecycle orchestration: creation, transitions, and post-commit
//! notification hand-off.

use crate::lifecycle::{
    domain::{
        Actor, ActorId, ContactEmail, HistoryEntry, NotificationIntent, Priority,
        ProposedTransition, RecipientRole, ResolutionNote, TransitionRejection, WorkItem,
        WorkItemDomainError, WorkItemDraft, WorkItemId, WorkItemKind, WorkItemState,
        WorkItemTemplate, WorkItemTitle, decide, decide_creation,
    },
    ports::{
        StagedTransition, TransitionFn, TransitionOutcome, WorkItemRepository,
        WorkItemRepositoryError, WorkItemRepositoryResult,
    },
};
use crate::notification::{
    domain::{NotificationEvent, NotificationPayload, NotificationRecipient},
    services::NotificationQueue,
};
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Backoff before the single retry of a transient storage failure.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Request payload for creating a ticket or task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWorkItemRequest {
    kind: WorkItemKind,
    title: String,
    description: Option<String>,
    priority: Priority,
    assignee: Option<ActorId>,
    contact_email: Option<String>,
}

impl CreateWorkItemRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(kind: WorkItemKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: None,
            priority: Priority::default(),
            assignee: None,
            contact_email: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the initial assignee. Only tasks may start assigned.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: ActorId) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Sets the address an anonymous submitter is notified at.
    #[must_use]
    pub fn with_contact_email(mut self, contact_email: impl Into<String>) -> Self {
        self.contact_email = Some(contact_email.into());
        self
    }

    fn into_draft(self, actor: &Actor) -> Result<(WorkItemKind, WorkItemDraft), WorkItemDomainError> {
        if self.kind == WorkItemKind::Ticket && self.assignee.is_some() {
            return Err(WorkItemDomainError::TicketCreatedWithAssignee);
        }

        let mut template = WorkItemTemplate::new(WorkItemTitle::new(self.title)?)
            .with_priority(self.priority);
        if let Some(description) = self.description {
            template = template.with_description(description);
        }
        if let Some(assignee) = self.assignee {
            template = template.with_assignee(assignee);
        }
        let contact_email = self.contact_email.map(ContactEmail::new).transpose()?;

        Ok((
            self.kind,
            WorkItemDraft {
                template,
                creator: actor.id(),
                contact_email,
                recurrence: None,
            },
        ))
    }
}

/// Request payload for a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    target_state: String,
    assignee: Option<ActorId>,
    resolution_note: Option<String>,
}

impl TransitionRequest {
    /// Creates a request for `target_state`, named in the item kind's
    /// vocabulary (for example `in_progress`).
    #[must_use]
    pub fn new(target_state: impl Into<String>) -> Self {
        Self {
            target_state: target_state.into(),
            assignee: None,
            resolution_note: None,
        }
    }

    /// Sets the assignee for an `assigned` target.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: ActorId) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Sets the resolution note.
    #[must_use]
    pub fn with_resolution_note(mut self, note: impl Into<String>) -> Self {
        self.resolution_note = Some(note.into());
        self
    }

    fn into_proposal(self, kind: WorkItemKind) -> Result<ProposedTransition, WorkItemDomainError> {
        let target = WorkItemState::parse(kind, &self.target_state)?;
        let note = self.resolution_note.as_deref().and_then(ResolutionNote::parse);
        ProposedTransition::new(target, self.assignee, note)
    }
}

/// Coarse error classification for transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleErrorKind {
    /// Malformed input.
    ValidationFailed,
    /// The requested edge does not exist.
    InvalidEdge,
    /// The actor's role does not permit the operation.
    Forbidden,
    /// Closing a ticket without a resolution note.
    MissingResolution,
    /// The item does not exist.
    NotFound,
    /// The store failed.
    StorageError,
}

/// Service-level errors for lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Input validation failed before the state machine ran.
    #[error(transparent)]
    ValidationFailed(#[from] WorkItemDomainError),
    /// The state machine rejected the request.
    #[error(transparent)]
    Rejected(#[from] TransitionRejection),
    /// The work item does not exist.
    #[error("work item not found: {0}")]
    NotFound(WorkItemId),
    /// Repository operation failed.
    #[error(transparent)]
    Storage(WorkItemRepositoryError),
}

impl LifecycleError {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> LifecycleErrorKind {
        match self {
            Self::ValidationFailed(_) => LifecycleErrorKind::ValidationFailed,
            Self::Rejected(TransitionRejection::InvalidEdge { .. }) => {
                LifecycleErrorKind::InvalidEdge
            }
            Self::Rejected(TransitionRejection::Forbidden { .. }) => LifecycleErrorKind::Forbidden,
            Self::Rejected(TransitionRejection::MissingResolution) => {
                LifecycleErrorKind::MissingResolution
            }
            Self::NotFound(_) => LifecycleErrorKind::NotFound,
            Self::Storage(_) => LifecycleErrorKind::StorageError,
        }
    }
}

impl From<WorkItemRepositoryError> for LifecycleError {
    fn from(err: WorkItemRepositoryError) -> Self {
        match err {
            WorkItemRepositoryError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

/// Result type for lifecycle service operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// A created item that has passed policy but is not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedCreation {
    /// The new item.
    pub item: WorkItem,
    /// Notifications to emit once the item is stored.
    pub effects: Vec<NotificationIntent>,
}

/// Work item lifecycle orchestration service.
pub struct LifecycleService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    queue: NotificationQueue,
    retry_backoff: Duration,
}

impl<R, C> Clone for LifecycleService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            queue: self.queue.clone(),
            retry_backoff: self.retry_backoff,
        }
    }
}

impl<R, C> LifecycleService<R, C>
where
    R: WorkItemRepository,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>, queue: NotificationQueue) -> Self {
        Self {
            repository,
            clock,
            queue,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Sets the pause before retrying a transient storage failure.
    #[must_use]
    pub const fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    /// Creates a ticket or task.
    ///
    /// Anyone may open a ticket, including anonymous callers; tasks need an
    /// elevated role. Creation writes no history entry.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::ValidationFailed`] for malformed input,
    /// [`LifecycleError::Rejected`] when the role may not create the kind,
    /// and [`LifecycleError::Storage`] when persistence fails.
    pub async fn create_work_item(
        &self,
        request: CreateWorkItemRequest,
        actor: &Actor,
    ) -> LifecycleResult<WorkItem> {
        let (kind, draft) = request.into_draft(actor)?;
        let staged = self.stage_creation(kind, draft, actor)?;

        self.with_retry("insert_work_item", || self.repository.insert(&staged.item))
            .await?;
        info!(
            work_item_id = %staged.item.id(),
            kind = %kind,
            role = %actor.role(),
            "work item created"
        );

        self.publish_creation(&staged, actor);
        Ok(staged.item)
    }

    /// Runs the creation policy and builds the new item without storing it.
    ///
    /// Shared by [`Self::create_work_item`] and the recurrence scheduler.
    pub(crate) fn stage_creation(
        &self,
        kind: WorkItemKind,
        draft: WorkItemDraft,
        actor: &Actor,
    ) -> LifecycleResult<StagedCreation> {
        let decision = decide_creation(kind, actor.role(), draft.template.assignee().is_some())?;
        let item = WorkItem::create(&decision, draft, &*self.clock);
        Ok(StagedCreation {
            item,
            effects: decision.effects,
        })
    }

    /// Queues the notifications of a stored creation.
    pub(crate) fn publish_creation(&self, staged: &StagedCreation, actor: &Actor) {
        self.publish(&staged.item, None, &staged.effects, actor);
    }

    /// Moves an item to a new state.
    ///
    /// The item is locked, the state machine decides against its current
    /// state, and the new state and one history entry commit together.
    /// Rejections write nothing and notify nobody.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::ValidationFailed`] for unknown target states
    /// or misplaced assignees, [`LifecycleError::Rejected`] for policy
    /// rejections, [`LifecycleError::NotFound`] for unknown items, and
    /// [`LifecycleError::Storage`] when persistence fails or the row lock
    /// times out.
    pub async fn request_transition(
        &self,
        id: WorkItemId,
        request: TransitionRequest,
        actor: &Actor,
    ) -> LifecycleResult<WorkItem> {
        let kind = self.find_work_item(id).await?.kind();
        let proposal = request.into_proposal(kind)?;

        let outcome = self
            .with_retry("transition", || {
                self.repository
                    .transition(id, self.decider(proposal.clone(), *actor))
            })
            .await?;

        match outcome {
            TransitionOutcome::Committed(staged) => {
                info!(
                    work_item_id = %id,
                    from = %staged.entry.from_state(),
                    to = %staged.entry.to_state(),
                    role = %actor.role(),
                    "work item transitioned"
                );
                self.publish(
                    &staged.item,
                    Some(staged.entry.from_state()),
                    &staged.effects,
                    actor,
                );
                Ok(staged.item)
            }
            TransitionOutcome::Rejected(rejection) => {
                debug!(work_item_id = %id, %rejection, "transition rejected");
                Err(LifecycleError::Rejected(rejection))
            }
        }
    }

    /// Retrieves a work item.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] when the item does not exist and
    /// [`LifecycleError::Storage`] when the lookup fails.
    pub async fn find_work_item(&self, id: WorkItemId) -> LifecycleResult<WorkItem> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::NotFound(id))
    }

    /// Returns the item's accepted transitions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] when the item does not exist and
    /// [`LifecycleError::Storage`] when the lookup fails.
    pub async fn list_history(&self, id: WorkItemId) -> LifecycleResult<Vec<HistoryEntry>> {
        self.find_work_item(id).await?;
        Ok(self.repository.list_history(id).await?)
    }

    fn decider(&self, proposal: ProposedTransition, actor: Actor) -> TransitionFn {
        let clock = Arc::clone(&self.clock);
        Box::new(move |current: &WorkItem| {
            let decision = decide(current.state(), &proposal, actor.role())?;
            let mut item = current.clone();
            let entry = item.apply(&decision, &actor, &*clock);
            Ok(StagedTransition {
                item,
                entry,
                effects: decision.effects,
            })
        })
    }

    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut run: F,
    ) -> WorkItemRepositoryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = WorkItemRepositoryResult<T>>,
    {
        match run().await {
            Err(err) if err.is_transient() => {
                warn!(
                    operation,
                    error = %err,
                    backoff_ms = self.retry_backoff.as_millis(),
                    "transient storage failure, retrying once"
                );
                tokio::time::sleep(self.retry_backoff).await;
                run().await
            }
            result => result,
        }
    }

    fn publish(
        &self,
        item: &WorkItem,
        previous_state: Option<WorkItemState>,
        effects: &[NotificationIntent],
        actor: &Actor,
    ) {
        for intent in effects {
            let Some(recipient) = resolve_recipient(item, intent.recipient) else {
                debug!(
                    work_item_id = %item.id(),
                    event_type = %intent.event_type,
                    "no recipient for notification"
                );
                continue;
            };
            if recipient.actor().is_some() && recipient.actor() == actor.id() {
                continue;
            }

            let event = NotificationEvent {
                work_item_id: item.id(),
                event_type: intent.event_type,
                recipient,
                payload: NotificationPayload::snapshot(item, previous_state),
                occurred_at: item.updated_at(),
            };
            if let Err(err) = self.queue.enqueue(event) {
                warn!(
                    work_item_id = %item.id(),
                    event_type = %intent.event_type,
                    error = %err,
                    "dropping notification"
                );
            }
        }
    }
}

fn resolve_recipient(item: &WorkItem, role: RecipientRole) -> Option<NotificationRecipient> {
    match role {
        RecipientRole::Creator => item
            .creator()
            .map(NotificationRecipient::Actor)
            .or_else(|| item.contact_email().cloned().map(NotificationRecipient::Email)),
        RecipientRole::Assignee => item.assignee().map(NotificationRecipient::Actor),
    }
}
