//! Unit tests for work item value objects and the aggregate.

use crate::lifecycle::domain::{
    Actor, ActorId, ActorRole, ContactEmail, ParseWorkItemStateError, Priority, ProposedTransition,
    ResolutionNote, TaskState, TicketState, WorkItem, WorkItemDomainError, WorkItemDraft,
    WorkItemKind, WorkItemState, WorkItemTemplate, WorkItemTitle, decide, decide_creation,
};
use crate::test_support::{ManualClock, utc};
use chrono::Duration;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> ManualClock {
    ManualClock::at(utc(2026, 3, 2, 9, 0))
}

fn ticket_draft(creator: Option<ActorId>) -> WorkItemDraft {
    WorkItemDraft {
        template: WorkItemTemplate::new(WorkItemTitle::new("Printer jam").expect("valid title")),
        creator,
        contact_email: None,
        recurrence: None,
    }
}

fn new_ticket(clock: &ManualClock, creator: Option<ActorId>) -> WorkItem {
    let decision = decide_creation(WorkItemKind::Ticket, ActorRole::Public, false)
        .expect("tickets are open to everyone");
    WorkItem::create(&decision, ticket_draft(creator), clock)
}

#[rstest]
#[case("", WorkItemDomainError::EmptyTitle)]
#[case("   \t ", WorkItemDomainError::EmptyTitle)]
fn blank_titles_are_rejected(#[case] raw: &str, #[case] expected: WorkItemDomainError) {
    assert_eq!(WorkItemTitle::new(raw), Err(expected));
}

#[rstest]
fn titles_are_trimmed() {
    let title = WorkItemTitle::new("  Reset VPN token ").expect("valid title");
    assert_eq!(title.as_str(), "Reset VPN token");
}

#[rstest]
fn overlong_titles_are_rejected() {
    let raw = "x".repeat(WorkItemTitle::MAX_CHARS + 1);
    assert_eq!(
        WorkItemTitle::new(raw),
        Err(WorkItemDomainError::TitleTooLong {
            actual: WorkItemTitle::MAX_CHARS + 1,
            max: WorkItemTitle::MAX_CHARS,
        })
    );
}

#[rstest]
fn title_limit_counts_characters_not_bytes() {
    let raw = "é".repeat(WorkItemTitle::MAX_CHARS);
    assert!(WorkItemTitle::new(raw).is_ok());
}

#[rstest]
#[case("customer@example.com", true)]
#[case("  padded@example.org ", true)]
#[case("no-at-sign.example.com", false)]
#[case("@example.com", false)]
#[case("user@localhost", false)]
#[case("two words@example.com", false)]
fn contact_email_plausibility(#[case] raw: &str, #[case] accepted: bool) {
    assert_eq!(ContactEmail::new(raw).is_ok(), accepted);
}

#[rstest]
#[case("low", Priority::Low)]
#[case("Normal", Priority::Normal)]
#[case(" HIGH ", Priority::High)]
#[case("urgent", Priority::Urgent)]
fn priorities_parse_case_insensitively(#[case] raw: &str, #[case] expected: Priority) {
    assert_eq!(Priority::try_from(raw), Ok(expected));
}

#[rstest]
fn unknown_priority_is_rejected() {
    assert_eq!(
        Priority::try_from("critical"),
        Err(WorkItemDomainError::UnknownPriority("critical".to_owned()))
    );
}

#[rstest]
#[case(WorkItemKind::Ticket, "in_progress", WorkItemState::Ticket(TicketState::InProgress))]
#[case(WorkItemKind::Task, "in_progress", WorkItemState::Task(TaskState::InProgress))]
#[case(WorkItemKind::Task, "completed", WorkItemState::Task(TaskState::Completed))]
fn states_parse_within_kind_vocabulary(
    #[case] kind: WorkItemKind,
    #[case] raw: &str,
    #[case] expected: WorkItemState,
) {
    assert_eq!(WorkItemState::parse(kind, raw), Ok(expected));
}

#[rstest]
#[case(WorkItemKind::Ticket, "completed")]
#[case(WorkItemKind::Task, "assigned")]
#[case(WorkItemKind::Task, "closed")]
fn states_of_the_other_kind_are_unknown(#[case] kind: WorkItemKind, #[case] raw: &str) {
    assert_eq!(
        WorkItemState::parse(kind, raw),
        Err(ParseWorkItemStateError::UnknownState {
            kind,
            value: raw.to_owned()
        })
    );
}

#[rstest]
fn state_display_names_kind_and_state() {
    assert_eq!(
        WorkItemState::Ticket(TicketState::InProgress).to_string(),
        "ticket:in_progress"
    );
}

#[rstest]
fn created_ticket_starts_unassigned(clock: ManualClock) {
    let creator = ActorId::new();
    let item = new_ticket(&clock, Some(creator));

    assert_eq!(item.kind(), WorkItemKind::Ticket);
    assert_eq!(item.state(), WorkItemState::Ticket(TicketState::Unassigned));
    assert_eq!(item.creator(), Some(creator));
    assert_eq!(item.assignee(), None);
    assert_eq!(item.priority(), Priority::Normal);
    assert_eq!(item.created_at(), item.updated_at());
}

#[rstest]
fn apply_records_history_and_updates_item(clock: ManualClock) {
    let mut item = new_ticket(&clock, None);
    let staff_id = ActorId::new();
    let staff = Actor::staff(staff_id);
    let assignee = ActorId::new();
    let decision = decide(
        item.state(),
        &ProposedTransition::assign(assignee),
        staff.role(),
    )
    .expect("assignment is allowed");
    clock.advance(Duration::minutes(5));

    let entry = item.apply(&decision, &staff, &clock);

    assert_eq!(item.state(), WorkItemState::Ticket(TicketState::Assigned));
    assert_eq!(item.assignee(), Some(assignee));
    assert_eq!(item.updated_at(), utc(2026, 3, 2, 9, 5));
    assert_eq!(entry.work_item_id(), item.id());
    assert_eq!(entry.actor(), Some(staff_id));
    assert_eq!(
        entry.from_state(),
        WorkItemState::Ticket(TicketState::Unassigned)
    );
    assert_eq!(entry.to_state(), WorkItemState::Ticket(TicketState::Assigned));
    assert_eq!(entry.note(), None);
    assert_eq!(entry.created_at(), item.updated_at());
}

#[rstest]
fn closing_stores_resolution_on_item_and_history(clock: ManualClock) {
    let mut item = new_ticket(&clock, None);
    let staff = Actor::staff(ActorId::new());
    let assign = decide(
        item.state(),
        &ProposedTransition::assign(ActorId::new()),
        staff.role(),
    )
    .expect("assignment is allowed");
    item.apply(&assign, &staff, &clock);

    let close = ProposedTransition::new(
        WorkItemState::Ticket(TicketState::Closed),
        None,
        ResolutionNote::parse("Cleared the paper path"),
    )
    .expect("well formed");
    let decision = decide(item.state(), &close, staff.role()).expect("close is allowed");
    let entry = item.apply(&decision, &staff, &clock);

    assert_eq!(
        item.resolution_note().map(ResolutionNote::as_str),
        Some("Cleared the paper path")
    );
    assert_eq!(entry.note(), Some("Cleared the paper path"));
    assert!(item.state().is_terminal());
}

#[rstest]
fn system_actor_is_elevated_without_identity() {
    let system = Actor::system();

    assert_eq!(system.id(), None);
    assert_eq!(system.role(), ActorRole::System);
    assert!(system.role().is_elevated());
    assert!(!Actor::anonymous().role().is_elevated());
}
