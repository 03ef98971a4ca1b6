mod dispatcher_tests;

use crate::lifecycle::domain::{ActorId, WorkItemId, WorkItemKind, WorkItemState};
use crate::notification::domain::{
    NotificationEvent, NotificationEventType, NotificationPayload, NotificationRecipient,
};
use crate::test_support::utc;

fn event(
    event_type: NotificationEventType,
    kind: WorkItemKind,
    state: &str,
    previous_state: Option<&str>,
) -> NotificationEvent {
    NotificationEvent {
        work_item_id: WorkItemId::new(),
        event_type,
        recipient: NotificationRecipient::Actor(ActorId::new()),
        payload: NotificationPayload {
            title: "Printer jam".to_owned(),
            kind,
            previous_state: previous_state
                .map(|raw| WorkItemState::parse(kind, raw).expect("valid previous state")),
            state: WorkItemState::parse(kind, state).expect("valid state"),
            resolution_note: None,
        },
        occurred_at: utc(2026, 6, 1, 12, 0),
    }
}
