//! Then steps for ticket lifecycle BDD scenarios.

use super::world::{TicketLifecycleWorld, run_async};
use deskflow::lifecycle::{domain::ResolutionNote, services::LifecycleErrorKind};
use rstest_bdd_macros::then;

#[then(r#"the ticket state is "{state}""#)]
fn ticket_state_is(world: &TicketLifecycleWorld, state: String) -> Result<(), eyre::Report> {
    let id = world.ticket()?.id();
    let stored = run_async(world.service.find_work_item(id))
        .map_err(|err| eyre::eyre!("ticket lookup failed: {err}"))?;

    if stored.state().as_str() != state {
        return Err(eyre::eyre!(
            "expected state {state}, found {}",
            stored.state().as_str()
        ));
    }
    Ok(())
}

#[then("the ticket has {count:usize} history entries")]
fn ticket_history_count(world: &TicketLifecycleWorld, count: usize) -> Result<(), eyre::Report> {
    let id = world.ticket()?.id();
    let history = run_async(world.service.list_history(id))
        .map_err(|err| eyre::eyre!("history lookup failed: {err}"))?;

    if history.len() != count {
        return Err(eyre::eyre!(
            "expected {count} history entries, found {}",
            history.len()
        ));
    }
    Ok(())
}

#[then(r#"the ticket resolution note is "{note}""#)]
fn ticket_resolution_is(world: &TicketLifecycleWorld, note: String) -> Result<(), eyre::Report> {
    let actual = world.ticket()?.resolution_note().map(ResolutionNote::as_str);

    if actual != Some(note.as_str()) {
        return Err(eyre::eyre!("expected resolution note {note}, found {actual:?}"));
    }
    Ok(())
}

#[then(r#"the request is rejected with "{reason}""#)]
fn request_rejected_with(world: &TicketLifecycleWorld, reason: String) -> Result<(), eyre::Report> {
    let expected = match reason.as_str() {
        "invalid_edge" => LifecycleErrorKind::InvalidEdge,
        "forbidden" => LifecycleErrorKind::Forbidden,
        "missing_resolution" => LifecycleErrorKind::MissingResolution,
        other => return Err(eyre::eyre!("unknown rejection reason in scenario: {other}")),
    };
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition result"))?;

    match result {
        Err(err) if err.kind() == expected => Ok(()),
        other => Err(eyre::eyre!("expected {expected:?} rejection, got {other:?}")),
    }
}
