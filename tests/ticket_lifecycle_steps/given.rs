//! Given steps for ticket lifecycle BDD scenarios.

use super::world::{TicketLifecycleWorld, run_async};
use deskflow::lifecycle::{
    domain::{Actor, ActorId, WorkItemKind},
    services::{CreateWorkItemRequest, TransitionRequest},
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"a ticket "{title}" submitted by an anonymous customer"#)]
fn anonymous_ticket(world: &mut TicketLifecycleWorld, title: String) -> Result<(), eyre::Report> {
    let request = CreateWorkItemRequest::new(WorkItemKind::Ticket, title)
        .with_contact_email("customer@example.com");
    let created = run_async(world.service.create_work_item(request, &Actor::anonymous()))
        .wrap_err("create anonymous ticket")?;
    world.ticket = Some(created);
    Ok(())
}

#[given(r#"the ticket has been assigned and closed with note "{note}""#)]
fn ticket_assigned_and_closed(
    world: &mut TicketLifecycleWorld,
    note: String,
) -> Result<(), eyre::Report> {
    let id = world.ticket()?.id();
    let staff = world.staff;
    run_async(world.service.request_transition(
        id,
        TransitionRequest::new("assigned").with_assignee(ActorId::new()),
        &staff,
    ))
    .wrap_err("assign ticket in scenario setup")?;
    let closed = run_async(world.service.request_transition(
        id,
        TransitionRequest::new("closed").with_resolution_note(note),
        &staff,
    ))
    .wrap_err("close ticket in scenario setup")?;
    world.ticket = Some(closed);
    Ok(())
}
