//! When steps for ticket lifecycle BDD scenarios.

use super::world::{TicketLifecycleWorld, run_async};
use deskflow::lifecycle::{
    domain::{Actor, ActorId},
    services::TransitionRequest,
};
use rstest_bdd_macros::when;

fn transition(
    world: &mut TicketLifecycleWorld,
    request: TransitionRequest,
    actor: Actor,
) -> Result<(), eyre::Report> {
    let id = world.ticket()?.id();
    let result = run_async(world.service.request_transition(id, request, &actor));
    world.record(result);
    Ok(())
}

#[when("staff assign the ticket to a colleague")]
fn staff_assign(world: &mut TicketLifecycleWorld) -> Result<(), eyre::Report> {
    let staff = world.staff;
    transition(
        world,
        TransitionRequest::new("assigned").with_assignee(ActorId::new()),
        staff,
    )
}

#[when(r#"staff move the ticket to "{target_state}""#)]
fn staff_move(world: &mut TicketLifecycleWorld, target_state: String) -> Result<(), eyre::Report> {
    let staff = world.staff;
    transition(world, TransitionRequest::new(target_state), staff)
}

#[when("staff close the ticket without a resolution note")]
fn staff_close_without_note(world: &mut TicketLifecycleWorld) -> Result<(), eyre::Report> {
    let staff = world.staff;
    transition(world, TransitionRequest::new("closed"), staff)
}

#[when(r#"staff close the ticket with resolution note "{note}""#)]
fn staff_close_with_note(world: &mut TicketLifecycleWorld, note: String) -> Result<(), eyre::Report> {
    let staff = world.staff;
    transition(
        world,
        TransitionRequest::new("closed").with_resolution_note(note),
        staff,
    )
}

#[when(r#"the customer moves the ticket to "{target_state}""#)]
fn customer_move(
    world: &mut TicketLifecycleWorld,
    target_state: String,
) -> Result<(), eyre::Report> {
    let request = if target_state == "assigned" {
        TransitionRequest::new(target_state).with_assignee(ActorId::new())
    } else {
        TransitionRequest::new(target_state)
    };
    transition(world, request, Actor::anonymous())
}
