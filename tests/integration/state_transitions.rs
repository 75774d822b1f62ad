//! Pausing and resuming the simulation.

use pretty_assertions::assert_eq;
use skirmish::prelude::*;

use crate::{create_skirmish_app, position, spawn};

fn set_state(app: &mut App, state: SimulationState) {
    app.world_mut()
        .resource_mut::<NextState<SimulationState>>()
        .set(state);
    app.update();
}

#[test]
fn simulation_starts_running() {
    let app = create_skirmish_app();
    let state = app.world().resource::<State<SimulationState>>();
    assert_eq!(*state.get(), SimulationState::Running);
}

#[test]
fn paused_simulation_freezes_units() {
    let mut app = create_skirmish_app();
    let grunt = spawn(&mut app, UnitKind::Grunt, 0.0, 0.0);
    let minion = spawn(&mut app, UnitKind::Minion, 100.0, 0.0);

    set_state(&mut app, SimulationState::Paused);
    let frozen = (position(&app, grunt), position(&app, minion));
    for _ in 0..10 {
        app.update();
    }

    assert_eq!((position(&app, grunt), position(&app, minion)), frozen);
    assert_eq!(
        app.world().get::<HostileBehavior>(grunt).unwrap().state(),
        HostileState::Idle
    );
}

#[test]
fn resuming_picks_the_fight_back_up() {
    let mut app = create_skirmish_app();
    let grunt = spawn(&mut app, UnitKind::Grunt, 0.0, 0.0);
    let minion = spawn(&mut app, UnitKind::Minion, 100.0, 0.0);

    set_state(&mut app, SimulationState::Paused);
    set_state(&mut app, SimulationState::Running);
    for _ in 0..3 {
        app.update();
    }

    assert_eq!(
        app.world().get::<HostileBehavior>(grunt).unwrap().state(),
        HostileState::Engaged { target: minion }
    );
}
