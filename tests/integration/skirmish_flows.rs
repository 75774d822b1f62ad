//! Whole-layer scenarios: orders, fights, stuns and rewards.

use std::time::Duration;

use pretty_assertions::assert_eq;
use skirmish::prelude::*;

use crate::{create_skirmish_app, position, run_until, spawn};

fn order(app: &mut App, unit: Entity, order: Order) {
    app.world_mut()
        .resource_mut::<Messages<UnitCommand>>()
        .write(UnitCommand { unit, order });
}

fn ally_state(app: &App, unit: Entity) -> AllyState {
    app.world().get::<AllyBehavior>(unit).unwrap().state()
}

#[test]
fn avatar_walks_to_an_ordered_point_and_stops() {
    let mut app = create_skirmish_app();
    let avatar = spawn(&mut app, UnitKind::Avatar, 0.0, 0.0);
    let destination = Vec2::new(100.0, 200.0);

    order(&mut app, avatar, Order::MoveTo(destination));
    app.update();
    assert_eq!(ally_state(&app, avatar), AllyState::Moving { destination });

    run_until(&mut app, 60, |app| ally_state(app, avatar) == AllyState::Idle);
    assert_eq!(position(&app, avatar), destination);
}

#[test]
fn avatar_ignores_nearby_enemies_until_ordered() {
    let mut app = create_skirmish_app();
    let avatar = spawn(&mut app, UnitKind::Avatar, 0.0, 0.0);
    let dummy = spawn(&mut app, UnitKind::TrainingDummy, 40.0, 0.0);

    for _ in 0..5 {
        app.update();
    }
    assert_eq!(ally_state(&app, avatar), AllyState::Idle);

    order(&mut app, avatar, Order::Attack(dummy));
    app.update();
    assert_eq!(
        app.world().get::<AttackBehavior>(avatar).unwrap().target(),
        Some(dummy)
    );
    run_until(&mut app, 50, |app| {
        app.world().get::<Health>(dummy).unwrap().current < 500.0
    });
}

#[test]
fn minions_defeat_a_grunt_and_split_its_bounty() {
    let mut app = create_skirmish_app();
    let minions = [
        spawn(&mut app, UnitKind::Minion, 0.0, -10.0),
        spawn(&mut app, UnitKind::Minion, 0.0, 10.0),
    ];
    let grunt = spawn(&mut app, UnitKind::Grunt, 60.0, 0.0);

    run_until(&mut app, 300, |app| app.world().get_entity(grunt).is_err());
    // Allies notice the defeat on their next behavior pass.
    app.update();

    for minion in minions {
        assert_eq!(app.world().get::<Experience>(minion), Some(&Experience(5)));
        assert_eq!(ally_state(&app, minion), AllyState::Idle);
    }
}

#[test]
fn stunned_hostile_stands_still_until_the_stun_ends() {
    let mut app = create_skirmish_app();
    let grunt = spawn(&mut app, UnitKind::Grunt, 0.0, 0.0);
    app.world_mut()
        .entity_mut(grunt)
        .insert(Stunned::for_duration(Duration::from_secs(1)));
    let avatar = spawn(&mut app, UnitKind::Avatar, 120.0, 0.0);

    for _ in 0..5 {
        app.update();
    }
    assert_eq!(position(&app, grunt), Vec2::ZERO);
    assert_eq!(
        app.world().get::<HostileBehavior>(grunt).unwrap().state(),
        HostileState::Idle
    );

    run_until(&mut app, 20, |app| {
        app.world().get::<HostileBehavior>(grunt).unwrap().state()
            == HostileState::Engaged { target: avatar }
    });
    assert!(!app.world().entity(grunt).contains::<Stunned>());
}
