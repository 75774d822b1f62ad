//! Testing utilities for combat components and Bevy systems.

#![cfg(test)]

use std::time::Duration;

use bevy::ecs::query::QueryFilter;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use crate::config::CombatConfig;
use crate::gameplay::abilities::AbilityCatalog;
use crate::gameplay::capabilities::UnitSnapshot;
use crate::gameplay::units::{UnitKind, spawn_unit};
use crate::gameplay::{Body, Health, Target, Team};

/// Fixed frame length used by every test app.
pub const TEST_FRAME: Duration = Duration::from_millis(100);

/// Allocates `count` distinct entity ids from a throwaway world.
pub fn test_entities(count: usize) -> Vec<Entity> {
    let mut world = World::new();
    (0..count).map(|_| world.spawn_empty().id()).collect()
}

/// Candidate snapshot with full health.
pub fn snapshot(entity: Entity, team: Team, x: f32, y: f32) -> UnitSnapshot {
    UnitSnapshot::new(entity, team, Vec2::new(x, y), 6.0, Health::new(100.0))
}

/// Candidate snapshot at a given HP fraction of 100 max HP.
pub fn wounded_snapshot(entity: Entity, team: Team, x: f32, hp: f32) -> UnitSnapshot {
    UnitSnapshot::new(
        entity,
        team,
        Vec2::new(x, 0.0),
        6.0,
        Health::new(100.0).with_current(hp),
    )
}

/// Creates a minimal app with a fixed frame delta so timers are deterministic.
/// The first `update` initializes time (delta = 0).
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(TEST_FRAME));
    app
}

/// Test app with the whole combat layer registered.
pub fn create_combat_test_app() -> App {
    let mut app = create_test_app();
    app.add_plugins(crate::plugin);
    app.update();
    app
}

/// Advance by `count` frames.
pub fn tick_multiple(app: &mut App, count: usize) {
    for _ in 0..count {
        app.update();
    }
}

/// Assert how many entities match the filter.
pub fn assert_entity_count<F: QueryFilter>(app: &mut App, expected: usize) {
    let count = app
        .world_mut()
        .query_filtered::<Entity, F>()
        .iter(app.world())
        .count();
    assert_eq!(count, expected, "unexpected entity count");
}

/// Bare targetable unit with health and a footprint, no behavior.
pub fn spawn_test_target(world: &mut World, team: Team, x: f32, y: f32, hp: f32) -> Entity {
    world
        .spawn((
            team,
            Target,
            Health::new(hp),
            Body { radius: 6.0 },
            Transform::from_xyz(x, y, 0.0),
        ))
        .id()
}

/// Full archetype spawned through `spawn_unit` with the app's config and catalog.
pub fn spawn_test_unit(app: &mut App, kind: UnitKind, x: f32, y: f32) -> Entity {
    let world = app.world_mut();
    let config = world.resource::<CombatConfig>().clone();
    let catalog = world.resource::<AbilityCatalog>().clone();
    let entity = {
        let mut commands = world.commands();
        spawn_unit(&mut commands, kind, kind.default_team(), Vec2::new(x, y), &config, &catalog)
    };
    world.flush();
    entity
}
