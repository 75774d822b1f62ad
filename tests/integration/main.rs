//! End-to-end tests that drive the whole combat layer through its public API.

mod skirmish_flows;
mod state_transitions;

use std::time::Duration;

use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use skirmish::prelude::*;

pub const FRAME: Duration = Duration::from_millis(100);

/// Headless app with the combat layer and a fixed frame delta.
pub fn create_skirmish_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
    app.add_plugins(skirmish::plugin);
    app.update();
    app
}

pub fn spawn(app: &mut App, kind: UnitKind, x: f32, y: f32) -> Entity {
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

pub fn position(app: &App, entity: Entity) -> Vec2 {
    app.world().get::<Transform>(entity).unwrap().translation.xy()
}

/// Runs frames until `done` holds. Panics after `max_frames`.
pub fn run_until(app: &mut App, max_frames: usize, mut done: impl FnMut(&App) -> bool) {
    for _ in 0..max_frames {
        if done(app) {
            return;
        }
        app.update();
    }
    assert!(done(app), "condition not met within {max_frames} frames");
}
