//! Real-time combat decision layer: threat, attacks, abilities and unit behavior.

pub mod config;
pub mod gameplay;
pub mod prelude;
#[cfg(test)]
pub mod testing;

use bevy::prelude::*;

use crate::config::CombatConfig;

/// Whether the simulation is ticking.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SimulationState {
    /// Combat systems run every frame.
    #[default]
    Running,
    /// Combat systems are skipped; nothing decays or cools down.
    Paused,
}

/// Per-tick evaluation order. Chained: every set runs after the previous one.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSet {
    /// Status timers (stun) tick down.
    Status,
    /// Threat decay and proximity detection.
    Threat,
    /// State machine transitions.
    Behavior,
    /// Steering toward destinations and chase targets.
    Movement,
    /// Attack and ability execution, projectile flight.
    Combat,
    /// Effect application, threat and participation feedback.
    Damage,
    /// Rewards and deferred removal of defeated units.
    Cleanup,
}

/// Run condition shared by every combat system.
#[must_use]
pub fn simulation_running(state: Res<State<SimulationState>>) -> bool {
    *state.get() == SimulationState::Running
}

/// Registers the combat layer with default configuration.
/// Requires `StatesPlugin` (part of `DefaultPlugins`, added separately with `MinimalPlugins`).
pub fn plugin(app: &mut App) {
    app.init_state::<SimulationState>();
    app.init_resource::<CombatConfig>();
    app.configure_sets(
        Update,
        (
            GameSet::Status,
            GameSet::Threat,
            GameSet::Behavior,
            GameSet::Movement,
            GameSet::Combat,
            GameSet::Damage,
            GameSet::Cleanup,
        )
            .chain(),
    );

    gameplay::plugin(app);
}

/// Plugin wrapper for hosts that load their own [`CombatConfig`].
#[derive(Debug, Default)]
pub struct CombatPlugin {
    pub config: CombatConfig,
}

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        plugin(app);
        app.insert_resource(self.config.clone());
    }
}
