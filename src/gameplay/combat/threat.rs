//! Threat ledger: who a hostile wants to fight, and how badly.
//!
//! Entries appear by proximity (aggro radius) or by direct injection (being hit),
//! decay over time, and are dropped once their target is defeated, vanishes,
//! runs past the leash radius, or decays to zero.

use std::time::Duration;

use bevy::prelude::*;
use tracing::debug;

use crate::config::{CombatConfig, ThreatConfig};
use crate::gameplay::capabilities::{Combatable, Positioned, UnitSnapshot};
use crate::gameplay::{Body, Health, Target, Team};
use crate::{GameSet, simulation_running};

/// One tracked target.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ThreatEntry {
    pub target: Entity,
    pub value: f32,
    /// Tracker clock at the last damage-sourced threat, if any.
    pub last_damage: Option<Duration>,
}

/// Why an entry left the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ClearReason {
    Defeated,
    Leashed,
    Decayed,
    /// The target was not among this tick's candidates (despawned or switched sides).
    Vanished,
}

/// Fired exactly once per entry removed by [`ThreatTracker::update`].
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreatCleared {
    pub owner: Entity,
    pub target: Entity,
    pub reason: ClearReason,
}

/// Per-hostile threat ledger.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ThreatTracker {
    config: ThreatConfig,
    /// Insertion order; ties in [`highest_threat`](Self::highest_threat) go to the oldest entry.
    entries: Vec<ThreatEntry>,
    clock: Duration,
}

impl Default for ThreatTracker {
    fn default() -> Self {
        Self::new(ThreatConfig::default())
    }
}

impl ThreatTracker {
    #[must_use]
    pub const fn new(config: ThreatConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            clock: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ThreatConfig {
        &self.config
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn contains(&self, target: Entity) -> bool {
        self.entries.iter().any(|entry| entry.target == target)
    }

    #[must_use]
    pub fn threat_of(&self, target: Entity) -> Option<f32> {
        self.entry(target).map(|entry| entry.value)
    }

    #[must_use]
    pub fn entry(&self, target: Entity) -> Option<&ThreatEntry> {
        self.entries.iter().find(|entry| entry.target == target)
    }

    /// Target with the most threat. First inserted wins ties.
    ///
    /// A linear scan over a handful of entries; no cached ordering is kept.
    #[must_use]
    pub fn highest_threat(&self) -> Option<Entity> {
        self.entries
            .iter()
            .fold(None::<&ThreatEntry>, |best, entry| match best {
                Some(current) if current.value >= entry.value => Some(current),
                _ => Some(entry),
            })
            .map(|entry| entry.target)
    }

    /// Entries by descending threat, stable on insertion order.
    #[must_use]
    pub fn ranked(&self) -> Vec<ThreatEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
        ranked
    }

    /// Adds `amount` to the target's entry, creating it if needed.
    /// Non-positive and non-finite amounts are ignored.
    pub fn add_threat(&mut self, target: Entity, amount: f32) {
        self.add(target, amount, false);
    }

    /// Threat from being hit: `damage` scaled by the configured multiplier.
    pub fn add_damage_threat(&mut self, target: Entity, damage: f32) {
        self.add(target, damage * self.config.damage_multiplier, true);
    }

    fn add(&mut self, target: Entity, amount: f32, from_damage: bool) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        let clock = self.clock;
        let last_damage = from_damage.then_some(clock);
        match self.entries.iter_mut().find(|entry| entry.target == target) {
            Some(entry) => {
                entry.value += amount;
                if from_damage {
                    entry.last_damage = last_damage;
                }
            }
            None => self.entries.push(ThreatEntry {
                target,
                value: amount,
                last_damage,
            }),
        }
    }

    /// Forgets everything without firing notifications.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Detection, decay, then the removal sweep.
    ///
    /// `candidates` is this tick's snapshot of potential targets. Returns one
    /// [`ThreatCleared`] per removed entry.
    pub fn update<O, C>(&mut self, delta: Duration, owner: &O, candidates: &[C]) -> Vec<ThreatCleared>
    where
        O: Combatable + Positioned,
        C: Combatable + Positioned,
    {
        self.clock += delta;
        let aggro = self.config.aggro_radius;
        let leash = self.config.leash_radius();

        for candidate in candidates {
            if candidate.entity() == owner.entity()
                || candidate.is_defeated()
                || self.contains(candidate.entity())
                || owner.center_distance_to(candidate) > aggro
            {
                continue;
            }
            self.entries.push(ThreatEntry {
                target: candidate.entity(),
                value: self.config.base_threat,
                last_damage: None,
            });
        }

        let decay = self.config.decay_per_second * delta.as_secs_f32();
        for entry in &mut self.entries {
            entry.value -= decay;
        }

        let mut cleared = Vec::new();
        self.entries.retain(|entry| {
            let reason = match candidates.iter().find(|c| c.entity() == entry.target) {
                None => Some(ClearReason::Vanished),
                Some(target) if target.is_defeated() => Some(ClearReason::Defeated),
                Some(target) if owner.center_distance_to(target) > leash => Some(ClearReason::Leashed),
                Some(_) if entry.value <= 0.0 => Some(ClearReason::Decayed),
                Some(_) => None,
            };
            if let Some(reason) = reason {
                cleared.push(ThreatCleared {
                    owner: owner.entity(),
                    target: entry.target,
                    reason,
                });
            }
            reason.is_none()
        });

        if !cleared.is_empty() {
            debug!(owner = ?owner.entity(), cleared = cleared.len(), "threat cleared");
        }
        cleared
    }
}

// === Systems ===

/// Ticks every tracker against the opposing side and publishes removals.
/// Runs in `GameSet::Threat`.
fn update_threat(
    time: Res<Time>,
    mut trackers: Query<(Entity, &mut ThreatTracker, &Team, &Health, &Transform, &Body)>,
    units: Query<(Entity, &Team, &Health, &Transform, &Body), With<Target>>,
    mut cleared: MessageWriter<ThreatCleared>,
) {
    let snapshots: Vec<UnitSnapshot> = units
        .iter()
        .map(|(entity, team, health, transform, body)| {
            UnitSnapshot::new(entity, *team, transform.translation.xy(), body.radius, *health)
        })
        .collect();

    for (entity, mut tracker, team, health, transform, body) in &mut trackers {
        let owner = UnitSnapshot::new(entity, *team, transform.translation.xy(), body.radius, *health);
        let candidates: Vec<UnitSnapshot> = snapshots
            .iter()
            .filter(|unit| unit.team != *team)
            .copied()
            .collect();
        cleared.write_batch(tracker.update(time.delta(), &owner, &candidates));
    }
}

/// Keeps tracker tunables in sync when the config resource is replaced.
fn sync_threat_config(config: Res<CombatConfig>, mut trackers: Query<&mut ThreatTracker>) {
    if !config.is_changed() {
        return;
    }
    for mut tracker in &mut trackers {
        if tracker.config != config.threat {
            tracker.config = config.threat;
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    app.register_type::<ThreatTracker>();
    app.add_message::<ThreatCleared>();
    app.add_systems(
        Update,
        (sync_threat_config, update_threat)
            .chain()
            .in_set(GameSet::Threat)
            .run_if(simulation_running),
    );
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::testing::{create_test_app, spawn_test_target};

    fn create_threat_test_app() -> App {
        let mut app = create_test_app();
        app.init_resource::<CombatConfig>();
        app.add_message::<ThreatCleared>();
        app.add_systems(Update, (sync_threat_config, update_threat).chain());
        app.update();
        app
    }

    fn spawn_tracker(world: &mut World, x: f32) -> Entity {
        let hostile = spawn_test_target(world, Team::Enemy, x, 0.0, 100.0);
        world.entity_mut(hostile).insert(ThreatTracker::default());
        hostile
    }

    #[test]
    fn tracker_detects_only_the_opposing_side() {
        let mut app = create_threat_test_app();
        let world = app.world_mut();
        let hostile = spawn_tracker(world, 0.0);
        let player = spawn_test_target(world, Team::Player, 50.0, 0.0, 100.0);
        let other_hostile = spawn_test_target(world, Team::Enemy, 20.0, 0.0, 100.0);

        app.update();

        let tracker = app.world().get::<ThreatTracker>(hostile).unwrap();
        assert!(tracker.contains(player));
        assert!(!tracker.contains(other_hostile));
        assert_eq!(tracker.highest_threat(), Some(player));
    }

    #[test]
    fn despawned_target_publishes_vanished() {
        let mut app = create_threat_test_app();
        let world = app.world_mut();
        let hostile = spawn_tracker(world, 0.0);
        let player = spawn_test_target(world, Team::Player, 50.0, 0.0, 100.0);
        app.update();

        app.world_mut().despawn(player);
        app.update();

        let messages = app.world().resource::<Messages<ThreatCleared>>();
        let cleared: Vec<ThreatCleared> = messages.iter_current_update_messages().copied().collect();
        assert_eq!(
            cleared,
            vec![ThreatCleared {
                owner: hostile,
                target: player,
                reason: ClearReason::Vanished,
            }]
        );
    }

    #[test]
    fn replacing_config_updates_trackers() {
        let mut app = create_threat_test_app();
        let hostile = spawn_tracker(app.world_mut(), 0.0);
        app.update();

        app.world_mut().resource_mut::<CombatConfig>().threat.aggro_radius = 20.0;
        app.update();

        let tracker = app.world().get::<ThreatTracker>(hostile).unwrap();
        assert_eq!(tracker.config().aggro_radius, 20.0);
    }
}
