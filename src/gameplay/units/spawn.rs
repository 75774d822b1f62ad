//! Pack spawning: a group of one unit kind scattered around a point.

use bevy::prelude::*;
use rand::Rng;
use tracing::info;

use super::{UnitKind, spawn_unit, unit_stats};
use crate::config::CombatConfig;
use crate::gameplay::Team;
use crate::gameplay::abilities::AbilityCatalog;
use crate::{GameSet, simulation_running};

// === Constants ===

/// Upper bound on pack size per request.
pub const MAX_PACK_SIZE: u32 = 32;

// === Messages ===

/// Request to spawn `count` units of `kind` within `spread` of `center`.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct SpawnPack {
    pub kind: UnitKind,
    pub team: Team,
    pub count: u32,
    pub center: Vec2,
    pub spread: f32,
}

impl SpawnPack {
    /// A pack fighting for the kind's usual side.
    #[must_use]
    pub const fn new(kind: UnitKind, count: u32, center: Vec2, spread: f32) -> Self {
        Self {
            kind,
            team: kind.default_team(),
            count,
            center,
            spread,
        }
    }
}

// === Pure Functions ===

/// `count` points uniformly inside the disc of radius `spread` around `center`.
/// A non-positive spread stacks everyone on the center.
pub fn scatter(center: Vec2, spread: f32, count: u32, rng: &mut impl Rng) -> Vec<Vec2> {
    (0..count)
        .map(|_| {
            if spread <= 0.0 {
                return center;
            }
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            let distance = spread * rng.random::<f32>().sqrt();
            center + Vec2::from_angle(angle) * distance
        })
        .collect()
}

/// Spawns one pack and returns the new entities.
pub fn spawn_pack(
    commands: &mut Commands,
    pack: &SpawnPack,
    config: &CombatConfig,
    catalog: &AbilityCatalog,
) -> Vec<Entity> {
    let count = pack.count.min(MAX_PACK_SIZE);
    // Keep footprints from starting fully stacked.
    let spread = pack.spread.max(unit_stats(pack.kind).radius * 2.0);
    scatter(pack.center, spread, count, &mut rand::rng())
        .into_iter()
        .map(|position| spawn_unit(commands, pack.kind, pack.team, position, config, catalog))
        .collect()
}

// === Systems ===

/// Spawns every requested pack. Runs before `GameSet::Status`.
fn spawn_requested_packs(
    mut requests: MessageReader<SpawnPack>,
    config: Res<CombatConfig>,
    catalog: Res<AbilityCatalog>,
    mut commands: Commands,
) {
    for pack in requests.read() {
        let spawned = spawn_pack(&mut commands, pack, &config, &catalog);
        info!(kind = pack.kind.display_name(), team = ?pack.team, count = spawned.len(), "pack spawned");
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.add_message::<SpawnPack>();
    app.add_systems(
        Update,
        spawn_requested_packs
            .before(GameSet::Status)
            .run_if(simulation_running),
    );
}
