//! Damage feedback: being hit raises threat on the attacker and records participation.

use bevy::prelude::*;

use crate::gameplay::abilities::effects::apply_ability_effects;
use crate::gameplay::combat::{CombatXpTracker, DamageDealt, ThreatTracker};
use crate::gameplay::Bounty;
use crate::{GameSet, simulation_running};

/// Runs in `GameSet::Damage`, after ability effects have landed.
fn propagate_damage(
    mut damage: MessageReader<DamageDealt>,
    mut trackers: Query<&mut ThreatTracker>,
    bounties: Query<(), With<Bounty>>,
    mut xp: ResMut<CombatXpTracker>,
) {
    for hit in damage.read() {
        let Some(source) = hit.source else {
            continue;
        };
        if let Ok(mut tracker) = trackers.get_mut(hit.target) {
            tracker.add_damage_threat(source, hit.amount);
        }
        if bounties.contains(hit.target) {
            xp.record_participation(hit.target, source);
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        propagate_damage
            .after(apply_ability_effects)
            .in_set(GameSet::Damage)
            .run_if(simulation_running),
    );
}
