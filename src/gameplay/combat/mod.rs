//! Combat: threat, attacks, damage feedback, rewards and removal of the defeated.

pub mod attack;
pub mod damage;
pub mod death;
pub mod threat;
pub mod xp;

use bevy::prelude::*;

use crate::config::CombatConfig;
use crate::gameplay::Team;

pub use attack::{AttackBehavior, AttackConfig, AttackKind, AttackOutcome, DeferredDamage, Projectile, Strike};
pub use threat::{ClearReason, ThreatCleared, ThreatTracker};
pub use xp::{CombatXpTracker, XpAwarded};

// === Messages ===

/// Damage landed on a unit. Consumed by threat, rewards and presentation.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct DamageDealt {
    pub source: Option<Entity>,
    pub target: Entity,
    pub amount: f32,
    /// Where the target stood when hit.
    pub position: Vec2,
    /// This hit took the target to zero.
    pub defeated: bool,
}

impl DamageDealt {
    #[must_use]
    pub const fn from_strike(strike: &Strike, position: Vec2) -> Self {
        Self {
            source: Some(strike.attacker),
            target: strike.target,
            amount: strike.applied.dealt,
            position,
            defeated: strike.applied.defeated_now,
        }
    }
}

/// HP restored to a unit.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct HealApplied {
    pub source: Entity,
    pub target: Entity,
    pub amount: f32,
    pub position: Vec2,
}

/// Published once per defeated unit, right before it is despawned.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct UnitDefeated {
    pub unit: Entity,
    pub team: Team,
    pub position: Vec2,
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.add_message::<DamageDealt>()
        .add_message::<HealApplied>()
        .add_message::<UnitDefeated>()
        .add_message::<XpAwarded>();

    let base_reward = app
        .world()
        .get_resource::<CombatConfig>()
        .map_or(crate::config::DEFAULT_BASE_XP_REWARD, |config| config.base_xp_reward);
    app.insert_resource(CombatXpTracker::new(base_reward));

    app.add_plugins((threat::plugin, attack::plugin, damage::plugin, death::plugin));
}
