//! Common imports for hosts embedding the combat layer.

pub use bevy::prelude::*;

pub use crate::config::{CombatConfig, ConfigError, ThreatConfig};
pub use crate::gameplay::abilities::{AbilityCatalog, AbilityDefinition, AbilityId, Loadout};
pub use crate::gameplay::behavior::ally::{AllyBehavior, AllyState};
pub use crate::gameplay::behavior::hostile::{HostileBehavior, HostileState};
pub use crate::gameplay::behavior::{Order, UnitCommand};
pub use crate::gameplay::combat::{
    AttackBehavior, AttackConfig, DamageDealt, HealApplied, ThreatTracker, UnitDefeated, XpAwarded,
};
pub use crate::gameplay::status::Stunned;
pub use crate::gameplay::units::gems::{Gem, GemSlots};
pub use crate::gameplay::units::spawn::SpawnPack;
pub use crate::gameplay::units::{UnitKind, spawn_unit};
pub use crate::gameplay::{Body, Bounty, Experience, Health, Mana, Target, Team};
pub use crate::{CombatPlugin, GameSet, SimulationState};
