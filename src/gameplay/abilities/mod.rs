//! Ability definitions (pure data) and the per-unit action resolver.

pub mod effects;
pub mod resolver;

use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::{GameSet, simulation_running};

pub use resolver::{AbilityCast, ActionResolver, ResolverContext};

// === Data Model ===

/// Stable ability identifier, as written in data files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Reflect)]
#[serde(transparent)]
pub struct AbilityId(pub String);

impl From<&str> for AbilityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl std::fmt::Display for AbilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who an ability can be aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
#[serde(rename_all = "snake_case")]
pub enum TargetClass {
    #[serde(rename = "self")]
    SelfOnly,
    Ally,
    Enemy,
    AreaAllies,
    AreaEnemies,
}

impl TargetClass {
    #[must_use]
    pub const fn is_area(self) -> bool {
        matches!(self, Self::AreaAllies | Self::AreaEnemies)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
#[serde(rename_all = "snake_case")]
pub enum EffectClass {
    Heal,
    Damage,
    /// Scored like any other effect but has no implemented effect.
    Buff,
    /// Scored like any other effect but has no implemented effect.
    Debuff,
}

/// Owner stat an ability's power scales with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
#[serde(rename_all = "snake_case")]
pub enum ScalingStat {
    AttackPower,
    SpellPower,
    MaxHealth,
    MaxMana,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct Scaling {
    pub stat: ScalingStat,
    pub ratio: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCondition {
    AllyWounded,
    EnemyInRange,
    SelfWounded,
    Always,
}

/// Auto-cast condition. `threshold` is an HP fraction for the wounded variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct AutoTrigger {
    pub condition: TriggerCondition,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

const fn default_threshold() -> f32 {
    1.0
}

/// Pure data; the [`ActionResolver`] is its only interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
pub struct AbilityDefinition {
    pub id: AbilityId,
    #[serde(default)]
    pub cost: f32,
    #[serde(default)]
    pub cooldown_ms: u64,
    pub target: TargetClass,
    pub range: f32,
    pub effect: EffectClass,
    pub power: f32,
    #[serde(default)]
    pub scaling: Option<Scaling>,
    #[serde(default)]
    pub trigger: Option<AutoTrigger>,
    /// Radius of area effects around the anchor point.
    #[serde(default)]
    pub radius: f32,
}

impl AbilityDefinition {
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// HP fraction below which heals consider a unit wounded.
    #[must_use]
    pub fn wounded_threshold(&self) -> f32 {
        self.trigger.map_or(1.0, |trigger| trigger.threshold)
    }
}

// === Catalog ===

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "ability")]
    abilities: Vec<AbilityDefinition>,
}

/// Every ability known to the simulation, keyed by id. Spell gems resolve through here.
#[derive(Resource, Debug, Clone, Default)]
pub struct AbilityCatalog {
    definitions: Vec<AbilityDefinition>,
}

impl AbilityCatalog {
    /// Parses `[[ability]]` tables. Later duplicates replace earlier ones.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = toml::from_str(content)?;
        let mut catalog = Self::default();
        for definition in file.abilities {
            validate_definition(&definition)?;
            catalog.insert(definition);
        }
        Ok(catalog)
    }

    /// The abilities units spawn with.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for definition in builtin_definitions() {
            catalog.insert(definition);
        }
        catalog
    }

    pub fn insert(&mut self, definition: AbilityDefinition) {
        if let Some(existing) = self.definitions.iter_mut().find(|d| d.id == definition.id) {
            *existing = definition;
        } else {
            self.definitions.push(definition);
        }
    }

    #[must_use]
    pub fn get(&self, id: &AbilityId) -> Option<&AbilityDefinition> {
        self.definitions.iter().find(|d| &d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbilityDefinition> {
        self.definitions.iter()
    }
}

fn validate_definition(definition: &AbilityDefinition) -> Result<(), ConfigError> {
    let invalid = |field: &'static str, value: f32| ConfigError::Invalid {
        field,
        reason: format!("ability `{}` has {field} = {value}", definition.id),
    };
    if !definition.range.is_finite() || definition.range < 0.0 {
        return Err(invalid("range", definition.range));
    }
    if !definition.cost.is_finite() || definition.cost < 0.0 {
        return Err(invalid("cost", definition.cost));
    }
    if definition.target.is_area() && (definition.radius.is_nan() || definition.radius <= 0.0) {
        return Err(invalid("radius", definition.radius));
    }
    Ok(())
}

fn builtin_definitions() -> Vec<AbilityDefinition> {
    vec![
        AbilityDefinition {
            id: "mend".into(),
            cost: 10.0,
            cooldown_ms: 6_000,
            target: TargetClass::SelfOnly,
            range: 0.0,
            effect: EffectClass::Heal,
            power: 20.0,
            scaling: Some(Scaling {
                stat: ScalingStat::SpellPower,
                ratio: 0.5,
            }),
            trigger: Some(AutoTrigger {
                condition: TriggerCondition::SelfWounded,
                threshold: 0.5,
            }),
            radius: 0.0,
        },
        AbilityDefinition {
            id: "renew".into(),
            cost: 12.0,
            cooldown_ms: 4_000,
            target: TargetClass::Ally,
            range: 120.0,
            effect: EffectClass::Heal,
            power: 18.0,
            scaling: Some(Scaling {
                stat: ScalingStat::SpellPower,
                ratio: 0.6,
            }),
            trigger: Some(AutoTrigger {
                condition: TriggerCondition::AllyWounded,
                threshold: 0.7,
            }),
            radius: 0.0,
        },
        AbilityDefinition {
            id: "firebolt".into(),
            cost: 8.0,
            cooldown_ms: 3_000,
            target: TargetClass::Enemy,
            range: 150.0,
            effect: EffectClass::Damage,
            power: 14.0,
            scaling: Some(Scaling {
                stat: ScalingStat::SpellPower,
                ratio: 0.8,
            }),
            trigger: Some(AutoTrigger {
                condition: TriggerCondition::EnemyInRange,
                threshold: 1.0,
            }),
            radius: 0.0,
        },
        AbilityDefinition {
            id: "healing_circle".into(),
            cost: 25.0,
            cooldown_ms: 10_000,
            target: TargetClass::AreaAllies,
            range: 100.0,
            effect: EffectClass::Heal,
            power: 15.0,
            scaling: Some(Scaling {
                stat: ScalingStat::SpellPower,
                ratio: 0.4,
            }),
            trigger: Some(AutoTrigger {
                condition: TriggerCondition::AllyWounded,
                threshold: 0.6,
            }),
            radius: 60.0,
        },
        AbilityDefinition {
            id: "nova".into(),
            cost: 20.0,
            cooldown_ms: 8_000,
            target: TargetClass::AreaEnemies,
            range: 60.0,
            effect: EffectClass::Damage,
            power: 12.0,
            scaling: Some(Scaling {
                stat: ScalingStat::AttackPower,
                ratio: 0.5,
            }),
            trigger: None,
            radius: 50.0,
        },
        AbilityDefinition {
            id: "war_cry".into(),
            cost: 5.0,
            cooldown_ms: 15_000,
            target: TargetClass::SelfOnly,
            range: 80.0,
            effect: EffectClass::Buff,
            power: 0.0,
            scaling: None,
            trigger: Some(AutoTrigger {
                condition: TriggerCondition::EnemyInRange,
                threshold: 1.0,
            }),
            radius: 0.0,
        },
    ]
}

/// Abilities a unit can cast, in preference order for equal priorities.
#[derive(Component, Debug, Clone, Default)]
pub struct Loadout {
    pub abilities: Vec<AbilityDefinition>,
}

impl Loadout {
    /// Looks up `ids` in the catalog, skipping unknown ids.
    #[must_use]
    pub fn from_catalog(catalog: &AbilityCatalog, ids: &[&str]) -> Self {
        Self {
            abilities: ids
                .iter()
                .filter_map(|id| catalog.get(&AbilityId::from(*id)).cloned())
                .collect(),
        }
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.insert_resource(AbilityCatalog::builtin());

    effects::plugin(app);

    app.add_systems(
        Update,
        resolver::resolve_abilities
            .in_set(GameSet::Combat)
            .run_if(simulation_running),
    );
}
