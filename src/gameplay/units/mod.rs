//! Unit archetypes, their stats, and the spawn function that composes them.

pub mod gems;
mod movement;
pub mod spawn;

use std::time::Duration;

use bevy::prelude::*;

use crate::config::CombatConfig;
use crate::gameplay::abilities::{AbilityCatalog, ActionResolver, Loadout};
use crate::gameplay::behavior::ally::AllyBehavior;
use crate::gameplay::behavior::hostile::HostileBehavior;
use crate::gameplay::combat::{AttackBehavior, AttackConfig, ThreatTracker};
use crate::gameplay::status::Stunned;
use crate::gameplay::{Body, Bounty, CombatStats, Experience, Health, Mana, Target, Team};
use crate::{GameSet, simulation_running};

use self::gems::GemSlots;

pub use movement::ARRIVAL_TOLERANCE;

// === Constants ===

/// Mana regained per second by every unit with a mana pool.
pub const MANA_REGEN_PER_SECOND: f32 = 2.0;

// === Components ===

/// Straight-line movement speed (world units per second).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Movement {
    pub speed: f32,
}

/// Where a unit is walking to. Cleared on arrival.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Destination(pub Option<Vec2>);

/// A unit reached its destination this tick.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrived {
    pub unit: Entity,
}

// === Unit Kinds ===

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
#[reflect(Component)]
pub enum UnitKind {
    /// Player-controlled hero. Fights only on command.
    Avatar,
    /// AI ally that engages anything it sees.
    Minion,
    Grunt,
    Archer,
    Shaman,
    /// Stationary punching bag: health and a footprint, nothing else.
    TrainingDummy,
}

impl UnitKind {
    pub const ALL: &[Self] = &[
        Self::Avatar,
        Self::Minion,
        Self::Grunt,
        Self::Archer,
        Self::Shaman,
        Self::TrainingDummy,
    ];

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Avatar => "Avatar",
            Self::Minion => "Minion",
            Self::Grunt => "Grunt",
            Self::Archer => "Archer",
            Self::Shaman => "Shaman",
            Self::TrainingDummy => "Training Dummy",
        }
    }

    /// The side this kind normally fights for.
    #[must_use]
    pub const fn default_team(self) -> Team {
        match self {
            Self::Avatar | Self::Minion => Team::Player,
            Self::Grunt | Self::Archer | Self::Shaman | Self::TrainingDummy => Team::Enemy,
        }
    }

    #[must_use]
    pub const fn is_hostile(self) -> bool {
        matches!(self, Self::Grunt | Self::Archer | Self::Shaman)
    }
}

/// Stats for a unit kind. All values are compile-time constants.
#[derive(Debug, Clone, Copy)]
pub struct UnitStats {
    pub hp: f32,
    pub mana: f32,
    pub radius: f32,
    pub move_speed: f32,
    pub attack: Option<AttackConfig>,
    pub attack_power: f32,
    pub spell_power: f32,
    pub bounty: Option<u32>,
    pub abilities: &'static [&'static str],
}

#[must_use]
pub const fn unit_stats(kind: UnitKind) -> UnitStats {
    match kind {
        UnitKind::Avatar => UnitStats {
            hp: 200.0,
            mana: 100.0,
            radius: 8.0,
            move_speed: 90.0,
            attack: Some(AttackConfig::melee(14.0, Duration::from_millis(800))),
            attack_power: 10.0,
            spell_power: 12.0,
            bounty: None,
            abilities: &["mend", "war_cry"],
        },
        UnitKind::Minion => UnitStats {
            hp: 80.0,
            mana: 60.0,
            radius: 6.0,
            move_speed: 80.0,
            attack: Some(AttackConfig::melee(8.0, Duration::from_millis(1_000))),
            attack_power: 4.0,
            spell_power: 6.0,
            bounty: None,
            abilities: &["renew"],
        },
        UnitKind::Grunt => UnitStats {
            hp: 90.0,
            mana: 0.0,
            radius: 7.0,
            move_speed: 60.0,
            attack: Some(AttackConfig::melee(10.0, Duration::from_millis(1_200))),
            attack_power: 6.0,
            spell_power: 0.0,
            bounty: Some(10),
            abilities: &[],
        },
        UnitKind::Archer => UnitStats {
            hp: 60.0,
            mana: 0.0,
            radius: 6.0,
            move_speed: 55.0,
            attack: Some(AttackConfig::ranged(9.0, Duration::from_millis(1_500))),
            attack_power: 5.0,
            spell_power: 0.0,
            bounty: Some(12),
            abilities: &[],
        },
        UnitKind::Shaman => UnitStats {
            hp: 70.0,
            mana: 80.0,
            radius: 6.0,
            move_speed: 50.0,
            attack: Some(AttackConfig::ranged(6.0, Duration::from_millis(2_000))),
            attack_power: 3.0,
            spell_power: 10.0,
            bounty: Some(15),
            abilities: &["healing_circle", "nova"],
        },
        UnitKind::TrainingDummy => UnitStats {
            hp: 500.0,
            mana: 0.0,
            radius: 10.0,
            move_speed: 0.0,
            attack: None,
            attack_power: 0.0,
            spell_power: 0.0,
            bounty: None,
            abilities: &[],
        },
    }
}

/// Spawn a unit entity with every component its kind composes.
/// Single source of truth for the unit archetypes.
pub fn spawn_unit(
    commands: &mut Commands,
    kind: UnitKind,
    team: Team,
    position: Vec2,
    config: &CombatConfig,
    catalog: &AbilityCatalog,
) -> Entity {
    let stats = unit_stats(kind);
    let mut unit = commands.spawn((
        Name::new(format!("{team:?} {}", kind.display_name())),
        kind,
        team,
        Target,
        Health::new(stats.hp),
        Body {
            radius: stats.radius,
        },
        Transform::from_translation(position.extend(0.0)),
    ));

    if kind == UnitKind::TrainingDummy {
        return unit.id();
    }

    unit.insert((
        Movement {
            speed: stats.move_speed,
        },
        Destination::default(),
        CombatStats {
            attack_power: stats.attack_power,
            spell_power: stats.spell_power,
        },
        Mana::new(stats.mana),
        ActionResolver::new(),
        Loadout::from_catalog(catalog, stats.abilities),
    ));
    if let Some(attack) = stats.attack {
        unit.insert((attack, AttackBehavior::default()));
    }
    if let Some(bounty) = stats.bounty {
        unit.insert(Bounty(bounty));
    }

    match kind {
        UnitKind::Avatar => {
            unit.insert((AllyBehavior::commanded(), GemSlots::default(), Experience::default()));
        }
        UnitKind::Minion => {
            unit.insert((AllyBehavior::autonomous(), Experience::default()));
        }
        UnitKind::Grunt | UnitKind::Archer | UnitKind::Shaman => {
            unit.insert((ThreatTracker::new(config.threat), HostileBehavior::default()));
        }
        UnitKind::TrainingDummy => {}
    }

    unit.id()
}

// === Systems ===

/// Runs in `GameSet::Status`.
fn regenerate_mana(time: Res<Time>, mut pools: Query<(&mut Mana, &Health), Without<Stunned>>) {
    let amount = MANA_REGEN_PER_SECOND * time.delta_secs();
    for (mut mana, health) in &mut pools {
        if !health.is_defeated() && mana.current < mana.max {
            mana.restore(amount);
        }
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<UnitKind>()
        .register_type::<Movement>()
        .register_type::<Destination>()
        .register_type::<GemSlots>();
    app.add_message::<Arrived>();
    app.add_plugins(spawn::plugin);

    app.add_systems(
        Update,
        (
            regenerate_mana.in_set(GameSet::Status),
            movement::steer_units.in_set(GameSet::Movement),
        )
            .run_if(simulation_running),
    );
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::testing::{create_test_app, spawn_test_unit};

    fn create_spawn_test_app() -> App {
        let mut app = create_test_app();
        app.init_resource::<CombatConfig>();
        app.insert_resource(AbilityCatalog::builtin());
        app
    }

    #[test]
    fn training_dummy_is_only_combatable() {
        let mut app = create_spawn_test_app();
        let dummy = spawn_test_unit(&mut app, UnitKind::TrainingDummy, 0.0, 0.0);

        let entity = app.world().entity(dummy);
        assert!(entity.contains::<Health>());
        assert!(entity.contains::<Target>());
        assert!(!entity.contains::<ThreatTracker>());
        assert!(!entity.contains::<AttackBehavior>());
        assert!(!entity.contains::<Bounty>());
        assert!(!entity.contains::<Movement>());
    }

    #[test]
    fn hostiles_track_threat_and_pay_bounties() {
        let mut app = create_spawn_test_app();
        let grunt = spawn_test_unit(&mut app, UnitKind::Grunt, 0.0, 0.0);

        let entity = app.world().entity(grunt);
        assert!(entity.contains::<ThreatTracker>());
        assert!(entity.contains::<HostileBehavior>());
        assert!(entity.contains::<Bounty>());
        assert!(!entity.contains::<AllyBehavior>());
    }

    #[test]
    fn avatar_is_commandable_and_carries_gems() {
        let mut app = create_spawn_test_app();
        let avatar = spawn_test_unit(&mut app, UnitKind::Avatar, 0.0, 0.0);

        let entity = app.world().entity(avatar);
        assert!(entity.contains::<GemSlots>());
        assert!(entity.contains::<Experience>());
        assert!(!entity.get::<AllyBehavior>().unwrap().auto_engages());
        assert_eq!(entity.get::<Loadout>().unwrap().abilities.len(), 2);
    }
}
