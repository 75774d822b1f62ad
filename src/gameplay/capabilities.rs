//! Capability contracts that units compose instead of inheriting.
//!
//! Core components (threat, attacks, abilities) are written against these traits
//! so they can run over world snapshots in the host or plain structs in tests.

use bevy::prelude::*;

use crate::gameplay::abilities::ScalingStat;
use crate::gameplay::behavior::{BehaviorEffect, Order};
use crate::gameplay::{CombatStats, DamageApplied, Health, Mana, Team};

/// Something with a circular footprint in the world.
pub trait Positioned {
    fn position(&self) -> Vec2;
    fn radius(&self) -> f32;

    fn center_distance_to<P: Positioned + ?Sized>(&self, other: &P) -> f32 {
        self.position().distance(other.position())
    }

    /// Gap between the two footprints. Zero when they overlap.
    fn surface_distance_to<P: Positioned + ?Sized>(&self, other: &P) -> f32 {
        (self.center_distance_to(other) - self.radius() - other.radius()).max(0.0)
    }
}

/// Something that has hit points and can be defeated.
pub trait Combatable {
    fn entity(&self) -> Entity;
    fn health(&self) -> &Health;

    fn is_defeated(&self) -> bool {
        self.health().is_defeated()
    }

    fn hp_fraction(&self) -> f32 {
        self.health().fraction()
    }
}

/// Mutable side of [`Combatable`]: damage and healing go through here.
pub trait Damageable: Combatable {
    fn health_mut(&mut self) -> &mut Health;

    fn take_damage(&mut self, amount: f32) -> DamageApplied {
        self.health_mut().apply_damage(amount)
    }

    fn restore_health(&mut self, amount: f32) -> f32 {
        self.health_mut().heal(amount)
    }
}

/// Owner of a mana pool and the stats abilities scale from.
pub trait GemOwner {
    fn mana(&self) -> &Mana;
    fn mana_mut(&mut self) -> &mut Mana;
    fn stat(&self, stat: ScalingStat) -> f32;

    fn try_spend(&mut self, cost: f32) -> bool {
        self.mana_mut().try_spend(cost)
    }
}

/// Player-pickable unit.
pub trait Selectable: Positioned {
    fn contains_point(&self, point: Vec2) -> bool {
        self.position().distance(point) <= self.radius()
    }
}

/// Takes player orders. Returns the effects the order resolves to.
pub trait Commandable {
    fn command(&mut self, order: Order) -> Vec<BehaviorEffect>;
}

// === Concrete views ===

/// Plain position + radius pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub position: Vec2,
    pub radius: f32,
}

impl Footprint {
    #[must_use]
    pub const fn new(position: Vec2, radius: f32) -> Self {
        Self { position, radius }
    }
}

impl Positioned for Footprint {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

/// Read-only copy of a unit, rebuilt every tick as a candidate for targeting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSnapshot {
    pub entity: Entity,
    pub team: Team,
    pub footprint: Footprint,
    pub health: Health,
}

impl UnitSnapshot {
    #[must_use]
    pub const fn new(entity: Entity, team: Team, position: Vec2, radius: f32, health: Health) -> Self {
        Self {
            entity,
            team,
            footprint: Footprint::new(position, radius),
            health,
        }
    }
}

impl Positioned for UnitSnapshot {
    fn position(&self) -> Vec2 {
        self.footprint.position
    }

    fn radius(&self) -> f32 {
        self.footprint.radius
    }
}

impl Combatable for UnitSnapshot {
    fn entity(&self) -> Entity {
        self.entity
    }

    fn health(&self) -> &Health {
        &self.health
    }
}

impl Selectable for UnitSnapshot {}

/// Topmost unit under `point`, preferring the one whose center is closest.
#[must_use]
pub fn pick_unit<S: Selectable + Combatable>(point: Vec2, units: &[S]) -> Option<Entity> {
    units
        .iter()
        .filter(|unit| !unit.is_defeated() && unit.contains_point(point))
        .min_by(|a, b| {
            a.position()
                .distance_squared(point)
                .total_cmp(&b.position().distance_squared(point))
        })
        .map(Combatable::entity)
}

/// Live unit with a mutable health borrow, used where damage lands.
#[derive(Debug)]
pub struct UnitView<'a> {
    pub entity: Entity,
    pub footprint: Footprint,
    pub health: &'a mut Health,
}

impl Positioned for UnitView<'_> {
    fn position(&self) -> Vec2 {
        self.footprint.position
    }

    fn radius(&self) -> f32 {
        self.footprint.radius
    }
}

impl Combatable for UnitView<'_> {
    fn entity(&self) -> Entity {
        self.entity
    }

    fn health(&self) -> &Health {
        self.health
    }
}

impl Damageable for UnitView<'_> {
    fn health_mut(&mut self) -> &mut Health {
        self.health
    }
}

/// Caster view handed to the action resolver: read-only health, mutable mana.
#[derive(Debug)]
pub struct CasterView<'a> {
    pub entity: Entity,
    pub footprint: Footprint,
    pub health: &'a Health,
    pub mana: &'a mut Mana,
    pub stats: CombatStats,
}

impl Positioned for CasterView<'_> {
    fn position(&self) -> Vec2 {
        self.footprint.position
    }

    fn radius(&self) -> f32 {
        self.footprint.radius
    }
}

impl Combatable for CasterView<'_> {
    fn entity(&self) -> Entity {
        self.entity
    }

    fn health(&self) -> &Health {
        self.health
    }
}

impl GemOwner for CasterView<'_> {
    fn mana(&self) -> &Mana {
        self.mana
    }

    fn mana_mut(&mut self) -> &mut Mana {
        self.mana
    }

    fn stat(&self, stat: ScalingStat) -> f32 {
        match stat {
            ScalingStat::AttackPower => self.stats.attack_power,
            ScalingStat::SpellPower => self.stats.spell_power,
            ScalingStat::MaxHealth => self.health.max,
            ScalingStat::MaxMana => self.mana.max,
        }
    }
}
