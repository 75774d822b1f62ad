//! Per-unit ability selection. Every tick each eligible ability is scored against
//! the current snapshots and only the single highest-priority one executes.

use std::collections::HashMap;
use std::time::Duration;

use bevy::prelude::*;
use tracing::debug;

use crate::gameplay::abilities::effects::{AbilityEffect, CastTarget, EffectSink};
use crate::gameplay::abilities::{
    AbilityCatalog, AbilityDefinition, AbilityId, EffectClass, Loadout, TargetClass,
    TriggerCondition,
};
use crate::gameplay::capabilities::{
    CasterView, Combatable, Footprint, GemOwner, Positioned, UnitSnapshot,
};
use crate::gameplay::status::Stunned;
use crate::gameplay::units::gems::GemSlots;
use crate::gameplay::{Body, CombatStats, Health, Mana, Target, Team};

// === Constants ===

/// Priority of non-heal effects aimed at a single unit or at self.
const DEFAULT_PRIORITY: u32 = 10;

/// Heal priority per HP fraction missing.
const HEAL_PRIORITY_SCALE: f32 = 100.0;

/// Damage priority per HP fraction missing on the target.
const DAMAGE_PRIORITY_SCALE: f32 = 50.0;

/// Area heal priority per wounded ally in range.
const AREA_HEAL_PRIORITY_PER_WOUNDED: u32 = 20;

/// Area priority per unit in range (non-heal area-allies and all area-enemies).
const AREA_PRIORITY_PER_UNIT: u32 = 10;

// === Types ===

/// Units the resolver may aim at this tick. Neither list contains the owner.
#[derive(Debug)]
pub struct ResolverContext<'a, U> {
    pub allies: &'a [U],
    pub enemies: &'a [U],
    pub stunned: bool,
}

impl<'a, U> ResolverContext<'a, U> {
    #[must_use]
    pub const fn new(allies: &'a [U], enemies: &'a [U]) -> Self {
        Self {
            allies,
            enemies,
            stunned: false,
        }
    }

    #[must_use]
    pub const fn stunned(mut self, stunned: bool) -> Self {
        self.stunned = stunned;
        self
    }
}

/// The ability executed this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityCast {
    pub ability: AbilityId,
    pub target: CastTarget,
    pub priority: u32,
    pub power: f32,
}

#[derive(Debug)]
struct Candidate<'d> {
    ability: &'d AbilityDefinition,
    target: CastTarget,
    priority: u32,
}

/// Cooldown ledger plus the selection rules. One per casting unit.
#[derive(Component, Debug, Clone, Default)]
pub struct ActionResolver {
    cooldowns: HashMap<AbilityId, Duration>,
}

impl ActionResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cooldown_remaining(&self, id: &AbilityId) -> Option<Duration> {
        self.cooldowns.get(id).copied()
    }

    #[must_use]
    pub fn is_on_cooldown(&self, id: &AbilityId) -> bool {
        self.cooldowns.contains_key(id)
    }

    /// Counts every cooldown down, dropping the ones that finish.
    pub fn tick_cooldowns(&mut self, delta: Duration) {
        self.cooldowns.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(delta);
            !remaining.is_zero()
        });
    }

    /// Ticks cooldowns, then executes at most one ability.
    ///
    /// Returns the cast, or `None` when nothing was eligible, the owner is
    /// stunned, or the resource could not be spent at execution time.
    pub fn update<O, U, S>(
        &mut self,
        delta: Duration,
        owner: &mut O,
        context: &ResolverContext<'_, U>,
        abilities: &[AbilityDefinition],
        sink: &mut S,
    ) -> Option<AbilityCast>
    where
        O: GemOwner + Combatable + Positioned,
        U: Combatable + Positioned,
        S: EffectSink,
    {
        self.tick_cooldowns(delta);
        if context.stunned || owner.is_defeated() {
            return None;
        }

        let mut candidates: Vec<Candidate<'_>> = abilities
            .iter()
            .filter(|ability| !self.is_on_cooldown(&ability.id))
            .filter(|ability| owner.mana().can_afford(ability.cost))
            .filter_map(|ability| evaluate(ability, &*owner, context))
            .collect();
        // Stable: equal priorities keep loadout order.
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
        let best = candidates.into_iter().next()?;

        self.execute(best, owner, sink)
    }

    fn execute<O, S>(&mut self, candidate: Candidate<'_>, owner: &mut O, sink: &mut S) -> Option<AbilityCast>
    where
        O: GemOwner + Combatable + Positioned,
        S: EffectSink,
    {
        let ability = candidate.ability;
        if !owner.try_spend(ability.cost) {
            return None;
        }

        let scaled = ability
            .scaling
            .map_or(0.0, |scaling| owner.stat(scaling.stat) * scaling.ratio);
        let power = (ability.power + scaled).floor().max(0.0);

        sink.dispatch(AbilityEffect {
            source: owner.entity(),
            ability: ability.id.clone(),
            target_class: ability.target,
            effect: ability.effect,
            target: candidate.target,
            power,
        });

        if !ability.cooldown().is_zero() {
            self.cooldowns.insert(ability.id.clone(), ability.cooldown());
        }

        debug!(
            caster = ?owner.entity(),
            ability = %ability.id,
            priority = candidate.priority,
            power,
            "ability cast"
        );

        Some(AbilityCast {
            ability: ability.id.clone(),
            target: candidate.target,
            priority: candidate.priority,
            power,
        })
    }
}

// === Scoring ===

/// `floor((1 - current / max) * scale)`, evaluated as `(max - current) * scale / max`
/// in f64 so whole-number HP lands on the exact integer (69/100 scores 31).
fn missing_fraction_priority(health: &Health, scale: f32) -> u32 {
    let max = f64::from(health.max);
    if max <= 0.0 {
        return 0;
    }
    let missing = (max - f64::from(health.current)).clamp(0.0, max);
    (missing * f64::from(scale) / max).floor() as u32
}

fn in_range<'u, O, U>(owner: &O, units: &'u [U], range: f32) -> impl Iterator<Item = &'u U>
where
    O: Positioned,
    U: Combatable + Positioned,
{
    let origin = Footprint::new(owner.position(), owner.radius());
    units
        .iter()
        .filter(move |unit| !unit.is_defeated() && origin.surface_distance_to(*unit) <= range)
}

fn is_wounded<U: Combatable>(unit: &U, threshold: f32) -> bool {
    unit.health().current > 0.0 && unit.hp_fraction() < threshold
}

/// Auto-trigger gate for non-heal abilities.
fn trigger_allows<O, U>(ability: &AbilityDefinition, owner: &O, context: &ResolverContext<'_, U>) -> bool
where
    O: Combatable + Positioned,
    U: Combatable + Positioned,
{
    let Some(trigger) = ability.trigger else {
        return true;
    };
    match trigger.condition {
        TriggerCondition::Always => true,
        TriggerCondition::SelfWounded => owner.hp_fraction() < trigger.threshold,
        TriggerCondition::EnemyInRange => in_range(owner, context.enemies, ability.range)
            .next()
            .is_some(),
        TriggerCondition::AllyWounded => in_range(owner, context.allies, ability.range)
            .any(|ally| is_wounded(ally, trigger.threshold)),
    }
}

/// Target and priority for one ability, or `None` when it is not eligible.
fn evaluate<'d, O, U>(
    ability: &'d AbilityDefinition,
    owner: &O,
    context: &ResolverContext<'_, U>,
) -> Option<Candidate<'d>>
where
    O: Combatable + Positioned,
    U: Combatable + Positioned,
{
    let is_heal = ability.effect == EffectClass::Heal;
    let threshold = ability.wounded_threshold();
    if !is_heal && !trigger_allows(ability, owner, context) {
        return None;
    }

    let (target, priority) = match ability.target {
        TargetClass::SelfOnly => {
            if is_heal {
                let fraction = owner.hp_fraction();
                if fraction >= threshold {
                    return None;
                }
                (
                    CastTarget::Unit(owner.entity()),
                    missing_fraction_priority(owner.health(), HEAL_PRIORITY_SCALE),
                )
            } else {
                (CastTarget::Unit(owner.entity()), DEFAULT_PRIORITY)
            }
        }
        TargetClass::Ally => {
            let mut allies = in_range(owner, context.allies, ability.range);
            if is_heal {
                let patient = allies
                    .filter(|ally| is_wounded(*ally, threshold))
                    .fold(None::<&U>, |best, ally| match best {
                        Some(current) if current.hp_fraction() <= ally.hp_fraction() => Some(current),
                        _ => Some(ally),
                    })?;
                (
                    CastTarget::Unit(patient.entity()),
                    missing_fraction_priority(patient.health(), HEAL_PRIORITY_SCALE),
                )
            } else {
                let ally = allies.next()?;
                (CastTarget::Unit(ally.entity()), DEFAULT_PRIORITY)
            }
        }
        TargetClass::Enemy => {
            let mut enemies = in_range(owner, context.enemies, ability.range);
            if ability.effect == EffectClass::Damage {
                let victim = enemies.fold(None::<&U>, |best, enemy| match best {
                    Some(current) if current.health().current <= enemy.health().current => {
                        Some(current)
                    }
                    _ => Some(enemy),
                })?;
                (
                    CastTarget::Unit(victim.entity()),
                    missing_fraction_priority(victim.health(), DAMAGE_PRIORITY_SCALE),
                )
            } else {
                let enemy = enemies.next()?;
                (CastTarget::Unit(enemy.entity()), DEFAULT_PRIORITY)
            }
        }
        TargetClass::AreaAllies => {
            let allies: Vec<&U> = in_range(owner, context.allies, ability.range).collect();
            let anchor = allies.first()?;
            let priority = if is_heal {
                allies.iter().filter(|ally| is_wounded(**ally, threshold)).count() as u32
                    * AREA_HEAL_PRIORITY_PER_WOUNDED
            } else {
                allies.len() as u32 * AREA_PRIORITY_PER_UNIT
            };
            (
                CastTarget::Area {
                    anchor: anchor.position(),
                    radius: ability.radius,
                },
                priority,
            )
        }
        TargetClass::AreaEnemies => {
            let enemies: Vec<&U> = in_range(owner, context.enemies, ability.range).collect();
            let anchor = enemies.first()?;
            (
                CastTarget::Area {
                    anchor: anchor.position(),
                    radius: ability.radius,
                },
                enemies.len() as u32 * AREA_PRIORITY_PER_UNIT,
            )
        }
    };

    Some(Candidate {
        ability,
        target,
        priority,
    })
}

// === Systems ===

/// Runs every caster's resolver against fresh snapshots of all targetable units.
/// Runs in `GameSet::Combat`.
pub(crate) fn resolve_abilities(
    time: Res<Time>,
    catalog: Res<AbilityCatalog>,
    mut casters: Query<(
        Entity,
        &mut ActionResolver,
        &mut Mana,
        &Health,
        &Team,
        &Transform,
        &Body,
        &Loadout,
        Option<&CombatStats>,
        Option<&GemSlots>,
        Has<Stunned>,
    )>,
    units: Query<(Entity, &Team, &Health, &Transform, &Body), With<Target>>,
    mut effects: MessageWriter<AbilityEffect>,
) {
    let snapshots: Vec<UnitSnapshot> = units
        .iter()
        .map(|(entity, team, health, transform, body)| {
            UnitSnapshot::new(entity, *team, transform.translation.xy(), body.radius, *health)
        })
        .collect();

    for (entity, mut resolver, mut mana, health, team, transform, body, loadout, stats, gems, stunned) in
        &mut casters
    {
        let mut abilities = loadout.abilities.clone();
        if let Some(gems) = gems {
            abilities.extend(gems.granted_abilities(&catalog).cloned());
        }

        let (allies, enemies): (Vec<UnitSnapshot>, Vec<UnitSnapshot>) = snapshots
            .iter()
            .filter(|unit| unit.entity != entity)
            .partition(|unit| unit.team == *team);

        let mut caster = CasterView {
            entity,
            footprint: Footprint::new(transform.translation.xy(), body.radius),
            health,
            mana: &mut *mana,
            stats: stats.copied().unwrap_or_default(),
        };
        let context = ResolverContext::new(&allies, &enemies).stunned(stunned);
        resolver.update(time.delta(), &mut caster, &context, &abilities, &mut effects);
    }
}
