//! Ability effect dispatch. The resolver decides; this module lands heals and damage.

use bevy::prelude::*;
use tracing::trace;

use crate::gameplay::abilities::{AbilityId, EffectClass, TargetClass};
use crate::gameplay::capabilities::{Damageable, Footprint, UnitView};
use crate::gameplay::combat::{DamageDealt, HealApplied};
use crate::gameplay::{Body, DamageApplied, Health, Team};
use crate::{GameSet, simulation_running};

/// Where an ability lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CastTarget {
    Unit(Entity),
    /// Everything of the affected side within `radius` of `anchor`.
    Area { anchor: Vec2, radius: f32 },
}

/// A resolved ability, ready to be applied by whoever owns the units.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct AbilityEffect {
    pub source: Entity,
    pub ability: AbilityId,
    pub target_class: TargetClass,
    pub effect: EffectClass,
    pub target: CastTarget,
    pub power: f32,
}

/// Receiver of resolved ability effects.
pub trait EffectSink {
    fn dispatch(&mut self, effect: AbilityEffect);
}

impl EffectSink for Vec<AbilityEffect> {
    fn dispatch(&mut self, effect: AbilityEffect) {
        self.push(effect);
    }
}

impl EffectSink for MessageWriter<'_, AbilityEffect> {
    fn dispatch(&mut self, effect: AbilityEffect) {
        self.write(effect);
    }
}

/// What a single effect did to a single unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectApplied {
    Healed(f32),
    Damaged(DamageApplied),
    /// Buff/debuff, or a target that was already defeated.
    Ignored,
}

/// Applies one effect of `power` to `target`. Defeated targets are left alone.
pub fn apply_effect<T: Damageable>(effect: EffectClass, power: f32, target: &mut T) -> EffectApplied {
    if target.is_defeated() {
        return EffectApplied::Ignored;
    }
    match effect {
        EffectClass::Heal => EffectApplied::Healed(target.restore_health(power)),
        EffectClass::Damage => EffectApplied::Damaged(target.take_damage(power)),
        EffectClass::Buff | EffectClass::Debuff => EffectApplied::Ignored,
    }
}

/// Lands queued ability effects and reports heals/damage for presentation.
/// Runs in `GameSet::Damage`.
pub(crate) fn apply_ability_effects(
    mut effects: MessageReader<AbilityEffect>,
    mut units: Query<(Entity, &Team, &mut Health, &Transform, &Body)>,
    mut damage_dealt: MessageWriter<DamageDealt>,
    mut heals: MessageWriter<HealApplied>,
) {
    for effect in effects.read() {
        if matches!(effect.effect, EffectClass::Buff | EffectClass::Debuff) {
            trace!(ability = %effect.ability, "buff/debuff effects have no implementation");
            continue;
        }

        let recipients: Vec<Entity> = match effect.target {
            CastTarget::Unit(entity) => vec![entity],
            CastTarget::Area { anchor, radius } => {
                let Ok((_, source_team, ..)) = units.get(effect.source) else {
                    continue;
                };
                let side = match effect.target_class {
                    TargetClass::AreaEnemies | TargetClass::Enemy => source_team.opposing(),
                    _ => *source_team,
                };
                units
                    .iter()
                    .filter(|(_, team, health, transform, _)| {
                        **team == side
                            && !health.is_defeated()
                            && transform.translation.xy().distance(anchor) <= radius
                    })
                    .map(|(entity, ..)| entity)
                    .collect()
            }
        };

        for recipient in recipients {
            let Ok((entity, _, mut health, transform, body)) = units.get_mut(recipient) else {
                continue;
            };
            let position = transform.translation.xy();
            let mut view = UnitView {
                entity,
                footprint: Footprint::new(position, body.radius),
                health: &mut *health,
            };
            match apply_effect(effect.effect, effect.power, &mut view) {
                EffectApplied::Healed(amount) if amount > 0.0 => {
                    heals.write(HealApplied {
                        source: effect.source,
                        target: entity,
                        amount,
                        position,
                    });
                }
                EffectApplied::Damaged(applied) if applied.dealt > 0.0 || applied.defeated_now => {
                    damage_dealt.write(DamageDealt {
                        source: Some(effect.source),
                        target: entity,
                        amount: applied.dealt,
                        position,
                        defeated: applied.defeated_now,
                    });
                }
                _ => {}
            }
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    app.add_message::<AbilityEffect>();
    app.add_systems(
        Update,
        apply_ability_effects
            .in_set(GameSet::Damage)
            .run_if(simulation_running),
    );
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::testing::{create_test_app, spawn_test_target};
    use pretty_assertions::assert_eq;

    fn create_effect_test_app() -> App {
        let mut app = create_test_app();
        app.add_message::<AbilityEffect>()
            .add_message::<DamageDealt>()
            .add_message::<HealApplied>();
        app.add_systems(Update, apply_ability_effects);
        app
    }

    fn send(app: &mut App, effect: AbilityEffect) {
        app.world_mut()
            .resource_mut::<Messages<AbilityEffect>>()
            .write(effect);
    }

    #[test]
    fn area_heal_only_touches_allies_in_radius() {
        let mut app = create_effect_test_app();
        let world = app.world_mut();
        let caster = spawn_test_target(world, Team::Player, 0.0, 0.0, 100.0);
        let near_ally = spawn_test_target(world, Team::Player, 30.0, 0.0, 100.0);
        let far_ally = spawn_test_target(world, Team::Player, 300.0, 0.0, 100.0);
        let enemy = spawn_test_target(world, Team::Enemy, 20.0, 0.0, 100.0);
        for entity in [near_ally, far_ally, enemy] {
            world.get_mut::<Health>(entity).unwrap().current = 40.0;
        }

        send(
            &mut app,
            AbilityEffect {
                source: caster,
                ability: "healing_circle".into(),
                target_class: TargetClass::AreaAllies,
                effect: EffectClass::Heal,
                target: CastTarget::Area {
                    anchor: Vec2::new(30.0, 0.0),
                    radius: 50.0,
                },
                power: 25.0,
            },
        );
        app.update();

        let hp = |app: &App, e: Entity| app.world().get::<Health>(e).unwrap().current;
        assert_eq!(hp(&app, near_ally), 65.0);
        assert_eq!(hp(&app, far_ally), 40.0);
        assert_eq!(hp(&app, enemy), 40.0);

        let heals = app.world().resource::<Messages<HealApplied>>();
        assert_eq!(heals.len(), 1);
    }

    #[test]
    fn unit_damage_emits_damage_notification() {
        let mut app = create_effect_test_app();
        let world = app.world_mut();
        let caster = spawn_test_target(world, Team::Player, 0.0, 0.0, 100.0);
        let enemy = spawn_test_target(world, Team::Enemy, 50.0, 10.0, 100.0);

        send(
            &mut app,
            AbilityEffect {
                source: caster,
                ability: "firebolt".into(),
                target_class: TargetClass::Enemy,
                effect: EffectClass::Damage,
                target: CastTarget::Unit(enemy),
                power: 30.0,
            },
        );
        app.update();

        assert_eq!(app.world().get::<Health>(enemy).unwrap().current, 70.0);
        let messages = app.world().resource::<Messages<DamageDealt>>();
        let dealt: Vec<_> = messages.iter_current_update_messages().copied().collect();
        assert_eq!(
            dealt,
            vec![DamageDealt {
                source: Some(caster),
                target: enemy,
                amount: 30.0,
                position: Vec2::new(50.0, 10.0),
                defeated: false,
            }]
        );
    }
}
