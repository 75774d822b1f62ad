//! Attack mechanics: engagement, cooldowns, melee strikes and deferred ranged damage.

use std::time::Duration;

use bevy::prelude::*;
use tracing::{debug, trace};

use crate::config::CombatConfig;
use crate::gameplay::capabilities::{Combatable, Damageable, Footprint, Positioned, UnitView};
use crate::gameplay::combat::DamageDealt;
use crate::gameplay::status::Stunned;
use crate::gameplay::units::gems::{AttackModifiers, GemSlots};
use crate::gameplay::{Body, DamageApplied, Health, Target};
use crate::{GameSet, simulation_running};

// === Constants ===

/// Default reach (surface gap) for melee attacks.
pub const MELEE_REACH: f32 = 8.0;

/// Default reach (surface gap) for ranged attacks.
pub const RANGED_REACH: f32 = 140.0;

// === Components ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum AttackKind {
    /// Damage lands the moment the attack executes.
    Melee,
    /// Damage lands when the projectile arrives.
    Ranged,
}

/// Basic attack stats for one unit.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AttackConfig {
    pub damage: f32,
    pub cooldown: Duration,
    pub kind: AttackKind,
    /// Surface-gap reach. `None` uses the kind's default.
    pub reach: Option<f32>,
}

impl AttackConfig {
    #[must_use]
    pub const fn melee(damage: f32, cooldown: Duration) -> Self {
        Self {
            damage,
            cooldown,
            kind: AttackKind::Melee,
            reach: None,
        }
    }

    #[must_use]
    pub const fn ranged(damage: f32, cooldown: Duration) -> Self {
        Self {
            damage,
            cooldown,
            kind: AttackKind::Ranged,
            reach: None,
        }
    }

    #[must_use]
    pub const fn with_reach(mut self, reach: f32) -> Self {
        self.reach = Some(reach);
        self
    }

    #[must_use]
    pub fn reach(&self) -> f32 {
        self.reach.unwrap_or(match self.kind {
            AttackKind::Melee => MELEE_REACH,
            AttackKind::Ranged => RANGED_REACH,
        })
    }

    /// This config with equipped gem bonuses folded in.
    #[must_use]
    pub fn with_modifiers(&self, modifiers: &AttackModifiers) -> Self {
        Self {
            damage: (self.damage + modifiers.damage_bonus).max(0.0),
            cooldown: self.cooldown.mul_f32(modifiers.cooldown_scale()),
            ..*self
        }
    }
}

/// Damage that landed from one attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    pub attacker: Entity,
    pub target: Entity,
    pub applied: DamageApplied,
}

/// One-shot ranged damage. Carried by a projectile and dealt on impact.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct DeferredDamage {
    pub attacker: Entity,
    pub target: Entity,
    pub amount: f32,
    fired: bool,
}

impl DeferredDamage {
    #[must_use]
    pub const fn new(attacker: Entity, target: Entity, amount: f32) -> Self {
        Self {
            attacker,
            target,
            amount,
            fired: false,
        }
    }

    #[must_use]
    pub const fn is_spent(&self) -> bool {
        self.fired
    }

    /// Applies the damage once. Later calls, calls against a defeated target,
    /// and calls against any unit other than the one fired at do nothing.
    pub fn deal<T: Damageable>(&mut self, target: &mut T) -> Option<Strike> {
        if self.fired || target.entity() != self.target {
            return None;
        }
        self.fired = true;
        if target.is_defeated() {
            return None;
        }
        Some(Strike {
            attacker: self.attacker,
            target: self.target,
            applied: target.take_damage(self.amount),
        })
    }
}

/// What an attack update did.
#[derive(Debug, Clone, PartialEq)]
pub enum AttackOutcome {
    /// No engaged target.
    Idle,
    /// The engaged target was defeated (or is gone); the behavior disengaged.
    TargetDefeated(Entity),
    OutOfRange,
    Cooling,
    Stunned,
    /// Melee damage applied this tick.
    Struck(Strike),
    /// Ranged attack released; the token must be dealt on impact.
    Fired(DeferredDamage),
}

/// Per-tick inputs that are not owned by the behavior.
#[derive(Debug, Clone, Copy)]
pub struct AttackContext<'a> {
    pub attacker: Entity,
    pub config: &'a AttackConfig,
    /// Attacker footprint. Without one, range is not checked.
    pub origin: Option<Footprint>,
    pub stunned: bool,
}

/// Engagement state: one target, one cooldown.
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AttackBehavior {
    target: Option<Entity>,
    cooldown: Duration,
}

impl AttackBehavior {
    #[must_use]
    pub const fn target(&self) -> Option<Entity> {
        self.target
    }

    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    #[must_use]
    pub const fn is_engaged(&self) -> bool {
        self.target.is_some()
    }

    /// Sets the target and clears the cooldown: the first hit is immediate.
    pub fn engage(&mut self, target: Entity) {
        self.target = Some(target);
        self.cooldown = Duration::ZERO;
    }

    /// Drops the target. Time already spent cooling down is kept.
    pub fn disengage(&mut self) {
        self.target = None;
    }

    /// Ticks the cooldown and attacks the engaged target when in reach and ready.
    ///
    /// `target` must be the engaged unit, or `None` when it no longer exists.
    pub fn update<T>(&mut self, delta: Duration, context: AttackContext<'_>, target: Option<&mut T>) -> AttackOutcome
    where
        T: Damageable + Positioned,
    {
        self.cooldown = self.cooldown.saturating_sub(delta);

        let Some(engaged) = self.target else {
            return AttackOutcome::Idle;
        };
        let Some(target) = target.filter(|target| target.entity() == engaged) else {
            self.disengage();
            return AttackOutcome::TargetDefeated(engaged);
        };
        if target.is_defeated() {
            self.disengage();
            return AttackOutcome::TargetDefeated(engaged);
        }
        if context.stunned {
            return AttackOutcome::Stunned;
        }
        let out_of_reach = context
            .origin
            .is_some_and(|origin| origin.surface_distance_to(&*target) > context.config.reach());
        if out_of_reach {
            return AttackOutcome::OutOfRange;
        }
        if !self.cooldown.is_zero() {
            return AttackOutcome::Cooling;
        }

        self.cooldown = context.config.cooldown;
        match context.config.kind {
            AttackKind::Melee => {
                let applied = target.take_damage(context.config.damage);
                if target.is_defeated() {
                    self.disengage();
                }
                AttackOutcome::Struck(Strike {
                    attacker: context.attacker,
                    target: engaged,
                    applied,
                })
            }
            AttackKind::Ranged => AttackOutcome::Fired(DeferredDamage::new(
                context.attacker,
                engaged,
                context.config.damage,
            )),
        }
    }

    /// Feedback from a deferred hit. Disengages when it defeated the engaged target.
    pub fn resolve_deferred(&mut self, strike: &Strike) -> bool {
        if strike.applied.defeated_now && self.target == Some(strike.target) {
            self.disengage();
            return true;
        }
        false
    }
}

/// A deferred-damage token in flight.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Projectile {
    pub speed: f32,
}

// === Systems ===

/// Runs every engaged attacker. Melee damage lands here; ranged attacks spawn projectiles.
/// Runs in `GameSet::Combat`.
fn attack(
    time: Res<Time>,
    config: Res<CombatConfig>,
    mut commands: Commands,
    mut attackers: Query<(
        Entity,
        &mut AttackBehavior,
        &AttackConfig,
        &Transform,
        &Body,
        Option<&GemSlots>,
        Has<Stunned>,
    )>,
    mut targets: Query<(&mut Health, &Transform, &Body), With<Target>>,
    mut damage_dealt: MessageWriter<DamageDealt>,
) {
    for (entity, mut behavior, attack_config, transform, body, gems, stunned) in &mut attackers {
        let attack_config = gems.map_or(*attack_config, |gems| {
            attack_config.with_modifiers(&gems.attack_modifiers())
        });
        let origin = Footprint::new(transform.translation.xy(), body.radius);
        let context = AttackContext {
            attacker: entity,
            config: &attack_config,
            origin: Some(origin),
            stunned,
        };

        let mut view = behavior.target().and_then(|target| {
            let (health, target_transform, target_body) = targets.get_mut(target).ok()?;
            Some(UnitView {
                entity: target,
                footprint: Footprint::new(target_transform.translation.xy(), target_body.radius),
                health: health.into_inner(),
            })
        });

        match behavior.update(time.delta(), context, view.as_mut()) {
            AttackOutcome::Struck(strike) => {
                trace!(attacker = ?entity, target = ?strike.target, dealt = strike.applied.dealt, "melee strike");
                if let Some(view) = &view {
                    damage_dealt.write(DamageDealt::from_strike(&strike, view.position()));
                }
            }
            AttackOutcome::Fired(token) => {
                commands.spawn((
                    Name::new("Projectile"),
                    Projectile {
                        speed: config.projectile_speed,
                    },
                    token,
                    Transform::from_translation(origin.position.extend(0.0)),
                ));
            }
            AttackOutcome::TargetDefeated(target) => {
                debug!(attacker = ?entity, ?target, "target defeated, disengaging");
            }
            _ => {}
        }
    }
}

/// Moves projectiles toward their targets and deals the deferred damage on arrival.
/// A projectile whose target no longer exists despawns harmlessly.
/// Runs in `GameSet::Combat`, after `attack`.
fn move_projectiles(
    time: Res<Time>,
    mut commands: Commands,
    mut projectiles: Query<(Entity, &Projectile, &mut DeferredDamage, &mut Transform)>,
    mut targets: Query<(&mut Health, &Transform, &Body), Without<Projectile>>,
    mut behaviors: Query<&mut AttackBehavior>,
    mut damage_dealt: MessageWriter<DamageDealt>,
) {
    for (entity, projectile, mut token, mut transform) in &mut projectiles {
        let Ok((health, target_transform, target_body)) = targets.get_mut(token.target) else {
            commands.entity(entity).despawn();
            continue;
        };

        let target_xy = target_transform.translation.xy();
        let direction = target_xy - transform.translation.xy();
        let distance = direction.length();
        let move_amount = projectile.speed * time.delta_secs();

        if move_amount < distance {
            let dir = direction / distance;
            transform.translation.x = dir.x.mul_add(move_amount, transform.translation.x);
            transform.translation.y = dir.y.mul_add(move_amount, transform.translation.y);
            continue;
        }

        let mut view = UnitView {
            entity: token.target,
            footprint: Footprint::new(target_xy, target_body.radius),
            health: health.into_inner(),
        };
        if let Some(strike) = token.deal(&mut view) {
            damage_dealt.write(DamageDealt::from_strike(&strike, target_xy));
            if let Ok(mut behavior) = behaviors.get_mut(strike.attacker) {
                behavior.resolve_deferred(&strike);
            }
        }
        commands.entity(entity).despawn();
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<AttackConfig>()
        .register_type::<AttackBehavior>()
        .register_type::<DeferredDamage>()
        .register_type::<Projectile>();

    // chain_ignore_deferred so newly spawned projectiles don't move until next frame.
    app.add_systems(
        Update,
        (attack, move_projectiles)
            .chain_ignore_deferred()
            .in_set(GameSet::Combat)
            .run_if(simulation_running),
    );
}
