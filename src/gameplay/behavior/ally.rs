//! AI-controlled ally behavior: idle, moving, fighting.
//!
//! A fresh move order always wins over combat. Detecting an enemy while moving
//! remembers the destination, and defeating that enemy resumes the walk toward
//! exactly that point.

use bevy::prelude::*;
use tracing::{debug, trace};

use super::{BehaviorEffect, Order, UnitCommand, apply_effects};
use crate::config::CombatConfig;
use crate::gameplay::capabilities::Commandable;
use crate::gameplay::combat::AttackBehavior;
use crate::gameplay::status::Stunned;
use crate::gameplay::units::{Arrived, Destination};
use crate::gameplay::{Health, Target, Team};
use crate::{GameSet, simulation_running};

#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum AllyState {
    #[default]
    Idle,
    Moving {
        destination: Vec2,
    },
    Fighting {
        target: Entity,
        /// Destination to resume once the target is defeated.
        return_to: Option<Vec2>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AllyEvent {
    MoveCommand(Vec2),
    AttackCommand(Entity),
    Stop,
    Arrived,
    EnemyDetected(Entity),
    TargetDefeated(Entity),
}

/// The ally transition table.
#[must_use]
pub fn transition(state: AllyState, event: AllyEvent) -> (AllyState, Vec<BehaviorEffect>) {
    use AllyEvent as E;
    use AllyState as S;
    use BehaviorEffect as Fx;

    match (state, event) {
        (S::Fighting { .. }, E::MoveCommand(destination)) => (
            S::Moving { destination },
            vec![Fx::Disengage, Fx::MoveTo(destination)],
        ),
        (_, E::MoveCommand(destination)) => (S::Moving { destination }, vec![Fx::MoveTo(destination)]),

        (S::Idle, E::AttackCommand(target) | E::EnemyDetected(target)) => (
            S::Fighting {
                target,
                return_to: None,
            },
            vec![Fx::Engage(target)],
        ),
        (S::Moving { destination }, E::AttackCommand(target) | E::EnemyDetected(target)) => (
            S::Fighting {
                target,
                return_to: Some(destination),
            },
            vec![Fx::Engage(target)],
        ),
        (S::Fighting { target: current, .. }, E::AttackCommand(target)) if target == current => {
            (state, Vec::new())
        }
        (S::Fighting { return_to, .. }, E::AttackCommand(target)) => {
            (S::Fighting { target, return_to }, vec![Fx::Engage(target)])
        }

        (S::Fighting { .. }, E::Stop) => (S::Idle, vec![Fx::Disengage, Fx::Halt]),
        (_, E::Stop) => (S::Idle, vec![Fx::Halt]),

        (S::Moving { .. }, E::Arrived) => (S::Idle, vec![Fx::Halt]),

        (S::Fighting { target, return_to }, E::TargetDefeated(defeated)) if target == defeated => {
            match return_to {
                Some(destination) => (S::Moving { destination }, vec![Fx::MoveTo(destination)]),
                None => (S::Idle, vec![Fx::Halt]),
            }
        }

        (state, _) => (state, Vec::new()),
    }
}

/// State machine component for player-side units.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AllyBehavior {
    state: AllyState,
    auto_engage: bool,
}

impl AllyBehavior {
    /// Engages any enemy it detects.
    #[must_use]
    pub const fn autonomous() -> Self {
        Self {
            state: AllyState::Idle,
            auto_engage: true,
        }
    }

    /// Fights only when ordered to.
    #[must_use]
    pub const fn commanded() -> Self {
        Self {
            state: AllyState::Idle,
            auto_engage: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> AllyState {
        self.state
    }

    #[must_use]
    pub const fn auto_engages(&self) -> bool {
        self.auto_engage
    }

    /// Feeds one event through the transition table.
    pub fn handle(&mut self, event: AllyEvent) -> Vec<BehaviorEffect> {
        if matches!(event, AllyEvent::EnemyDetected(_)) && !self.auto_engage {
            return Vec::new();
        }
        let (next, effects) = transition(self.state, event);
        if next != self.state {
            debug!(from = ?self.state, to = ?next, ?event, "ally transition");
        }
        self.state = next;
        effects
    }
}

impl Commandable for AllyBehavior {
    fn command(&mut self, order: Order) -> Vec<BehaviorEffect> {
        self.handle(match order {
            Order::MoveTo(point) => AllyEvent::MoveCommand(point),
            Order::Attack(target) => AllyEvent::AttackCommand(target),
            Order::Stop => AllyEvent::Stop,
        })
    }
}

// === Systems ===

/// Routes player orders to commandable allies. Orders to stunned units are dropped.
/// Runs in `GameSet::Behavior`.
fn command_allies(
    mut commands: MessageReader<UnitCommand>,
    mut allies: Query<(
        &mut AllyBehavior,
        Option<&mut AttackBehavior>,
        Option<&mut Destination>,
        Has<Stunned>,
    )>,
) {
    for command in commands.read() {
        let Ok((mut behavior, attack, destination, stunned)) = allies.get_mut(command.unit) else {
            trace!(unit = ?command.unit, "command for a unit that takes no orders");
            continue;
        };
        if stunned {
            debug!(unit = ?command.unit, order = ?command.order, "stunned, order dropped");
            continue;
        }
        let effects = behavior.command(command.order);
        apply_effects(
            command.unit,
            &effects,
            attack.map(Mut::into_inner),
            destination.map(Mut::into_inner),
        );
    }
}

/// Feeds arrivals, target defeats and enemy detection into every non-stunned ally.
/// Runs in `GameSet::Behavior`, after `command_allies`.
fn drive_allies(
    config: Res<CombatConfig>,
    mut arrivals: MessageReader<Arrived>,
    mut allies: Query<
        (
            Entity,
            &mut AllyBehavior,
            &Team,
            &Transform,
            Option<&mut AttackBehavior>,
            Option<&mut Destination>,
        ),
        Without<Stunned>,
    >,
    units: Query<(Entity, &Team, &Health, &Transform), With<Target>>,
) {
    let arrived: Vec<Entity> = arrivals.read().map(|arrival| arrival.unit).collect();

    for (entity, mut behavior, team, transform, mut attack, mut destination) in &mut allies {
        let mut events = Vec::new();
        if arrived.contains(&entity) {
            events.push(AllyEvent::Arrived);
        }

        if let AllyState::Fighting { target, .. } = behavior.state() {
            let still_engaged = attack.as_ref().is_some_and(|attack| attack.target() == Some(target));
            let alive = units
                .get(target)
                .is_ok_and(|(_, _, health, _)| !health.is_defeated());
            if !still_engaged || !alive {
                events.push(AllyEvent::TargetDefeated(target));
            }
        }

        for event in events {
            let effects = behavior.handle(event);
            apply_effects(entity, &effects, attack.as_deref_mut(), destination.as_deref_mut());
        }

        if !behavior.auto_engages() || matches!(behavior.state(), AllyState::Fighting { .. }) {
            continue;
        }
        let position = transform.translation.xy();
        let nearest = units
            .iter()
            .filter(|(_, other_team, health, _)| **other_team != *team && !health.is_defeated())
            .map(|(other, _, _, other_transform)| (other, other_transform.translation.xy().distance(position)))
            .filter(|(_, distance)| *distance <= config.detection_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(other, _)| other);
        if let Some(enemy) = nearest {
            let effects = behavior.handle(AllyEvent::EnemyDetected(enemy));
            apply_effects(entity, &effects, attack.as_deref_mut(), destination.as_deref_mut());
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    app.register_type::<AllyBehavior>();
    app.add_systems(
        Update,
        (command_allies, drive_allies)
            .chain()
            .in_set(GameSet::Behavior)
            .run_if(simulation_running),
    );
}
