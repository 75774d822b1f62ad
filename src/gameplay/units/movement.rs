//! Straight-line steering: chase the engaged target until in reach, otherwise walk to the destination.

use std::collections::HashMap;

use bevy::prelude::*;

use super::{Arrived, Destination, Movement};
use crate::gameplay::Body;
use crate::gameplay::capabilities::{Footprint, Positioned};
use crate::gameplay::combat::{AttackBehavior, AttackConfig};
use crate::gameplay::status::Stunned;

/// Center distance at which a destination counts as reached.
pub const ARRIVAL_TOLERANCE: f32 = 4.0;

type SteeringQuery<'a> = (
    Entity,
    &'a mut Transform,
    &'a Body,
    Option<&'a Movement>,
    Option<&'a mut Destination>,
    Option<&'a AttackBehavior>,
    Option<&'a AttackConfig>,
    Has<Stunned>,
);

/// Moves every unit with `Movement`. Stunned units stand still.
/// Runs in `GameSet::Movement`.
pub(super) fn steer_units(
    time: Res<Time>,
    mut units: Query<SteeringQuery<'_>>,
    mut arrivals: MessageWriter<Arrived>,
) {
    // Positions as of the start of the pass, so chase targets are read consistently.
    let footprints: HashMap<Entity, Footprint> = units
        .iter()
        .map(|(entity, transform, body, ..)| (entity, Footprint::new(transform.translation.xy(), body.radius)))
        .collect();
    let max_step_secs = time.delta_secs();

    for (entity, mut transform, body, movement, destination, attack, attack_config, stunned) in &mut units {
        let Some(movement) = movement else {
            continue;
        };
        if stunned || movement.speed <= 0.0 {
            continue;
        }
        let position = transform.translation.xy();
        let max_step = movement.speed * max_step_secs;

        let chase = attack
            .and_then(AttackBehavior::target)
            .and_then(|target| footprints.get(&target));
        if let Some(target) = chase {
            let reach = attack_config.map_or(0.0, AttackConfig::reach);
            let gap = Footprint::new(position, body.radius).surface_distance_to(target) - reach;
            if gap > 0.0 {
                step_toward(&mut transform, target.position, max_step.min(gap));
            }
            continue;
        }

        let Some(mut destination) = destination else {
            continue;
        };
        let Some(goal) = destination.0 else {
            continue;
        };
        let distance = position.distance(goal);
        if distance <= ARRIVAL_TOLERANCE.max(max_step) {
            transform.translation.x = goal.x;
            transform.translation.y = goal.y;
            destination.0 = None;
            arrivals.write(Arrived { unit: entity });
        } else {
            step_toward(&mut transform, goal, max_step);
        }
    }
}

fn step_toward(transform: &mut Transform, goal: Vec2, step: f32) {
    let position = transform.translation.xy();
    let offset = goal - position;
    let distance = offset.length();
    if distance < f32::EPSILON {
        return;
    }
    let direction = offset / distance;
    transform.translation.x = direction.x.mul_add(step, transform.translation.x);
    transform.translation.y = direction.y.mul_add(step, transform.translation.y);
}
