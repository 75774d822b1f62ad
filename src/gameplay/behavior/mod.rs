//! Unit behavior state machines. Each archetype family has a closed state enum
//! and a pure transition function; systems only feed events in and apply the
//! effects that come out.

pub mod ally;
pub mod hostile;

use bevy::prelude::*;
use tracing::trace;

use crate::gameplay::combat::AttackBehavior;
use crate::gameplay::units::Destination;

/// A player order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Order {
    MoveTo(Vec2),
    Attack(Entity),
    Stop,
}

/// An order addressed to one unit. Dropped if the unit is stunned or not commandable.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct UnitCommand {
    pub unit: Entity,
    pub order: Order,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehaviorEffect {
    Engage(Entity),
    Disengage,
    MoveTo(Vec2),
    Halt,
}

/// Applies transition effects to the unit's attack and movement components.
pub fn apply_effects(
    unit: Entity,
    effects: &[BehaviorEffect],
    attack: Option<&mut AttackBehavior>,
    destination: Option<&mut Destination>,
) {
    let (mut attack, mut destination) = (attack, destination);
    for effect in effects {
        trace!(?unit, ?effect, "behavior effect");
        match *effect {
            BehaviorEffect::Engage(target) => {
                if let Some(attack) = attack.as_deref_mut() {
                    attack.engage(target);
                }
                if let Some(destination) = destination.as_deref_mut() {
                    destination.0 = None;
                }
            }
            BehaviorEffect::Disengage => {
                if let Some(attack) = attack.as_deref_mut() {
                    attack.disengage();
                }
            }
            BehaviorEffect::MoveTo(point) => {
                if let Some(destination) = destination.as_deref_mut() {
                    destination.0 = Some(point);
                }
            }
            BehaviorEffect::Halt => {
                if let Some(destination) = destination.as_deref_mut() {
                    destination.0 = None;
                }
            }
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    app.add_message::<UnitCommand>();
    app.add_plugins((ally::plugin, hostile::plugin));
}
