//! Hostile behavior: idle until the threat ledger names someone, then fight
//! that target until its entry leaves the ledger.

use bevy::prelude::*;
use tracing::debug;

use super::{BehaviorEffect, apply_effects};
use crate::gameplay::combat::{AttackBehavior, ThreatTracker};
use crate::gameplay::status::Stunned;
use crate::gameplay::units::Destination;
use crate::{GameSet, simulation_running};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum HostileState {
    #[default]
    Idle,
    Engaged {
        target: Entity,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostileEvent {
    /// Current top of the ledger.
    ThreatChanged { highest: Option<Entity> },
    /// The engaged target left the ledger; `next` is the new top, if any.
    TargetCleared { target: Entity, next: Option<Entity> },
}

/// The hostile transition table.
#[must_use]
pub fn transition(state: HostileState, event: HostileEvent) -> (HostileState, Vec<BehaviorEffect>) {
    use BehaviorEffect as Fx;
    use HostileEvent as E;
    use HostileState as S;

    match (state, event) {
        (S::Idle, E::ThreatChanged { highest: Some(target) }) => {
            (S::Engaged { target }, vec![Fx::Engage(target)])
        }
        (S::Engaged { target }, E::TargetCleared { target: cleared, next }) if cleared == target => match next {
            Some(next) => (S::Engaged { target: next }, vec![Fx::Engage(next)]),
            None => (S::Idle, vec![Fx::Disengage]),
        },
        (state, _) => (state, Vec::new()),
    }
}

#[derive(Component, Debug, Clone, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct HostileBehavior {
    state: HostileState,
}

impl HostileBehavior {
    #[must_use]
    pub const fn state(&self) -> HostileState {
        self.state
    }

    pub fn handle(&mut self, event: HostileEvent) -> Vec<BehaviorEffect> {
        let (next, effects) = transition(self.state, event);
        if next != self.state {
            debug!(from = ?self.state, to = ?next, "hostile transition");
        }
        self.state = next;
        effects
    }
}

/// Follows each non-stunned hostile's threat ledger.
/// Runs in `GameSet::Behavior`.
///
/// Re-engagement is derived from the ledger itself: an engaged target missing
/// from the ledger was cleared, whenever that happened. A stunned hostile picks
/// up the change on its first tick back.
fn drive_hostiles(
    mut hostiles: Query<
        (
            Entity,
            &mut HostileBehavior,
            &ThreatTracker,
            Option<&mut AttackBehavior>,
            Option<&mut Destination>,
        ),
        Without<Stunned>,
    >,
) {
    for (entity, mut behavior, tracker, mut attack, mut destination) in &mut hostiles {
        let highest = tracker.highest_threat();
        let mut effects = Vec::new();
        if let HostileState::Engaged { target } = behavior.state() {
            if !tracker.contains(target) {
                effects.extend(behavior.handle(HostileEvent::TargetCleared { target, next: highest }));
            }
        }
        effects.extend(behavior.handle(HostileEvent::ThreatChanged { highest }));
        apply_effects(entity, &effects, attack.as_deref_mut(), destination.as_deref_mut());
    }
}

pub(super) fn plugin(app: &mut App) {
    app.register_type::<HostileBehavior>();
    app.add_systems(
        Update,
        drive_hostiles
            .in_set(GameSet::Behavior)
            .run_if(simulation_running),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_entities;
    use pretty_assertions::assert_eq;

    #[test]
    fn engages_the_top_of_the_ledger() {
        let target = test_entities(1)[0];
        let mut hostile = HostileBehavior::default();

        let effects = hostile.handle(HostileEvent::ThreatChanged { highest: Some(target) });

        assert_eq!(effects, vec![BehaviorEffect::Engage(target)]);
        assert_eq!(hostile.state(), HostileState::Engaged { target });
    }

    #[test]
    fn stays_on_its_target_when_someone_else_out_threatens() {
        let ids = test_entities(2);
        let engaged = HostileState::Engaged { target: ids[0] };
        let (state, effects) = transition(engaged, HostileEvent::ThreatChanged { highest: Some(ids[1]) });
        assert_eq!(state, engaged);
        assert!(effects.is_empty());
    }

    #[test]
    fn same_top_is_not_a_transition() {
        let target = test_entities(1)[0];
        let engaged = HostileState::Engaged { target };
        let (state, effects) = transition(engaged, HostileEvent::ThreatChanged { highest: Some(target) });
        assert_eq!(state, engaged);
        assert!(effects.is_empty());
    }

    #[test]
    fn clearing_the_target_falls_back_or_idles() {
        let ids = test_entities(2);
        let engaged = HostileState::Engaged { target: ids[0] };

        let (state, effects) = transition(
            engaged,
            HostileEvent::TargetCleared {
                target: ids[0],
                next: Some(ids[1]),
            },
        );
        assert_eq!(state, HostileState::Engaged { target: ids[1] });
        assert_eq!(effects, vec![BehaviorEffect::Engage(ids[1])]);

        let (state, effects) = transition(
            engaged,
            HostileEvent::TargetCleared {
                target: ids[0],
                next: None,
            },
        );
        assert_eq!(state, HostileState::Idle);
        assert_eq!(effects, vec![BehaviorEffect::Disengage]);
    }

    #[test]
    fn clearing_someone_else_changes_nothing() {
        let ids = test_entities(2);
        let engaged = HostileState::Engaged { target: ids[0] };
        let (state, effects) = transition(
            engaged,
            HostileEvent::TargetCleared {
                target: ids[1],
                next: None,
            },
        );
        assert_eq!(state, engaged);
        assert!(effects.is_empty());
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::gameplay::units::UnitKind;
    use crate::gameplay::{Health, Team};
    use crate::testing::{create_combat_test_app, create_test_app, spawn_test_target, spawn_test_unit, test_entities};
    use pretty_assertions::assert_eq;

    fn create_hostile_test_app() -> App {
        let mut app = create_test_app();
        app.add_systems(Update, drive_hostiles);
        app.update();
        app
    }

    fn spawn_hostile(world: &mut World) -> Entity {
        world
            .spawn((
                HostileBehavior::default(),
                ThreatTracker::default(),
                AttackBehavior::default(),
            ))
            .id()
    }

    fn state(app: &App, hostile: Entity) -> HostileState {
        app.world().get::<HostileBehavior>(hostile).unwrap().state()
    }

    #[test]
    fn follows_the_ledger_and_idles_when_it_empties() {
        let mut app = create_hostile_test_app();
        let ids = test_entities(2);
        let hostile = spawn_hostile(app.world_mut());

        app.world_mut()
            .get_mut::<ThreatTracker>(hostile)
            .unwrap()
            .add_threat(ids[0], 10.0);
        app.update();
        assert_eq!(state(&app, hostile), HostileState::Engaged { target: ids[0] });
        assert_eq!(
            app.world().get::<AttackBehavior>(hostile).unwrap().target(),
            Some(ids[0])
        );

        app.world_mut()
            .get_mut::<ThreatTracker>(hostile)
            .unwrap()
            .add_threat(ids[1], 25.0);
        app.update();
        assert_eq!(state(&app, hostile), HostileState::Engaged { target: ids[0] });

        app.world_mut().get_mut::<ThreatTracker>(hostile).unwrap().clear();
        app.update();
        assert_eq!(state(&app, hostile), HostileState::Idle);
        assert!(!app.world().get::<AttackBehavior>(hostile).unwrap().is_engaged());
    }

    #[test]
    fn stunned_hostiles_catch_up_after_the_stun() {
        let mut app = create_hostile_test_app();
        let target = test_entities(1)[0];
        let hostile = spawn_hostile(app.world_mut());
        app.world_mut()
            .entity_mut(hostile)
            .insert(Stunned::for_duration(std::time::Duration::from_secs(1)));
        app.world_mut()
            .get_mut::<ThreatTracker>(hostile)
            .unwrap()
            .add_threat(target, 10.0);

        app.update();
        assert_eq!(state(&app, hostile), HostileState::Idle);

        app.world_mut().entity_mut(hostile).remove::<Stunned>();
        app.update();
        assert_eq!(state(&app, hostile), HostileState::Engaged { target });
    }

    #[test]
    fn a_shifting_lead_does_not_buy_extra_swings() {
        let mut app = create_combat_test_app();
        // Grunt melee: 10 damage every 1200 ms, both targets inside reach.
        let grunt = spawn_test_unit(&mut app, UnitKind::Grunt, 0.0, 0.0);
        let first = spawn_test_target(app.world_mut(), Team::Player, 15.0, 0.0, 1_000.0);
        let second = spawn_test_target(app.world_mut(), Team::Player, -15.0, 0.0, 1_000.0);

        app.world_mut()
            .get_mut::<ThreatTracker>(grunt)
            .unwrap()
            .add_threat(first, 100.0);
        app.update();
        assert_eq!(state(&app, grunt), HostileState::Engaged { target: first });

        for _ in 0..9 {
            let mut tracker = app.world_mut().get_mut::<ThreatTracker>(grunt).unwrap();
            let top = tracker.highest_threat().unwrap();
            let lead = tracker.threat_of(top).unwrap();
            let other = if top == first { second } else { first };
            tracker.add_threat(other, lead + 50.0);
            app.update();
        }

        let dealt: f32 = [first, second]
            .iter()
            .map(|&target| 1_000.0 - app.world().get::<Health>(target).unwrap().current)
            .sum();
        assert_eq!(dealt, 10.0);
        assert_eq!(state(&app, grunt), HostileState::Engaged { target: first });
    }
}
