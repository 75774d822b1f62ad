//! Deferred removal: defeated units pay out rewards and are despawned.

use bevy::prelude::*;
use tracing::info;

use crate::config::CombatConfig;
use crate::gameplay::combat::{CombatXpTracker, UnitDefeated, XpAwarded};
use crate::gameplay::{Bounty, Experience, Health, Team};
use crate::{GameSet, simulation_running};

/// `SystemSet` for defeat cleanup. Hosts can order against this instead of
/// referencing the function directly.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefeatCleanup;

/// Splits bounties, credits XP, announces the defeat and despawns.
fn cleanup_defeated(
    mut commands: Commands,
    config: Res<CombatConfig>,
    mut xp: ResMut<CombatXpTracker>,
    defeated: Query<(Entity, &Health, &Team, &Transform, Option<&Bounty>)>,
    mut experience: Query<&mut Experience>,
    mut defeats: MessageWriter<UnitDefeated>,
    mut awards: MessageWriter<XpAwarded>,
) {
    if config.is_changed() {
        xp.set_base_reward(config.base_xp_reward);
    }

    for (entity, health, team, transform, bounty) in &defeated {
        if !health.is_defeated() {
            continue;
        }

        match bounty {
            Some(bounty) => {
                for award in xp.distribute_xp(entity, Some(bounty.0)) {
                    if let Ok(mut earned) = experience.get_mut(award.unit) {
                        earned.add_xp(award.amount);
                    }
                    awards.write(award);
                }
            }
            None => xp.forget(entity),
        }

        let position = transform.translation.xy();
        info!(unit = ?entity, ?team, x = position.x, y = position.y, "unit defeated");
        defeats.write(UnitDefeated {
            unit: entity,
            team: *team,
            position,
        });
        commands.entity(entity).despawn();
    }
}

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        cleanup_defeated
            .in_set(DefeatCleanup)
            .in_set(GameSet::Cleanup)
            .run_if(simulation_running),
    );
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::testing::{assert_entity_count, create_test_app, spawn_test_target};
    use pretty_assertions::assert_eq;

    fn create_death_test_app() -> App {
        let mut app = create_test_app();
        app.init_resource::<CombatConfig>();
        app.insert_resource(CombatXpTracker::new(10));
        app.add_message::<UnitDefeated>().add_message::<XpAwarded>();
        app.add_systems(Update, cleanup_defeated);
        app
    }

    fn defeat(world: &mut World, entity: Entity) {
        world.get_mut::<Health>(entity).unwrap().apply_damage(f32::MAX);
    }

    #[test]
    fn defeated_unit_is_despawned_and_announced_once() {
        let mut app = create_death_test_app();
        let world = app.world_mut();
        let hostile = spawn_test_target(world, Team::Enemy, 30.0, 40.0, 100.0);
        spawn_test_target(world, Team::Player, 0.0, 0.0, 100.0);
        defeat(world, hostile);

        app.update();

        assert_entity_count::<With<Health>>(&mut app, 1);
        let messages = app.world().resource::<Messages<UnitDefeated>>();
        let defeated: Vec<UnitDefeated> = messages.iter_current_update_messages().copied().collect();
        assert_eq!(
            defeated,
            vec![UnitDefeated {
                unit: hostile,
                team: Team::Enemy,
                position: Vec2::new(30.0, 40.0),
            }]
        );

        app.update();
        let messages = app.world().resource::<Messages<UnitDefeated>>();
        assert_eq!(messages.iter_current_update_messages().count(), 0);
    }

    #[test]
    fn wounded_units_survive() {
        let mut app = create_death_test_app();
        let world = app.world_mut();
        let unit = spawn_test_target(world, Team::Enemy, 0.0, 0.0, 100.0);
        world.get_mut::<Health>(unit).unwrap().apply_damage(99.0);

        app.update();

        assert_entity_count::<With<Health>>(&mut app, 1);
    }

    #[test]
    fn bounty_is_split_between_participants() {
        let mut app = create_death_test_app();
        let world = app.world_mut();
        let hostile = spawn_test_target(world, Team::Enemy, 0.0, 0.0, 100.0);
        world.entity_mut(hostile).insert(Bounty(10));
        let participants: Vec<Entity> = (0..3)
            .map(|i| {
                let unit = spawn_test_target(world, Team::Player, 20.0 * i as f32, 0.0, 100.0);
                world.entity_mut(unit).insert(Experience::default());
                unit
            })
            .collect();
        {
            let mut xp = world.resource_mut::<CombatXpTracker>();
            for &unit in &participants {
                xp.record_participation(hostile, unit);
            }
        }
        defeat(world, hostile);

        app.update();

        for unit in participants {
            assert_eq!(app.world().get::<Experience>(unit), Some(&Experience(3)));
        }
        let awards = app.world().resource::<Messages<XpAwarded>>();
        assert_eq!(awards.iter_current_update_messages().count(), 3);
        assert!(app.world().resource::<CombatXpTracker>().participants(hostile).is_empty());
    }
}
