//! Crowd-control status. A stunned unit keeps its cooldowns ticking but does
//! not transition, attack or cast until the stun runs out.

use std::time::Duration;

use bevy::prelude::*;
use tracing::trace;

use crate::{GameSet, simulation_running};

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Stunned {
    pub remaining: Duration,
}

impl Stunned {
    #[must_use]
    pub const fn for_duration(remaining: Duration) -> Self {
        Self { remaining }
    }

    /// Extends the stun if `other` would outlast it. Stuns never stack additively.
    pub fn refresh(&mut self, other: Duration) {
        self.remaining = self.remaining.max(other);
    }
}

/// Runs in `GameSet::Status`.
fn tick_stuns(time: Res<Time>, mut commands: Commands, mut stunned: Query<(Entity, &mut Stunned)>) {
    for (entity, mut stun) in &mut stunned {
        stun.remaining = stun.remaining.saturating_sub(time.delta());
        if stun.remaining.is_zero() {
            trace!(unit = ?entity, "stun expired");
            commands.entity(entity).remove::<Stunned>();
        }
    }
}

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Stunned>();
    app.add_systems(
        Update,
        tick_stuns.in_set(GameSet::Status).run_if(simulation_running),
    );
}
