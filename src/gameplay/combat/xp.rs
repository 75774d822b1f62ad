//! Participation records and even XP splits on defeat.

use std::collections::HashMap;

use bevy::prelude::*;
use tracing::debug;

/// One participant's share of a reward.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpAwarded {
    pub unit: Entity,
    pub defeated: Entity,
    pub amount: u32,
}

/// Who damaged whom, per victim, in first-hit order.
#[derive(Resource, Debug, Clone, Default)]
pub struct CombatXpTracker {
    base_reward: u32,
    participants: HashMap<Entity, Vec<Entity>>,
}

impl CombatXpTracker {
    #[must_use]
    pub fn new(base_reward: u32) -> Self {
        Self {
            base_reward,
            participants: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn base_reward(&self) -> u32 {
        self.base_reward
    }

    pub fn set_base_reward(&mut self, base_reward: u32) {
        self.base_reward = base_reward;
    }

    /// Credits `attacker` for damaging `victim`. Repeat hits are not counted twice.
    pub fn record_participation(&mut self, victim: Entity, attacker: Entity) {
        if victim == attacker {
            return;
        }
        let participants = self.participants.entry(victim).or_default();
        if !participants.contains(&attacker) {
            participants.push(attacker);
        }
    }

    #[must_use]
    pub fn participants(&self, victim: Entity) -> &[Entity] {
        self.participants.get(&victim).map_or(&[], Vec::as_slice)
    }

    /// Splits `amount` (or the base reward) evenly among `victim`'s participants,
    /// floor division with at least 1 each, then forgets the victim.
    ///
    /// Crediting the awards is the caller's job.
    pub fn distribute_xp(&mut self, victim: Entity, amount: Option<u32>) -> Vec<XpAwarded> {
        let Some(participants) = self.participants.remove(&victim) else {
            return Vec::new();
        };
        if participants.is_empty() {
            return Vec::new();
        }

        let reward = amount.unwrap_or(self.base_reward);
        let count = u32::try_from(participants.len()).unwrap_or(u32::MAX);
        let share = (reward / count).max(1);
        debug!(?victim, reward, participants = participants.len(), share, "xp distributed");

        participants
            .into_iter()
            .map(|unit| XpAwarded {
                unit,
                defeated: victim,
                amount: share,
            })
            .collect()
    }

    /// Drops a victim's record without paying out (e.g. it despawned some other way).
    pub fn forget(&mut self, victim: Entity) {
        self.participants.remove(&victim);
    }
}
