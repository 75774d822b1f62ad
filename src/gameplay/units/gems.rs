//! Equipped gems. Inventory lives elsewhere; this is only what gems do in a fight.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::gameplay::abilities::{AbilityCatalog, AbilityDefinition, AbilityId};

/// Floor for the combined cooldown multiplier.
pub const MIN_COOLDOWN_SCALE: f32 = 0.1;

/// Default number of gem slots on the avatar.
pub const DEFAULT_GEM_SLOTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gem {
    /// Flat bonus added to basic attack damage.
    Sharpened { damage_bonus: f32 },
    /// Multiplies the basic attack cooldown.
    Swift { cooldown_scale: f32 },
    /// Grants a catalog ability.
    Spell { ability: AbilityId },
}

/// Aggregated effect of every equipped gem on the basic attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackModifiers {
    pub damage_bonus: f32,
    pub cooldown_scale: f32,
}

impl Default for AttackModifiers {
    fn default() -> Self {
        Self {
            damage_bonus: 0.0,
            cooldown_scale: 1.0,
        }
    }
}

impl AttackModifiers {
    /// Cooldown multiplier, clamped to [`MIN_COOLDOWN_SCALE`]. Non-finite scales count as 1.
    #[must_use]
    pub fn cooldown_scale(&self) -> f32 {
        if self.cooldown_scale.is_finite() {
            self.cooldown_scale.max(MIN_COOLDOWN_SCALE)
        } else {
            1.0
        }
    }
}

#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct GemSlots {
    capacity: usize,
    gems: Vec<Gem>,
}

impl Default for GemSlots {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_GEM_SLOTS)
    }
}

impl GemSlots {
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            gems: Vec::new(),
        }
    }

    #[must_use]
    pub fn gems(&self) -> &[Gem] {
        &self.gems
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.gems.len() >= self.capacity
    }

    /// Equips `gem` in the next free slot. Hands it back when every slot is taken.
    pub fn equip(&mut self, gem: Gem) -> Result<(), Gem> {
        if self.is_full() {
            return Err(gem);
        }
        self.gems.push(gem);
        Ok(())
    }

    pub fn unequip(&mut self, slot: usize) -> Option<Gem> {
        (slot < self.gems.len()).then(|| self.gems.remove(slot))
    }

    /// Damage bonuses add up; cooldown scales multiply.
    #[must_use]
    pub fn attack_modifiers(&self) -> AttackModifiers {
        self.gems
            .iter()
            .fold(AttackModifiers::default(), |mut modifiers, gem| {
                match gem {
                    Gem::Sharpened { damage_bonus } => modifiers.damage_bonus += damage_bonus,
                    Gem::Swift { cooldown_scale } => modifiers.cooldown_scale *= cooldown_scale,
                    Gem::Spell { .. } => {}
                }
                modifiers
            })
    }

    /// Catalog abilities granted by spell gems. Unknown ids are skipped.
    pub fn granted_abilities<'a>(
        &'a self,
        catalog: &'a AbilityCatalog,
    ) -> impl Iterator<Item = &'a AbilityDefinition> + 'a {
        self.gems.iter().filter_map(|gem| match gem {
            Gem::Spell { ability } => catalog.get(ability),
            _ => None,
        })
    }
}
