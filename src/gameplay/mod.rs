//! Gameplay domain: shared unit components and the combat, ability and behavior plugins.

pub mod abilities;
pub mod behavior;
pub mod capabilities;
pub mod combat;
pub mod status;
pub mod units;

use bevy::prelude::*;

// === Components ===

/// Which side a unit fights for.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
#[reflect(Component)]
pub enum Team {
    Player,
    Enemy,
}

impl Team {
    #[must_use]
    pub const fn opposing(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

/// Marker: this entity can be targeted by attacks and abilities.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Target;

/// Collision footprint used for reach checks (surface-to-surface distance).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Body {
    pub radius: f32,
}

/// Result of a single damage application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageApplied {
    /// Hit points actually removed.
    pub dealt: f32,
    /// True only for the call that took the unit to zero.
    pub defeated_now: bool,
}

/// Hit points. Defeat is monotonic: once defeated, a unit never recovers.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    defeated: bool,
}

impl Health {
    #[must_use]
    pub const fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            defeated: false,
        }
    }

    /// Starts below max, for wounded spawns and tests.
    #[must_use]
    pub fn with_current(mut self, current: f32) -> Self {
        self.current = current.clamp(0.0, self.max);
        self.defeated = self.current <= 0.0;
        self
    }

    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.defeated
    }

    /// Current HP as a fraction of max, in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }

    /// Removes up to `amount` HP. Negative and NaN amounts deal nothing.
    pub fn apply_damage(&mut self, amount: f32) -> DamageApplied {
        if self.defeated {
            return DamageApplied {
                dealt: 0.0,
                defeated_now: false,
            };
        }
        let amount = amount.max(0.0);
        let dealt = amount.min(self.current);
        self.current -= dealt;
        let defeated_now = self.current <= 0.0;
        if defeated_now {
            self.current = 0.0;
            self.defeated = true;
        }
        DamageApplied {
            dealt,
            defeated_now,
        }
    }

    /// Restores up to `amount` HP, clamped at max. Returns HP actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.defeated {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current - before
    }
}

/// Resource pool spent by abilities.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Mana {
    pub current: f32,
    pub max: f32,
}

impl Mana {
    #[must_use]
    pub const fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    #[must_use]
    pub fn can_afford(&self, cost: f32) -> bool {
        self.current >= cost.max(0.0)
    }

    /// Deducts `cost` if affordable. Returns whether it was spent.
    pub fn try_spend(&mut self, cost: f32) -> bool {
        let cost = cost.max(0.0);
        if self.current < cost {
            return false;
        }
        self.current -= cost;
        true
    }

    pub fn restore(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }
}

/// Offensive stats that abilities scale from.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct CombatStats {
    pub attack_power: f32,
    pub spell_power: f32,
}

/// Accumulated experience of a player-side unit.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub struct Experience(pub u32);

impl Experience {
    pub fn add_xp(&mut self, amount: u32) {
        self.0 = self.0.saturating_add(amount);
    }
}

/// XP paid out to participants when this unit is defeated.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Bounty(pub u32);

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Team>()
        .register_type::<Target>()
        .register_type::<Body>()
        .register_type::<Health>()
        .register_type::<Mana>()
        .register_type::<CombatStats>()
        .register_type::<Experience>()
        .register_type::<Bounty>();

    app.add_plugins((
        status::plugin,
        units::plugin,
        combat::plugin,
        abilities::plugin,
        behavior::plugin,
    ));
}
