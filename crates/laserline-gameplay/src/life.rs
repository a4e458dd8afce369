//! Hit point ledger shared by every combatant.

use serde::{Deserialize, Serialize};

use crate::error::{GameplayError, GameplayResult};

/// Hit points with `0 <= hp <= max_hp` held after every mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterLife {
    max_hp: i32,
    hp: i32,
}

impl CharacterLife {
    /// Creates an empty ledger (0/0) for a not yet initialized entity.
    #[must_use]
    pub const fn new() -> Self {
        Self { max_hp: 0, hp: 0 }
    }

    /// Resets the ledger to full health.
    pub fn initialize(&mut self, max_hp: i32) -> GameplayResult<()> {
        if max_hp < 0 {
            return Err(GameplayError::InvalidArgument(format!(
                "max_hp must be non-negative, got {max_hp}"
            )));
        }
        self.max_hp = max_hp;
        self.hp = max_hp;
        Ok(())
    }

    /// Applies a signed HP change, clamped to `[0, max_hp]`.
    ///
    /// Returns true iff the resulting HP is zero.
    pub fn apply_delta(&mut self, amount: i32) -> bool {
        self.hp = self.hp.saturating_add(amount).clamp(0, self.max_hp);
        self.hp == 0
    }

    /// Returns current HP.
    #[must_use]
    pub const fn hp(&self) -> i32 {
        self.hp
    }

    /// Returns maximum HP.
    #[must_use]
    pub const fn max_hp(&self) -> i32 {
        self.max_hp
    }

    /// Returns `hp / max_hp`, or 0 when `max_hp` is 0.
    #[must_use]
    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp == 0 {
            0.0
        } else {
            self.hp as f32 / self.max_hp as f32
        }
    }

    /// Checks if HP is depleted.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.hp == 0
    }
}
