//! Spell slot and maneuver dice tracking.

use crate::ability::{AbilityKind, AbilityRecord};
use serde::{Deserialize, Serialize};

/// Highest spell level with slots.
pub const MAX_SLOT_LEVEL: u8 = 9;

/// Which consumable the character spends when using an ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResourceMode {
    #[default]
    Spells,
    Maneuvers,
}

/// Remaining spell slots per level plus a pool of maneuver dice.
///
/// Maxima are optional: a level with a maximum of 0 is never refilled by
/// [`Resources::restore_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resources {
    slots: [u32; 9],
    slot_max: [u32; 9],
    dice: u32,
    dice_max: u32,
}

impl Resources {
    pub fn new(dice: u32) -> Self {
        Self {
            slots: [0; 9],
            slot_max: [0; 9],
            dice,
            dice_max: dice,
        }
    }

    fn index(level: u8) -> Option<usize> {
        (1..=MAX_SLOT_LEVEL)
            .contains(&level)
            .then(|| level as usize - 1)
    }

    /// Remaining slots for `level`; 0 for levels outside 1-9.
    pub fn slots(&self, level: u8) -> u32 {
        Self::index(level).map_or(0, |i| self.slots[i])
    }

    pub fn set_slots(&mut self, level: u8, remaining: u32) {
        if let Some(i) = Self::index(level) {
            self.slots[i] = remaining;
        }
    }

    pub fn slot_max(&self, level: u8) -> u32 {
        Self::index(level).map_or(0, |i| self.slot_max[i])
    }

    /// Set the per-rest maximum for a level and fill it.
    pub fn set_slot_max(&mut self, level: u8, maximum: u32) {
        if let Some(i) = Self::index(level) {
            self.slot_max[i] = maximum;
            self.slots[i] = maximum;
        }
    }

    pub fn dice(&self) -> u32 {
        self.dice
    }

    pub fn set_dice(&mut self, remaining: u32) {
        self.dice = remaining;
    }

    pub fn dice_max(&self) -> u32 {
        self.dice_max
    }

    pub fn set_dice_max(&mut self, maximum: u32) {
        self.dice_max = maximum;
        self.dice = maximum;
    }

    /// Spend a slot of `level`. Cantrips are free.
    pub fn cast(&mut self, level: u8) -> bool {
        if level == 0 {
            return true;
        }
        match Self::index(level) {
            Some(i) if self.slots[i] > 0 => {
                self.slots[i] -= 1;
                true
            }
            _ => false,
        }
    }

    /// Spend one maneuver die.
    pub fn use_die(&mut self) -> bool {
        if self.dice > 0 {
            self.dice -= 1;
            true
        } else {
            false
        }
    }

    /// Spend whatever `record` costs under `mode`.
    pub fn spend_for(&mut self, record: &AbilityRecord, mode: ResourceMode) -> bool {
        match (mode, record.kind) {
            (ResourceMode::Spells, AbilityKind::Spell) => self.cast(record.level),
            (ResourceMode::Spells, AbilityKind::Maneuver) => true,
            (ResourceMode::Maneuvers, _) => self.use_die(),
        }
    }

    /// Refill every level that has a maximum, and the dice pool.
    pub fn restore_all(&mut self) {
        for (slot, max) in self.slots.iter_mut().zip(self.slot_max) {
            if max > 0 {
                *slot = max;
            }
        }
        self.dice = self.dice_max;
    }

    /// Remaining slots as `(level, remaining)` pairs for levels 1-9.
    pub fn slot_levels(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        (1..=MAX_SLOT_LEVEL).zip(self.slots.iter().copied())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new(4)
    }
}
