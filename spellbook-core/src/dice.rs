//! Dice rolling and the roll log.
//!
//! Supports direct `count x dN + modifier` rolls and standard XdY+Z notation.
//! Every roll made through the engine lands in a bounded, most-recent-first
//! [`RollHistory`].

use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default number of entries kept in the roll log.
pub const DEFAULT_HISTORY_CAP: usize = 20;

/// Error type for dice parsing and rolling.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
}

/// A group of identical dice, e.g. the `3d8` in `3d8+2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceComponent {
    pub count: u32,
    pub sides: u32,
}

impl DiceComponent {
    pub fn new(count: u32, sides: u32) -> Result<Self, DiceError> {
        if sides == 0 {
            return Err(DiceError::InvalidDieSize(sides));
        }
        if count == 0 {
            return Err(DiceError::NoDice);
        }
        Ok(Self { count, sides })
    }
}

/// A complete dice expression (e.g., 2d6+3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub components: Vec<DiceComponent>,
    pub modifier: i32,
}

impl DiceExpression {
    /// `count`d`sides` + `modifier`.
    pub fn simple(sides: u32, count: u32, modifier: i32) -> Result<Self, DiceError> {
        Ok(Self {
            components: vec![DiceComponent::new(count, sides)?],
            modifier,
        })
    }

    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut components = Vec::new();
        let mut modifier: i32 = 0;
        let mut current = String::new();
        let mut sign: i32 = 1;

        for ch in notation.chars() {
            match ch {
                '+' | '-' => {
                    if !current.is_empty() {
                        Self::parse_component(&current, sign, &mut components, &mut modifier)?;
                        current.clear();
                    }
                    sign = if ch == '+' { 1 } else { -1 };
                }
                ' ' => continue,
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            Self::parse_component(&current, sign, &mut components, &mut modifier)?;
        }

        if components.is_empty() {
            return Err(DiceError::NoDice);
        }

        Ok(DiceExpression {
            components,
            modifier,
        })
    }

    fn parse_component(
        s: &str,
        sign: i32,
        components: &mut Vec<DiceComponent>,
        modifier: &mut i32,
    ) -> Result<(), DiceError> {
        if let Some(d_pos) = s.find('d') {
            if sign < 0 {
                return Err(DiceError::InvalidNotation(s.to_string()));
            }

            let count_str = &s[..d_pos];
            let count: u32 = if count_str.is_empty() {
                1
            } else {
                count_str
                    .parse()
                    .map_err(|_| DiceError::InvalidNotation(s.to_string()))?
            };

            let sides: u32 = s[d_pos + 1..]
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;

            components.push(DiceComponent::new(count, sides)?);
        } else {
            let value: i32 = s
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            *modifier = sign
                .checked_mul(value)
                .and_then(|term| modifier.checked_add(term))
                .ok_or_else(|| DiceError::InvalidNotation(s.to_string()))?;
        }

        Ok(())
    }

    /// Roll with a specific RNG.
    pub fn roll_with_rng<R: Rng>(&self, rng: &mut R) -> RollResult {
        let mut rolls = Vec::new();
        for component in &self.components {
            rolls.extend((0..component.count).map(|_| rng.gen_range(1..=component.sides)));
        }

        let dice_total: i64 = rolls.iter().map(|&r| i64::from(r)).sum();
        let total = dice_total + i64::from(self.modifier);

        RollResult {
            formula: self.to_string(),
            rolls,
            modifier: self.modifier,
            total,
        }
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dice = self
            .components
            .iter()
            .map(|c| format!("{}d{}", c.count, c.sides))
            .collect::<Vec<_>>()
            .join("+");
        match self.modifier {
            0 => write!(f, "{dice}"),
            m if m > 0 => write!(f, "{dice}+{m}"),
            m => write!(f, "{dice}{m}"),
        }
    }
}

/// Complete result of a dice roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    /// Normalized notation, e.g. "3d20+5".
    pub formula: String,
    /// Every individual die, in roll order.
    pub rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i64,
}

impl RollResult {
    /// Format the individual dice results for display.
    pub fn dice_display(&self) -> String {
        let dice_str = format!(
            "[{}]",
            self.rolls
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        if self.modifier > 0 {
            format!("{} + {}", dice_str, self.modifier)
        } else if self.modifier < 0 {
            format!("{} - {}", dice_str, self.modifier.unsigned_abs())
        } else {
            dice_str
        }
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.dice_display(), self.total)
    }
}

/// One line of the roll log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollEntry {
    /// Local wall-clock time, `HH:MM:SS`.
    pub timestamp: String,
    pub formula: String,
    pub total: i64,
    /// Individual dice and modifier, e.g. "[4, 17, 9] + 5".
    pub detail: String,
}

impl RollEntry {
    pub fn from_result(result: &RollResult) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            formula: result.formula.clone(),
            total: result.total,
            detail: result.dice_display(),
        }
    }
}

/// Bounded roll log, most recent first.
#[derive(Debug, Clone)]
pub struct RollHistory {
    entries: VecDeque<RollEntry>,
    cap: usize,
}

impl RollHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Insert at the front, dropping the oldest entries beyond the cap.
    pub fn record(&mut self, entry: RollEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.cap);
    }

    pub fn latest(&self) -> Option<&RollEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RollEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RollHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}
