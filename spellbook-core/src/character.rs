//! Character sheet state and derived statistics.
//!
//! Scores are plain integers with no enforced bounds; callers usually keep
//! them in 0-30. All derived numbers use floor division so negative modifiers
//! round toward negative infinity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ability {
    #[serde(rename = "STR")]
    Strength,
    #[serde(rename = "DEX")]
    Dexterity,
    #[serde(rename = "CON")]
    Constitution,
    #[serde(rename = "INT")]
    Intelligence,
    #[serde(rename = "WIS")]
    Wisdom,
    #[serde(rename = "CHA")]
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }

    /// Accepts "STR", "str" or "Strength".
    pub fn from_key(key: &str) -> Option<Ability> {
        let key = key.trim();
        Ability::all().into_iter().find(|a| {
            a.abbreviation().eq_ignore_ascii_case(key) || a.name().eq_ignore_ascii_case(key)
        })
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// `floor((score - 10) / 2)`.
pub fn ability_modifier(score: i32) -> i32 {
    score.saturating_sub(10).div_euclid(2)
}

/// `floor((level - 1) / 4) + 2`.
pub fn proficiency_bonus(level: i32) -> i32 {
    level.saturating_sub(1).div_euclid(4) + 2
}

/// Ability scores container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    #[serde(rename = "STR")]
    pub strength: i32,
    #[serde(rename = "DEX")]
    pub dexterity: i32,
    #[serde(rename = "CON")]
    pub constitution: i32,
    #[serde(rename = "INT")]
    pub intelligence: i32,
    #[serde(rename = "WIS")]
    pub wisdom: i32,
    #[serde(rename = "CHA")]
    pub charisma: i32,
}

impl AbilityScores {
    pub fn new(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: i32) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        ability_modifier(self.get(ability))
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

// ============================================================================
// Skills
// ============================================================================

/// D&D 5e skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Skill {
    Athletics,
    Acrobatics,
    SleightOfHand,
    Stealth,
    Arcana,
    History,
    Investigation,
    Nature,
    Religion,
    AnimalHandling,
    Insight,
    Medicine,
    Perception,
    Survival,
    Deception,
    Intimidation,
    Performance,
    Persuasion,
}

impl Skill {
    pub fn ability(&self) -> Ability {
        match self {
            Skill::Athletics => Ability::Strength,
            Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Ability::Dexterity,
            Skill::Arcana
            | Skill::History
            | Skill::Investigation
            | Skill::Nature
            | Skill::Religion => Ability::Intelligence,
            Skill::AnimalHandling
            | Skill::Insight
            | Skill::Medicine
            | Skill::Perception
            | Skill::Survival => Ability::Wisdom,
            Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
                Ability::Charisma
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Skill::Athletics => "Athletics",
            Skill::Acrobatics => "Acrobatics",
            Skill::SleightOfHand => "Sleight of Hand",
            Skill::Stealth => "Stealth",
            Skill::Arcana => "Arcana",
            Skill::History => "History",
            Skill::Investigation => "Investigation",
            Skill::Nature => "Nature",
            Skill::Religion => "Religion",
            Skill::AnimalHandling => "Animal Handling",
            Skill::Insight => "Insight",
            Skill::Medicine => "Medicine",
            Skill::Perception => "Perception",
            Skill::Survival => "Survival",
            Skill::Deception => "Deception",
            Skill::Intimidation => "Intimidation",
            Skill::Performance => "Performance",
            Skill::Persuasion => "Persuasion",
        }
    }

    pub fn all() -> [Skill; 18] {
        [
            Skill::Athletics,
            Skill::Acrobatics,
            Skill::SleightOfHand,
            Skill::Stealth,
            Skill::Arcana,
            Skill::History,
            Skill::Investigation,
            Skill::Nature,
            Skill::Religion,
            Skill::AnimalHandling,
            Skill::Insight,
            Skill::Medicine,
            Skill::Perception,
            Skill::Survival,
            Skill::Deception,
            Skill::Intimidation,
            Skill::Performance,
            Skill::Persuasion,
        ]
    }

    pub fn from_name(name: &str) -> Option<Skill> {
        let name = name.trim();
        Skill::all()
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Hit Points
// ============================================================================

/// Hit points tracking. No temporary HP or dying state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    #[serde(rename = "max")]
    pub maximum: i32,
}

impl HitPoints {
    pub fn new(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Add `delta` (negative for damage) and clamp to `0..=maximum`.
    pub fn apply(&mut self, delta: i32) -> i32 {
        self.current = self
            .current
            .saturating_add(delta)
            .clamp(0, self.maximum.max(0));
        self.current
    }

    pub fn restore(&mut self) {
        self.current = self.maximum;
    }
}

impl Default for HitPoints {
    fn default() -> Self {
        Self::new(10)
    }
}

// ============================================================================
// Features and Character
// ============================================================================

/// A free-text class feature, feat or racial trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    #[serde(rename = "desc", default)]
    pub description: String,
}

impl Feature {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// The player character driving the spellbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub stats: AbilityScores,
    pub hp: HitPoints,
    pub ac: i32,
    /// Character level, 1-20.
    pub level: i32,
    pub casting_stat: Ability,
    /// Skill names; unknown names are kept but never match a [`Skill`].
    pub proficiencies: BTreeSet<String>,
    pub save_profs: BTreeSet<Ability>,
    pub features: Vec<Feature>,
}

impl Character {
    pub fn proficiency_bonus(&self) -> i32 {
        proficiency_bonus(self.level)
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        self.stats.modifier(ability)
    }

    /// `8 + proficiency + casting modifier`.
    pub fn spell_save_dc(&self) -> i32 {
        8 + self.proficiency_bonus() + self.modifier(self.casting_stat)
    }

    pub fn spell_attack_bonus(&self) -> i32 {
        self.proficiency_bonus() + self.modifier(self.casting_stat)
    }

    pub fn is_proficient(&self, skill: &str) -> bool {
        let skill = skill.trim();
        self.proficiencies
            .iter()
            .any(|p| p.eq_ignore_ascii_case(skill))
    }

    /// `10 + modifier(stat) + proficiency if trained in skill`.
    pub fn passive_score(&self, skill: &str, governing: Ability) -> i32 {
        let trained = if self.is_proficient(skill) {
            self.proficiency_bonus()
        } else {
            0
        };
        10 + self.modifier(governing) + trained
    }

    /// Passive score using the skill's standard governing ability.
    pub fn passive_skill(&self, skill: Skill) -> i32 {
        self.passive_score(skill.name(), skill.ability())
    }

    pub fn saving_throw_bonus(&self, ability: Ability) -> i32 {
        let trained = if self.save_profs.contains(&ability) {
            self.proficiency_bonus()
        } else {
            0
        };
        self.modifier(ability) + trained
    }

    pub fn apply_hp(&mut self, delta: i32) -> i32 {
        self.hp.apply(delta)
    }

    pub fn add_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn remove_feature(&mut self, index: usize) -> Option<Feature> {
        (index < self.features.len()).then(|| self.features.remove(index))
    }
}

impl Default for Character {
    fn default() -> Self {
        Self {
            stats: AbilityScores::default(),
            hp: HitPoints::default(),
            ac: 10,
            level: 1,
            casting_stat: Ability::Intelligence,
            proficiencies: BTreeSet::new(),
            save_profs: BTreeSet::new(),
            features: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_modifier_table() {
        let scores = [1, 8, 9, 10, 11, 12, 20];
        let expected = [-5, -1, -1, 0, 0, 1, 5];
        for (score, want) in scores.into_iter().zip(expected) {
            assert_eq!(ability_modifier(score), want, "score {score}");
        }
        assert_eq!(ability_modifier(0), -5);
        assert_eq!(ability_modifier(30), 10);
    }

    #[test]
    fn test_extreme_scores_saturate() {
        assert_eq!(ability_modifier(i32::MIN), i32::MIN / 2);
        assert_eq!(ability_modifier(i32::MAX), (i32::MAX - 10) / 2);
        assert_eq!(proficiency_bonus(i32::MIN), i32::MIN / 4 + 2);

        let mut character = Character::default();
        character.stats.set(Ability::Intelligence, i32::MIN);
        assert!(character.spell_save_dc() < 0);
    }

    #[test]
    fn test_proficiency_bonus_table() {
        let levels = [1, 4, 5, 8, 9, 12, 13, 16, 17, 20];
        let expected = [2, 2, 3, 3, 4, 4, 5, 5, 6, 6];
        for (level, want) in levels.into_iter().zip(expected) {
            assert_eq!(proficiency_bonus(level), want, "level {level}");
        }
    }

    #[test]
    fn test_spell_save_dc() {
        let mut character = Character::default();
        character.level = 5;
        character.casting_stat = Ability::Wisdom;
        character.stats.set(Ability::Wisdom, 16);
        // 8 + 3 + 3
        assert_eq!(character.spell_save_dc(), 14);
        assert_eq!(character.spell_attack_bonus(), 6);
    }

    #[test]
    fn test_passive_score() {
        let mut character = Character::default();
        character.stats.set(Ability::Wisdom, 14);
        assert_eq!(character.passive_score("Perception", Ability::Wisdom), 12);

        character.proficiencies.insert("Perception".to_string());
        assert_eq!(character.passive_score("perception", Ability::Wisdom), 14);
        assert_eq!(character.passive_skill(Skill::Perception), 14);
        assert_eq!(character.passive_skill(Skill::Insight), 12);
    }

    #[test]
    fn test_saving_throws() {
        let mut character = Character::default();
        character.stats.set(Ability::Constitution, 15);
        character.save_profs.insert(Ability::Constitution);
        assert_eq!(character.saving_throw_bonus(Ability::Constitution), 4);
        assert_eq!(character.saving_throw_bonus(Ability::Strength), 0);
    }

    #[test]
    fn test_hp_clamping() {
        let mut hp = HitPoints {
            current: 5,
            maximum: 10,
        };
        assert_eq!(hp.apply(50), 10);
        assert_eq!(hp.apply(-100), 0);
        assert_eq!(hp.apply(3), 3);
        hp.restore();
        assert_eq!(hp.current, 10);
    }

    #[test]
    fn test_lookup_by_key() {
        assert_eq!(Ability::from_key("wis"), Some(Ability::Wisdom));
        assert_eq!(Ability::from_key("Charisma"), Some(Ability::Charisma));
        assert_eq!(Ability::from_key("LUCK"), None);
        assert_eq!(Skill::from_name("sleight of hand"), Some(Skill::SleightOfHand));
    }

    #[test]
    fn test_ability_serde_keys() {
        let json = serde_json::to_value(AbilityScores::default()).unwrap();
        assert_eq!(json["STR"], 10);
        assert_eq!(serde_json::to_value(Ability::Wisdom).unwrap(), "WIS");
    }

    #[test]
    fn test_features() {
        let mut character = Character::default();
        character.add_feature(Feature::new("Darkvision", "See in the dark."));
        character.add_feature(Feature::new("Lucky", "Reroll ones."));
        assert_eq!(character.remove_feature(0).unwrap().name, "Darkvision");
        assert!(character.remove_feature(5).is_none());
        assert_eq!(character.features.len(), 1);
    }
}
