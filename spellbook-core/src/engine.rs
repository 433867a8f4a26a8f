//! AbilityEngine - the primary public API.
//!
//! Owns the Library, Known and Loadout collections, the character sheet,
//! resources, and the roll log. One engine is one play session; it is not
//! meant to be shared across threads.

use crate::ability::AbilityRecord;
use crate::character::{Ability, Character};
use crate::dice::{
    DiceError, DiceExpression, RollEntry, RollHistory, RollResult, DEFAULT_HISTORY_CAP,
};
use crate::ingest::{parse_library, IngestError};
use crate::resources::{ResourceMode, Resources};
use crate::roster::Roster;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

/// Configuration for creating an engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of entries in the roll log.
    pub history_cap: usize,

    /// Starting (and maximum) maneuver dice.
    pub maneuver_dice: u32,

    /// Which resource abilities spend by default.
    pub resource_mode: ResourceMode,

    /// Fixed RNG seed for reproducible rolls.
    pub rng_seed: Option<u64>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            maneuver_dice: 4,
            resource_mode: ResourceMode::Spells,
            rng_seed: None,
        }
    }

    /// Set the roll log size.
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    /// Set the maneuver dice pool.
    pub fn with_maneuver_dice(mut self, dice: u32) -> Self {
        self.maneuver_dice = dice;
        self
    }

    /// Set the default resource mode.
    pub fn with_resource_mode(mut self, mode: ResourceMode) -> Self {
        self.resource_mode = mode;
        self
    }

    /// Seed the dice RNG.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Which collection an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Library,
    Known,
    Loadout,
}

/// The spellbook engine.
#[derive(Debug)]
pub struct AbilityEngine {
    pub(crate) library: Vec<AbilityRecord>,
    pub(crate) known: Roster,
    pub(crate) loadout: Roster,
    pub(crate) sources: Vec<String>,

    /// Character sheet. Fields may be edited directly.
    pub character: Character,

    /// Spell slots and maneuver dice.
    pub resources: Resources,

    pub mode: ResourceMode,

    history: RollHistory,
    rng: StdRng,
}

impl AbilityEngine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            library: Vec::new(),
            known: Roster::new(),
            loadout: Roster::new(),
            sources: Vec::new(),
            character: Character::default(),
            resources: Resources::new(config.maneuver_dice),
            mode: config.resource_mode,
            history: RollHistory::new(config.history_cap),
            rng,
        }
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Parse a library document and merge it into the Library.
    ///
    /// Returns how many records were added. A source label that was already
    /// ingested is skipped. New records whose name is already in the Library
    /// (or earlier in the same document) are dropped.
    pub fn ingest(&mut self, raw: &str, source: &str) -> Result<usize, IngestError> {
        if self.has_source(source) {
            tracing::debug!(source, "Library source already ingested, skipping");
            return Ok(0);
        }

        let parsed = parse_library(raw, source)?;
        let parsed_count = parsed.len();

        let mut seen: HashSet<String> = self.library.iter().map(|r| r.name.clone()).collect();
        let before = self.library.len();
        for record in parsed {
            if seen.insert(record.name.clone()) {
                self.library.push(record);
            }
        }
        self.sources.push(source.to_string());

        let added = self.library.len() - before;
        tracing::debug!(
            source,
            parsed = parsed_count,
            added,
            "Ingested library source"
        );
        Ok(added)
    }

    pub fn has_source(&self, source: &str) -> bool {
        self.sources.iter().any(|s| s == source)
    }

    /// Source labels in ingestion order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    // ========================================================================
    // Collections
    // ========================================================================

    pub fn library(&self) -> &[AbilityRecord] {
        &self.library
    }

    pub fn known(&self) -> &[AbilityRecord] {
        self.known.records()
    }

    pub fn loadout(&self) -> &[AbilityRecord] {
        self.loadout.records()
    }

    pub fn collection(&self, collection: Collection) -> &[AbilityRecord] {
        match collection {
            Collection::Library => self.library(),
            Collection::Known => self.known(),
            Collection::Loadout => self.loadout(),
        }
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    pub fn is_prepared(&self, name: &str) -> bool {
        self.loadout.contains(name)
    }

    /// Copy `record` into Known unless that name is already known.
    pub fn learn(&mut self, record: &AbilityRecord) -> bool {
        let added = self.known.insert(record.clone());
        if added {
            tracing::debug!(name = %record.name, "Learned ability");
        }
        added
    }

    /// Copy `record` into the Loadout unless that name is already prepared.
    pub fn prepare(&mut self, record: &AbilityRecord) -> bool {
        let added = self.loadout.insert(record.clone());
        if added {
            tracing::debug!(name = %record.name, "Prepared ability");
        }
        added
    }

    /// Alias for [`AbilityEngine::prepare`].
    pub fn add_to_loadout(&mut self, record: &AbilityRecord) -> bool {
        self.prepare(record)
    }

    /// Remove the Known record at `index`.
    pub fn forget(&mut self, index: usize) -> Option<AbilityRecord> {
        let removed = self.known.remove(index);
        if removed.is_none() {
            tracing::warn!(index, "No known ability at index");
        }
        removed
    }

    /// Alias for [`AbilityEngine::forget`].
    pub fn unlearn(&mut self, index: usize) -> Option<AbilityRecord> {
        self.forget(index)
    }

    /// Remove the Loadout record at `index`.
    pub fn remove_from_loadout(&mut self, index: usize) -> Option<AbilityRecord> {
        let removed = self.loadout.remove(index);
        if removed.is_none() {
            tracing::warn!(index, "No prepared ability at index");
        }
        removed
    }

    /// Add a hand-written spell to the Library. Names are not checked, so
    /// homebrew variants may share a name.
    pub fn add_custom_spell(
        &mut self,
        name: &str,
        level: u8,
        time_text: &str,
        range_text: &str,
        duration_text: &str,
        description: &str,
    ) -> &AbilityRecord {
        let record = AbilityRecord::custom_spell(
            name,
            level,
            time_text,
            range_text,
            duration_text,
            description,
        );
        self.push_custom(record)
    }

    /// Add a hand-written maneuver to the Library. Names are not checked.
    pub fn add_custom_maneuver(
        &mut self,
        name: &str,
        level: u8,
        resource_cost: &str,
        extra_info: &str,
        description: &str,
    ) -> &AbilityRecord {
        let record =
            AbilityRecord::custom_maneuver(name, level, resource_cost, extra_info, description);
        self.push_custom(record)
    }

    fn push_custom(&mut self, record: AbilityRecord) -> &AbilityRecord {
        tracing::debug!(name = %record.name, kind = %record.kind, "Added custom ability");
        let index = self.library.len();
        self.library.push(record);
        &self.library[index]
    }

    /// Records whose name contains `query` (case-insensitive), optionally
    /// restricted to one level. Indices are positions in the collection.
    pub fn search(
        &self,
        collection: Collection,
        query: &str,
        level: Option<u8>,
    ) -> Vec<(usize, &AbilityRecord)> {
        let query = query.trim().to_lowercase();
        self.collection(collection)
            .iter()
            .enumerate()
            .filter(|(_, r)| level.map_or(true, |l| r.level == l))
            .filter(|(_, r)| query.is_empty() || r.name.to_lowercase().contains(&query))
            .collect()
    }

    // ========================================================================
    // Character
    // ========================================================================

    pub fn spell_save_dc(&self) -> i32 {
        self.character.spell_save_dc()
    }

    pub fn passive_score(&self, skill: &str, governing: Ability) -> i32 {
        self.character.passive_score(skill, governing)
    }

    /// Heal (positive) or damage (negative), clamped to `0..=max`.
    pub fn apply_hp(&mut self, delta: i32) -> i32 {
        let current = self.character.apply_hp(delta);
        tracing::debug!(delta, current, "Applied HP change");
        current
    }

    /// Restore HP, refill slots that have a maximum, and refill dice.
    pub fn long_rest(&mut self) -> String {
        self.character.hp.restore();
        self.resources.restore_all();
        tracing::debug!("Long rest");
        format!(
            "Long rest complete. HP restored to {}/{}.",
            self.character.hp.current, self.character.hp.maximum
        )
    }

    // ========================================================================
    // Resources
    // ========================================================================

    pub fn cast(&mut self, level: u8) -> bool {
        self.resources.cast(level)
    }

    pub fn use_die(&mut self) -> bool {
        self.resources.use_die()
    }

    /// Spend the resource `record` costs under the current mode.
    pub fn use_resource_for(&mut self, record: &AbilityRecord) -> bool {
        self.resources.spend_for(record, self.mode)
    }

    // ========================================================================
    // Dice
    // ========================================================================

    /// Roll `count` dice with `sides` faces, add `modifier`, and log it.
    pub fn roll_dice(
        &mut self,
        sides: u32,
        count: u32,
        modifier: i32,
    ) -> Result<RollResult, DiceError> {
        let expr = DiceExpression::simple(sides, count, modifier)?;
        Ok(self.roll_expression(&expr))
    }

    /// Roll standard notation such as "2d6+3" and log it.
    pub fn roll_notation(&mut self, notation: &str) -> Result<RollResult, DiceError> {
        let expr = DiceExpression::parse(notation)?;
        Ok(self.roll_expression(&expr))
    }

    fn roll_expression(&mut self, expr: &DiceExpression) -> RollResult {
        let result = expr.roll_with_rng(&mut self.rng);
        tracing::debug!(formula = %result.formula, total = result.total, "Rolled dice");
        self.history.record(RollEntry::from_result(&result));
        result
    }

    pub fn history(&self) -> &RollHistory {
        &self.history
    }
}

impl Default for AbilityEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityKind, CUSTOM_SOURCE};
    use crate::testing::{sample_engine, MANEUVERS_JSON, SPELLS_JSON};

    fn seeded() -> AbilityEngine {
        AbilityEngine::new(EngineConfig::new().with_rng_seed(42))
    }

    #[test]
    fn test_reingest_same_source_is_noop() {
        let mut engine = seeded();
        let added = engine.ingest(SPELLS_JSON, "phb.json").unwrap();
        assert!(added > 0);
        let snapshot = engine.library().to_vec();

        assert_eq!(engine.ingest(SPELLS_JSON, "phb.json").unwrap(), 0);
        assert_eq!(engine.library(), snapshot.as_slice());
        assert_eq!(engine.sources(), &["phb.json".to_string()]);
    }

    #[test]
    fn test_merge_dedups_by_name_first_wins() {
        let mut engine = seeded();
        engine
            .ingest(r#"[{"name": "Fireball", "level": 3}]"#, "a.json")
            .unwrap();
        engine
            .ingest(
                r#"{"spell": [{"name": "Fireball", "level": 5}, {"name": "Sleep", "level": 1}]}"#,
                "b.json",
            )
            .unwrap();

        let fireballs: Vec<_> = engine
            .library()
            .iter()
            .filter(|r| r.name == "Fireball")
            .collect();
        assert_eq!(fireballs.len(), 1);
        assert_eq!(fireballs[0].level, 3);
        assert_eq!(fireballs[0].source_file, "a.json");
        assert_eq!(engine.library().len(), 2);
    }

    #[test]
    fn test_duplicates_within_one_document() {
        let mut engine = seeded();
        let added = engine
            .ingest(r#"[{"name": "Light"}, {"name": "Light", "level": 2}]"#, "dup")
            .unwrap();
        assert_eq!(added, 1);
    }

    #[test]
    fn test_bad_document_leaves_library_untouched() {
        let mut engine = sample_engine();
        let before = engine.library().to_vec();

        assert!(matches!(
            engine.ingest("\"hello\"", "str.json"),
            Err(IngestError::InvalidShape(_))
        ));
        assert!(matches!(
            engine.ingest("3.5", "num.json"),
            Err(IngestError::InvalidShape(_))
        ));
        assert!(matches!(
            engine.ingest("{oops", "broken.json"),
            Err(IngestError::Json(_))
        ));
        assert_eq!(engine.library(), before.as_slice());
        assert!(!engine.has_source("str.json"));
    }

    #[test]
    fn test_learn_and_prepare_are_unique() {
        let mut engine = sample_engine();
        let shield = engine.library()[1].clone();

        assert!(engine.learn(&shield));
        assert!(!engine.learn(&shield));
        assert_eq!(engine.known().len(), 1);

        assert!(engine.prepare(&shield));
        assert!(!engine.add_to_loadout(&shield));
        assert_eq!(engine.loadout().len(), 1);
    }

    #[test]
    fn test_transitions_copy_by_value() {
        let mut engine = sample_engine();
        let record = engine.library()[0].clone();
        engine.learn(&record);
        engine.prepare(&record);

        engine.library[0].description = "Edited".to_string();
        assert_ne!(engine.known()[0].description, "Edited");
        assert_ne!(engine.loadout()[0].description, "Edited");

        engine.forget(0);
        assert!(engine.known().is_empty());
        assert_eq!(engine.loadout().len(), 1);
    }

    #[test]
    fn test_remove_by_index_compacts() {
        let mut engine = sample_engine();
        let records: Vec<_> = engine.library()[..3].to_vec();
        for record in &records {
            engine.prepare(record);
        }

        let removed = engine.remove_from_loadout(0).unwrap();
        assert_eq!(removed.name, records[0].name);
        assert_eq!(engine.loadout()[0].name, records[1].name);
        assert!(engine.remove_from_loadout(10).is_none());
        assert!(engine.unlearn(0).is_none());
        assert!(engine.prepare(&records[0]));
    }

    #[test]
    fn test_custom_abilities_skip_name_guard() {
        let mut engine = seeded();
        engine.add_custom_spell("Frost Lance", 1, "1 action", "60 feet", "", "Cold.");
        let second = engine.add_custom_spell("Frost Lance", 2, "", "", "", "Colder.");
        assert_eq!(second.level, 2);
        assert_eq!(second.source_file, CUSTOM_SOURCE);

        let maneuver = engine.add_custom_maneuver("Feint", 0, "1 die", "Bonus action", "Trick.");
        assert_eq!(maneuver.kind, AbilityKind::Maneuver);
        assert_eq!(engine.library().len(), 3);
    }

    #[test]
    fn test_search() {
        let mut engine = sample_engine();
        engine.ingest(MANEUVERS_JSON, "maneuvers.json").unwrap();

        let hits = engine.search(Collection::Library, "FIRE", None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1.name, "Fireball");

        let cantrips = engine.search(Collection::Library, "", Some(0));
        assert!(cantrips.iter().all(|(_, r)| r.level == 0));
        assert!(!cantrips.is_empty());

        assert!(engine.search(Collection::Known, "", None).is_empty());
    }

    #[test]
    fn test_roll_dice_bounds_and_history() {
        let mut engine = seeded();
        for i in 0..50 {
            let result = engine.roll_dice(20, 3, 5).unwrap();
            assert!((8..=65).contains(&result.total));
            assert!(result.rolls.iter().all(|r| (1..=20).contains(r)));
            assert_eq!(engine.history().len(), (i + 1).min(20));
        }
        assert_eq!(engine.history().latest().unwrap().formula, "3d20+5");
    }

    #[test]
    fn test_seeded_rolls_repeat() {
        let mut a = seeded();
        let mut b = seeded();
        assert_eq!(
            a.roll_notation("4d6").unwrap().rolls,
            b.roll_notation("4d6").unwrap().rolls
        );
    }

    #[test]
    fn test_hp_and_long_rest() {
        let mut engine = seeded();
        engine.character.hp.current = 5;
        engine.character.hp.maximum = 10;
        assert_eq!(engine.apply_hp(50), 10);
        assert_eq!(engine.apply_hp(-100), 0);

        engine.resources.set_slot_max(1, 3);
        engine.cast(1);
        let message = engine.long_rest();
        assert!(message.contains("10/10"));
        assert_eq!(engine.character.hp.current, 10);
        assert_eq!(engine.resources.slots(1), 3);
    }

    #[test]
    fn test_use_resource_follows_mode() {
        let mut engine = AbilityEngine::new(
            EngineConfig::new()
                .with_maneuver_dice(1)
                .with_resource_mode(ResourceMode::Maneuvers),
        );
        let riposte = AbilityRecord::custom_maneuver("Riposte", 1, "1 die", "", "");
        assert!(engine.use_resource_for(&riposte));
        assert!(!engine.use_resource_for(&riposte));
        assert!(!engine.use_die());
    }
}
