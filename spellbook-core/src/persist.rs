//! Session bundle export/import.
//!
//! The whole session (collections, resources, character sheet) travels as
//! one JSON object. Import is tolerant: a missing or `null` top-level key
//! leaves that part of the engine alone, and a section that fails to parse
//! is skipped and reported without blocking the others.

use crate::ability::AbilityRecord;
use crate::character::{Ability, Feature};
use crate::engine::AbilityEngine;
use crate::resources::MAX_SLOT_LEVEL;
use crate::roster::Roster;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Default file name for exported bundles.
pub const BUNDLE_FILE_NAME: &str = "5e_session_bundle.json";

/// Errors from importing a bundle.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Bundle is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bundle must be a JSON object")]
    NotAnObject,
}

/// Errors from reading or writing bundle files.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),
}

/// Slot and dice counters, `{"Slots": {"lvl_1": 2, ...}, "Dice": 4}`.
///
/// `SlotMax` and `DiceMax` carry the long-rest maxima in the same shapes.
/// Bundles without them keep the engine's own maxima.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResourceSection {
    #[serde(rename = "Slots")]
    pub slots: Option<BTreeMap<String, u32>>,
    #[serde(rename = "Dice")]
    pub dice: Option<u32>,
    #[serde(rename = "SlotMax", skip_serializing_if = "Option::is_none")]
    pub slot_max: Option<BTreeMap<String, u32>>,
    #[serde(rename = "DiceMax", skip_serializing_if = "Option::is_none")]
    pub dice_max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HpSection {
    pub current: Option<i32>,
    pub max: Option<i32>,
}

/// Character sheet fields. Every field is optional on import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CharacterSection {
    pub stats: Option<BTreeMap<String, i32>>,
    pub hp: Option<HpSection>,
    pub ac: Option<i32>,
    pub level: Option<i32>,
    pub proficiencies: Option<Vec<String>>,
    pub save_profs: Option<Vec<String>>,
    pub cast_stat: Option<String>,
}

/// A full session snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBundle {
    pub res: ResourceSection,
    pub library: Option<Vec<AbilityRecord>>,
    pub known: Option<Vec<AbilityRecord>>,
    pub loadout: Option<Vec<AbilityRecord>>,
    pub features: Vec<Feature>,
    pub character: CharacterSection,
    /// Ingested library source labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl SessionBundle {
    /// Snapshot an engine. An empty Library is recorded as `null`.
    pub fn from_engine(engine: &AbilityEngine) -> Self {
        let resources = &engine.resources;
        let slots = resources
            .slot_levels()
            .map(|(level, remaining)| (slot_key(level), remaining))
            .collect();
        let slot_max = resources
            .slot_levels()
            .map(|(level, _)| (slot_key(level), resources.slot_max(level)))
            .collect();

        let ch = &engine.character;
        let stats = Ability::all()
            .into_iter()
            .map(|a| (a.abbreviation().to_string(), ch.stats.get(a)))
            .collect();

        Self {
            res: ResourceSection {
                slots: Some(slots),
                dice: Some(resources.dice()),
                slot_max: Some(slot_max),
                dice_max: Some(resources.dice_max()),
            },
            library: (!engine.library().is_empty()).then(|| engine.library().to_vec()),
            known: Some(engine.known().to_vec()),
            loadout: Some(engine.loadout().to_vec()),
            features: ch.features.clone(),
            character: CharacterSection {
                stats: Some(stats),
                hp: Some(HpSection {
                    current: Some(ch.hp.current),
                    max: Some(ch.hp.maximum),
                }),
                ac: Some(ch.ac),
                level: Some(ch.level),
                proficiencies: Some(ch.proficiencies.iter().cloned().collect()),
                save_profs: Some(
                    ch.save_profs
                        .iter()
                        .map(|a| a.abbreviation().to_string())
                        .collect(),
                ),
                cast_stat: Some(ch.casting_stat.abbreviation().to_string()),
            },
            sources: engine.sources().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = self.to_json()?;
        fs::write(path, content).await?;
        Ok(())
    }
}

fn slot_key(level: u8) -> String {
    format!("lvl_{level}")
}

fn parse_slot_key(key: &str) -> Option<u8> {
    key.strip_prefix("lvl_")?
        .parse::<u8>()
        .ok()
        .filter(|l| (1..=MAX_SLOT_LEVEL).contains(l))
}

/// A top-level section that could not be restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSection {
    pub section: String,
    pub reason: String,
}

/// What an import restored and what it had to leave alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Sections that replaced engine state.
    pub applied: Vec<String>,
    /// Sections present in the bundle but unusable.
    pub skipped: Vec<SkippedSection>,
    /// Individual ability records dropped from otherwise valid collections.
    pub dropped_records: usize,
}

impl ImportReport {
    /// True when nothing was skipped or dropped.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.dropped_records == 0
    }

    fn skip(&mut self, section: &str, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(section, reason = %reason, "Skipping bundle section");
        self.skipped.push(SkippedSection {
            section: section.to_string(),
            reason,
        });
    }
}

/// Remove and decode `key`. Absent or null yields `None` silently.
fn take_section<T: DeserializeOwned>(
    root: &mut Map<String, Value>,
    key: &str,
    report: &mut ImportReport,
) -> Option<T> {
    match root.remove(key)? {
        Value::Null => None,
        value => match serde_json::from_value(value) {
            Ok(section) => Some(section),
            Err(e) => {
                report.skip(key, e.to_string());
                None
            }
        },
    }
}

/// Decode a record list element by element, dropping bad records.
fn take_records(
    root: &mut Map<String, Value>,
    key: &str,
    report: &mut ImportReport,
) -> Option<Vec<AbilityRecord>> {
    let items = match root.remove(key)? {
        Value::Null => return None,
        Value::Array(items) => items,
        _ => {
            report.skip(key, "expected a list of abilities");
            return None;
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<AbilityRecord>(item) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(section = key, error = %e, "Dropping malformed ability record");
                report.dropped_records += 1;
            }
        }
    }
    Some(records)
}

impl AbilityEngine {
    /// Snapshot the session.
    pub fn export_bundle(&self) -> SessionBundle {
        SessionBundle::from_engine(self)
    }

    /// Snapshot the session as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String, PersistError> {
        Ok(self.export_bundle().to_json()?)
    }

    /// Restore from bundle JSON text.
    pub fn import_json(&mut self, raw: &str) -> Result<ImportReport, ImportError> {
        let value: Value = serde_json::from_str(raw)?;
        self.import_value(value)
    }

    /// Restore from an already-parsed bundle.
    ///
    /// Every section is decoded before any state changes, so a bad section
    /// never leaves a half-applied neighbour behind.
    pub fn import_value(&mut self, value: Value) -> Result<ImportReport, ImportError> {
        let Value::Object(mut root) = value else {
            return Err(ImportError::NotAnObject);
        };

        let mut report = ImportReport::default();
        let res: Option<ResourceSection> = take_section(&mut root, "res", &mut report);
        let library = take_records(&mut root, "library", &mut report);
        let known = take_records(&mut root, "known", &mut report);
        let loadout = take_records(&mut root, "loadout", &mut report);
        let features: Option<Vec<Feature>> = take_section(&mut root, "features", &mut report);
        let character: Option<CharacterSection> =
            take_section(&mut root, "character", &mut report);
        let sources: Option<Vec<String>> = take_section(&mut root, "sources", &mut report);
        let filename: Option<String> = take_section(&mut root, "filename", &mut report);

        if let Some(res) = res {
            self.apply_resources(res);
            report.applied.push("res".to_string());
        }
        if let Some(records) = library {
            self.library = records;
            self.sources = match sources {
                Some(sources) => sources,
                None => {
                    let mut rebuilt = sources_of(&self.library);
                    let filename = filename.filter(|n| !n.is_empty() && !rebuilt.contains(n));
                    if let Some(name) = filename {
                        rebuilt.insert(0, name);
                    }
                    rebuilt
                }
            };
            report.applied.push("library".to_string());
        } else if let Some(sources) = sources {
            self.sources = sources;
        }
        if let Some(records) = known {
            self.known = Roster::from_records(records);
            report.applied.push("known".to_string());
        }
        if let Some(records) = loadout {
            self.loadout = Roster::from_records(records);
            report.applied.push("loadout".to_string());
        }
        if let Some(features) = features {
            self.character.features = features;
            report.applied.push("features".to_string());
        }
        if let Some(character) = character {
            self.apply_character(character);
            report.applied.push("character".to_string());
        }

        tracing::debug!(
            applied = ?report.applied,
            skipped = report.skipped.len(),
            dropped = report.dropped_records,
            "Imported session bundle"
        );
        Ok(report)
    }

    /// Maxima go first since setting one also fills its counter.
    fn apply_resources(&mut self, res: ResourceSection) {
        for (key, maximum) in res.slot_max.unwrap_or_default() {
            match parse_slot_key(&key) {
                Some(level) => self.resources.set_slot_max(level, maximum),
                None => tracing::warn!(key = %key, "Ignoring unknown slot key"),
            }
        }
        if let Some(maximum) = res.dice_max {
            self.resources.set_dice_max(maximum);
        }
        for (key, remaining) in res.slots.unwrap_or_default() {
            match parse_slot_key(&key) {
                Some(level) => self.resources.set_slots(level, remaining),
                None => tracing::warn!(key = %key, "Ignoring unknown slot key"),
            }
        }
        if let Some(dice) = res.dice {
            self.resources.set_dice(dice);
        }
    }

    fn apply_character(&mut self, section: CharacterSection) {
        let ch = &mut self.character;

        for (key, score) in section.stats.unwrap_or_default() {
            match Ability::from_key(&key) {
                Some(ability) => ch.stats.set(ability, score),
                None => tracing::warn!(key = %key, "Ignoring unknown ability score"),
            }
        }
        if let Some(hp) = section.hp {
            if let Some(max) = hp.max {
                ch.hp.maximum = max;
            }
            if let Some(current) = hp.current {
                ch.hp.current = current;
            }
        }
        if let Some(ac) = section.ac {
            ch.ac = ac;
        }
        if let Some(level) = section.level {
            ch.level = level;
        }
        if let Some(proficiencies) = section.proficiencies {
            ch.proficiencies = proficiencies.into_iter().collect();
        }
        if let Some(save_profs) = section.save_profs {
            ch.save_profs = save_profs
                .iter()
                .filter_map(|key| Ability::from_key(key))
                .collect();
        }
        if let Some(stat) = section.cast_stat.as_deref().and_then(Ability::from_key) {
            ch.casting_stat = stat;
        }
    }
}

/// Distinct non-custom provenance labels, in first-seen order.
fn sources_of(records: &[AbilityRecord]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for record in records {
        let source = &record.source_file;
        if !source.is_empty() && !record.is_custom() && !sources.contains(source) {
            sources.push(source.clone());
        }
    }
    sources
}

/// Write the engine's bundle to `path`.
pub async fn save_session(
    engine: &AbilityEngine,
    path: impl AsRef<Path>,
) -> Result<(), PersistError> {
    engine.export_bundle().save_json(path).await
}

/// Read a bundle file into `engine`.
pub async fn load_session(
    engine: &mut AbilityEngine,
    path: impl AsRef<Path>,
) -> Result<ImportReport, PersistError> {
    let content = fs::read_to_string(path).await?;
    Ok(engine.import_json(&content)?)
}

/// Default bundle location inside `dir`.
pub fn bundle_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(BUNDLE_FILE_NAME)
}
