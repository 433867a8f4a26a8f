//! Spell and maneuver library engine for D&D 5e characters.
//!
//! This crate provides:
//! - Ingestion of heterogeneous spell/maneuver JSON into normalized records
//! - A Library → Known → Loadout pipeline keyed by ability name
//! - Character math (modifiers, proficiency, save DC, passive scores)
//! - Spell slot and maneuver dice tracking
//! - Dice rolling with a bounded history
//! - Whole-session export/import as a single JSON bundle
//!
//! # Quick Start
//!
//! ```ignore
//! use spellbook_core::{AbilityEngine, EngineConfig, describe_metadata};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = AbilityEngine::new(EngineConfig::new().with_history_cap(10));
//!
//!     let raw = std::fs::read_to_string("spells-phb.json")?;
//!     engine.ingest(&raw, "spells-phb.json")?;
//!
//!     let fireball = engine.library()[0].clone();
//!     println!("{}", describe_metadata(&fireball));
//!     engine.learn(&fireball);
//!     engine.prepare(&fireball);
//!
//!     let bundle = engine.export_json()?;
//!     std::fs::write("session.json", bundle)?;
//!     Ok(())
//! }
//! ```

pub mod ability;
pub mod character;
pub mod dice;
pub mod engine;
pub mod ingest;
pub mod metadata;
pub mod persist;
pub mod resources;
pub mod roster;
pub mod testing;

// Primary public API
pub use ability::{AbilityKind, AbilityRecord};
pub use character::{ability_modifier, proficiency_bonus, Ability, Character, Feature, Skill};
pub use dice::{DiceError, RollEntry, RollHistory, RollResult};
pub use engine::{AbilityEngine, Collection, EngineConfig};
pub use ingest::IngestError;
pub use metadata::describe_metadata;
pub use persist::{ImportError, ImportReport, PersistError, SessionBundle};
pub use resources::{ResourceMode, Resources};
