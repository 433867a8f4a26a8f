//! Testing utilities.
//!
//! Sample library documents in the shapes real uploads use, and a
//! pre-populated engine for scenario tests.

use crate::character::{Ability, AbilityScores, HitPoints};
use crate::engine::{AbilityEngine, EngineConfig};

/// A `{"spell": [...]}` document in the nested 5e-tools style.
pub const SPELLS_JSON: &str = r#"{
  "spell": [
    {
      "name": "Fireball",
      "level": 3,
      "school": "V",
      "time": [{"number": 1, "unit": "action"}],
      "range": {"type": "point", "distance": {"type": "feet", "amount": 150}},
      "duration": [{"type": "instant"}],
      "entries": [
        "A bright streak flashes from your pointing finger.",
        "Each creature takes {@damage 8d6} fire damage."
      ]
    },
    {
      "name": "Shield",
      "level": 1,
      "time": [{"number": 1, "unit": "reaction", "condition": "when you are hit"}],
      "range": {"type": "point", "distance": {"type": "self"}},
      "duration": [{"type": "timed", "duration": {"type": "round", "amount": 1}}],
      "entries": ["An invisible barrier of magical force appears."]
    },
    {
      "name": "Mage Hand",
      "level": 0,
      "time": [{"number": 1, "unit": "action"}],
      "range": {"type": "point", "distance": {"type": "feet", "amount": 30}},
      "entries": ["A spectral, floating hand appears."]
    },
    {
      "name": "Hold Person",
      "level": 2,
      "time": [{"number": 1, "unit": "action"}],
      "range": {"type": "point", "distance": {"type": "feet", "amount": 60}},
      "duration": [{"type": "timed", "concentration": true}],
      "entries": [
        "Choose a humanoid that you can see within range.",
        {"type": "entries", "name": "At Higher Levels", "entries": ["Target one more humanoid."]}
      ]
    },
    {
      "name": "Cure Wounds",
      "level": "1",
      "time": [{"number": 1, "unit": "action"}],
      "range": {"type": "point", "distance": {"type": "touch"}},
      "entries": ["A creature you touch regains {@dice 1d8} hit points."]
    }
  ]
}"#;

/// A bare list of flat maneuver objects with override text fields.
pub const MANEUVERS_JSON: &str = r#"[
  {
    "Name": "Riposte",
    "Level": 1,
    "Type": "Maneuver",
    "Resource_Cost": "1 superiority die",
    "Desc": "When a creature misses you with a melee attack, strike back."
  },
  {
    "name": "Trip Attack",
    "level": "2",
    "resource_cost": "1 superiority die",
    "description": "Knock the target {@condition prone|phb}."
  },
  {
    "name": "Precision Attack",
    "text": "Add the die to an attack roll."
  }
]"#;

/// Engine with [`SPELLS_JSON`] ingested as "phb.json" and a level 5
/// Wisdom caster.
pub fn sample_engine() -> AbilityEngine {
    let mut engine = AbilityEngine::new(EngineConfig::new().with_rng_seed(7));
    if let Err(e) = engine.ingest(SPELLS_JSON, "phb.json") {
        panic!("sample library should parse: {e}");
    }

    let character = &mut engine.character;
    character.stats = AbilityScores::new(8, 14, 13, 10, 16, 12);
    character.hp = HitPoints::new(24);
    character.ac = 15;
    character.level = 5;
    character.casting_stat = Ability::Wisdom;
    character.proficiencies.insert("Perception".to_string());
    character.save_profs.insert(Ability::Wisdom);
    engine
}
