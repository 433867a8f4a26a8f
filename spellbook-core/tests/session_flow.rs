//! End-to-end tests for a play session: ingest, build a loadout, spend
//! resources, and carry the whole thing through a bundle.
//!
//! Run with: `RUST_LOG=spellbook_core=debug cargo test -p spellbook-core --test session_flow -- --nocapture`

use spellbook_core::character::Feature;
use spellbook_core::persist::{bundle_path, load_session, save_session};
use spellbook_core::testing::{sample_engine, MANEUVERS_JSON, SPELLS_JSON};
use spellbook_core::{
    describe_metadata, Ability, AbilityEngine, AbilityKind, Collection, EngineConfig,
    ResourceMode,
};
use tempfile::TempDir;

/// Route engine logs to the test output when RUST_LOG is set.
fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn built_session() -> AbilityEngine {
    let mut engine = sample_engine();
    engine.ingest(MANEUVERS_JSON, "maneuvers.json").unwrap();

    for name in ["Fireball", "Shield", "Riposte"] {
        let record = engine
            .library()
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .unwrap();
        engine.learn(&record);
    }
    let shield = engine.known()[1].clone();
    engine.prepare(&shield);

    engine.add_custom_spell("Frost Lance", 1, "1 action", "60 feet", "Instantaneous", "Cold.");
    engine.add_custom_maneuver("Feint", 0, "1 die", "Bonus action", "Trick the foe.");

    engine.resources.set_slot_max(1, 4);
    engine.resources.set_slot_max(2, 3);
    engine.resources.set_slot_max(3, 2);
    engine.character.proficiencies.insert("Insight".to_string());
    engine
        .character
        .features
        .push(Feature::new("Sculpt Spells", "Protect allies from evocations."));
    engine
}

#[test]
fn test_library_pipeline() {
    setup();
    let engine = built_session();

    // 5 spells, 3 maneuvers, 2 custom
    assert_eq!(engine.library().len(), 10);
    assert_eq!(engine.known().len(), 3);
    assert_eq!(engine.loadout().len(), 1);
    assert_eq!(engine.loadout()[0].name, "Shield");
    assert_eq!(
        engine.sources(),
        &["phb.json".to_string(), "maneuvers.json".to_string()]
    );

    let riposte = &engine.known()[2];
    assert_eq!(riposte.kind, AbilityKind::Maneuver);
    assert_eq!(riposte.resource_cost.as_deref(), Some("1 superiority die"));

    let trip = engine
        .search(Collection::Library, "trip", None)
        .first()
        .map(|(_, r)| (*r).clone())
        .unwrap();
    assert_eq!(trip.level, 2);
    assert_eq!(trip.description, "Knock the target prone.");
}

#[test]
fn test_metadata_for_every_record() {
    let engine = built_session();
    for record in engine.library() {
        let line = describe_metadata(record);
        assert!(!line.is_empty(), "{} has no metadata", record.name);
    }

    let lines: Vec<String> = engine.library().iter().map(describe_metadata).collect();
    assert_eq!(lines[0], "✨ Level 3 | ⏳ 1 action | 🎯 150 feet");
    assert_eq!(lines[1], "✨ Level 1 | ⏳ 1 reaction | 🎯 Self");
    assert_eq!(lines[2], "✨ Cantrip | ⏳ 1 action | 🎯 30 feet");
    assert_eq!(
        lines[3],
        "✨ Level 2 | ⏳ 1 action | 🎯 60 feet | 🧠 Concentration"
    );
    assert_eq!(lines[4], "✨ Level 1 | ⏳ 1 action | 🎯 Touch");
    assert_eq!(lines[5], "⚔️ Level 1 Maneuver");
}

#[test]
fn test_character_numbers() {
    let engine = built_session();
    // Level 5 with WIS 16: 8 + 3 + 3
    assert_eq!(engine.spell_save_dc(), 14);
    assert_eq!(engine.passive_score("Perception", Ability::Wisdom), 16);
    assert_eq!(engine.passive_score("Insight", Ability::Wisdom), 16);
    assert_eq!(engine.passive_score("Stealth", Ability::Dexterity), 12);
    assert_eq!(engine.character.saving_throw_bonus(Ability::Wisdom), 6);
}

#[test]
fn test_spending_and_resting() {
    let mut engine = built_session();
    let fireball = engine.known()[0].clone();

    assert!(engine.use_resource_for(&fireball));
    assert!(engine.use_resource_for(&fireball));
    assert!(!engine.use_resource_for(&fireball), "only two 3rd-level slots");

    engine.mode = ResourceMode::Maneuvers;
    for _ in 0..4 {
        assert!(engine.use_die());
    }
    assert!(!engine.use_die());

    engine.apply_hp(-30);
    assert_eq!(engine.character.hp.current, 0);

    let message = engine.long_rest();
    assert!(message.contains("24/24"));
    assert_eq!(engine.resources.slots(3), 2);
    assert_eq!(engine.resources.dice(), 4);
}

#[test]
fn test_bundle_round_trip() {
    setup();
    let mut engine = built_session();
    engine.resources.cast(2);
    engine.resources.set_dice_max(6);
    engine.use_die();
    engine.apply_hp(-7);
    engine.roll_dice(20, 1, 3).unwrap();

    let json = engine.export_json().unwrap();
    let mut restored = AbilityEngine::default();
    let report = restored.import_json(&json).unwrap();

    assert!(report.is_complete(), "{report:?}");
    assert_eq!(restored.library(), engine.library());
    assert_eq!(restored.known(), engine.known());
    assert_eq!(restored.loadout(), engine.loadout());
    assert_eq!(restored.character, engine.character);
    assert_eq!(restored.sources(), engine.sources());
    for level in 1..=9 {
        assert_eq!(restored.resources.slots(level), engine.resources.slots(level));
    }
    assert_eq!(restored.resources.dice(), engine.resources.dice());
    assert_eq!(restored.resources.dice(), 5);

    // Restored membership still enforces name uniqueness.
    let shield = restored.loadout()[0].clone();
    assert!(!restored.prepare(&shield));

    // Restored sources still make re-ingestion a no-op.
    assert_eq!(restored.ingest(SPELLS_JSON, "phb.json").unwrap(), 0);

    // Maxima travel too, so both engines rest back to the same pools.
    assert_eq!(restored.long_rest(), engine.long_rest());
    for level in 1..=9 {
        assert_eq!(restored.resources.slots(level), engine.resources.slots(level));
        assert_eq!(restored.resources.slot_max(level), engine.resources.slot_max(level));
    }
    assert_eq!(restored.resources.slots(2), 3);
    assert_eq!(restored.resources.dice(), 6);
    assert_eq!(restored.resources.dice_max(), engine.resources.dice_max());
}

#[test]
fn test_roll_history_cap() {
    let mut engine = AbilityEngine::new(EngineConfig::new().with_rng_seed(1));
    for _ in 0..25 {
        let result = engine.roll_dice(20, 3, 5).unwrap();
        assert!((8..=65).contains(&result.total));
    }
    assert_eq!(engine.history().len(), 20);
    assert!(engine.roll_dice(0, 1, 0).is_err());
    assert_eq!(engine.history().len(), 20);
}

#[tokio::test]
async fn test_save_and_load_file() {
    setup();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = bundle_path(temp_dir.path());

    let engine = built_session();
    save_session(&engine, &path)
        .await
        .expect("Save should succeed");
    assert!(path.exists());

    let mut restored = AbilityEngine::default();
    let report = load_session(&mut restored, &path)
        .await
        .expect("Load should succeed");

    assert!(report.is_complete());
    assert_eq!(restored.library(), engine.library());
    assert_eq!(restored.character.features[0].name, "Sculpt Spells");
}

#[tokio::test]
async fn test_load_missing_file_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut engine = AbilityEngine::default();
    let result = load_session(&mut engine, temp_dir.path().join("nope.json")).await;
    assert!(result.is_err());
}
