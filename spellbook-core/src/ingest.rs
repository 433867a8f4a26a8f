//! JSON library ingestion.
//!
//! Turns an uploaded library document into [`AbilityRecord`]s. Individual
//! entries never fail: bad levels become 0, missing names become "Unnamed",
//! and so on. Only a document that is not JSON, or whose top level cannot hold
//! a list of abilities, is rejected.

use crate::ability::{flatten_entries, AbilityKind, AbilityRecord, NO_DESCRIPTION, UNNAMED};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from parsing a library document.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Library is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Library must be a list of abilities or an object holding one, found {0}")]
    InvalidShape(&'static str),
}

/// Candidate description fields, in priority order.
const DESCRIPTION_FIELDS: [&str; 4] = ["entries", "description", "desc", "text"];

/// Object keys that wrap an ability list, checked after `spell`.
const WRAPPER_KEYS: [&str; 3] = ["spells", "maneuver", "maneuvers"];

/// Fields consumed into dedicated record slots.
const RESERVED_FIELDS: [&str; 11] = [
    "name",
    "level",
    "type",
    "time",
    "range",
    "duration",
    "time_text",
    "range_text",
    "duration_text",
    "resource_cost",
    "source_file",
];

/// Parse a library document into normalized records tagged with `source`.
pub fn parse_library(raw: &str, source: &str) -> Result<Vec<AbilityRecord>, IngestError> {
    let document: Value = serde_json::from_str(raw)?;
    let entries = ability_list(document)?;

    Ok(entries
        .into_iter()
        .map(|entry| normalize_entry(entry, source))
        .collect())
}

/// Locate the list of ability objects inside a document.
///
/// An object with a `name` is one ability. Otherwise a wrapper key is
/// preferred, then any field holding a list of objects.
fn ability_list(document: Value) -> Result<Vec<Value>, IngestError> {
    match document {
        Value::Array(items) => Ok(items),
        Value::Object(map) if map.keys().any(|key| key.eq_ignore_ascii_case("name")) => {
            Ok(vec![Value::Object(map)])
        }
        Value::Object(mut map) => {
            if let Some(spells) = map.remove("spell") {
                return match spells {
                    Value::Array(items) => Ok(items),
                    other => Err(IngestError::InvalidShape(shape_name(&other))),
                };
            }

            for key in WRAPPER_KEYS {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return Ok(items);
                }
            }

            let list_key = map
                .iter()
                .find(|(_, value)| is_object_list(value))
                .map(|(key, _)| key.clone());

            match list_key.and_then(|key| map.remove(&key)) {
                Some(Value::Array(items)) => Ok(items),
                _ => Ok(vec![Value::Object(map)]),
            }
        }
        other => Err(IngestError::InvalidShape(shape_name(&other))),
    }
}

fn is_object_list(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_object),
        _ => false,
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Normalize one ability entry. Never fails.
pub fn normalize_entry(entry: Value, source: &str) -> AbilityRecord {
    let fields = match entry {
        Value::Object(map) => fold_keys(map),
        other => {
            // Bare strings in a list are treated as names.
            let mut map = Map::new();
            if let Value::String(name) = other {
                map.insert("name".to_string(), Value::String(name));
            }
            map
        }
    };

    let mut record = AbilityRecord::new(
        coerce_name(fields.get("name")),
        coerce_level(fields.get("level")),
        infer_kind(&fields),
    );

    let description_key = DESCRIPTION_FIELDS
        .iter()
        .find(|key| fields.get(**key).is_some_and(|v| !v.is_null()));
    record.description = match description_key {
        Some(key) => flatten_entries(&fields[*key]),
        None => NO_DESCRIPTION.to_string(),
    };

    record.time = present(fields.get("time"));
    record.range = present(fields.get("range"));
    record.duration = present(fields.get("duration"));
    record.time_text = text_field(fields.get("time_text"));
    record.range_text = text_field(fields.get("range_text"));
    record.duration_text = text_field(fields.get("duration_text"));
    record.resource_cost = text_field(fields.get("resource_cost"));
    record.source_file = source.to_string();

    record.extra = fields
        .into_iter()
        .filter(|(key, _)| {
            !RESERVED_FIELDS.contains(&key.as_str()) && !DESCRIPTION_FIELDS.contains(&key.as_str())
        })
        .collect();

    record
}

/// Lowercase and trim every key. The first spelling of a folded key wins.
fn fold_keys(map: Map<String, Value>) -> Map<String, Value> {
    let mut folded = Map::new();
    for (key, value) in map {
        let key = key.trim().to_lowercase();
        if !folded.contains_key(&key) {
            folded.insert(key, value);
        }
    }
    folded
}

fn coerce_name(value: Option<&Value>) -> String {
    let name = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };

    if name.is_empty() {
        UNNAMED.to_string()
    } else {
        name
    }
}

/// Coerce a level to 0-9. Anything unusable becomes 0.
pub fn coerce_level(value: Option<&Value>) -> u8 {
    let level = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    };

    match level {
        Some(level @ 0..=9) => level as u8,
        _ => 0,
    }
}

fn infer_kind(fields: &Map<String, Value>) -> AbilityKind {
    if let Some(kind) = fields
        .get("type")
        .and_then(Value::as_str)
        .and_then(AbilityKind::from_label)
    {
        return kind;
    }

    if fields.get("resource_cost").is_some_and(|v| !v.is_null()) {
        AbilityKind::Maneuver
    } else {
        AbilityKind::Spell
    }
}

fn present(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

fn text_field(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}
