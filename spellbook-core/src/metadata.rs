//! One-line display summaries for ability records.

use crate::ability::{AbilityKind, AbilityRecord};
use serde_json::Value;

/// Concentration segment appended to spell summaries.
pub const CONCENTRATION: &str = "🧠 Concentration";

/// "Cantrip" for level 0, "Level N" otherwise.
pub fn level_label(level: u8) -> String {
    if level == 0 {
        "Cantrip".to_string()
    } else {
        format!("Level {level}")
    }
}

/// Summarize a record as e.g. `✨ Level 3 | ⏳ 1 action | 🎯 150 feet`.
///
/// Maneuvers, and records without any spell-shaped timing or range data,
/// get a short `⚔️ Level N Maneuver` line. Malformed nested data falls back
/// to `{marker} {level} Ability`; this never fails.
pub fn describe_metadata(record: &AbilityRecord) -> String {
    let level = level_label(record.level);

    if record.kind == AbilityKind::Maneuver || !record.has_spell_shape() {
        return format!("{} {level} Maneuver", AbilityKind::Maneuver.marker());
    }

    spell_summary(record, &level)
        .unwrap_or_else(|| format!("{} {level} Ability", record.kind.marker()))
}

fn spell_summary(record: &AbilityRecord, level: &str) -> Option<String> {
    let mut segments = vec![format!("{} {level}", record.kind.marker())];

    if let Some(time) = casting_time(record)? {
        segments.push(format!("⏳ {time}"));
    }
    if let Some(range) = range_text(record)? {
        segments.push(format!("🎯 {range}"));
    }
    if needs_concentration(record) {
        segments.push(CONCENTRATION.to_string());
    }

    Some(segments.join(" | "))
}

/// Outer `None` means the data was malformed; inner `None` means absent.
fn casting_time(record: &AbilityRecord) -> Option<Option<String>> {
    if let Some(text) = &record.time_text {
        return Some(Some(text.clone()));
    }

    let first = match &record.time {
        Some(Value::Array(times)) => match times.first() {
            Some(first) => first,
            None => return Some(None),
        },
        _ => return Some(None),
    };

    let time = first.as_object()?;
    let number = scalar_text(time.get("number")?)?;
    let unit = time.get("unit")?.as_str()?;
    Some(Some(format!("{number} {unit}")))
}

fn range_text(record: &AbilityRecord) -> Option<Option<String>> {
    if let Some(text) = &record.range_text {
        return Some(Some(text.clone()));
    }

    let range = match &record.range {
        Some(Value::Object(range)) => range,
        _ => return Some(None),
    };

    let distance = match range.get("distance") {
        Some(distance) => distance.as_object()?,
        None => {
            let kind = range.get("type")?.as_str()?;
            return Some(Some(capitalize(kind)));
        }
    };

    let kind = distance.get("type").and_then(Value::as_str).unwrap_or("self");
    let text = match kind {
        "self" => "Self".to_string(),
        "touch" => "Touch".to_string(),
        _ => match distance.get("amount") {
            Some(amount) => {
                let amount = scalar_text(amount)?;
                let unit = distance.get("unit").and_then(Value::as_str).unwrap_or(kind);
                format!("{amount} {unit}")
            }
            None => capitalize(kind),
        },
    };
    Some(Some(text))
}

fn needs_concentration(record: &AbilityRecord) -> bool {
    let structured = record
        .duration
        .as_ref()
        .and_then(|d| d.get(0))
        .and_then(|d| d.get("concentration"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    structured
        || record
            .duration_text
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains("concentration"))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
