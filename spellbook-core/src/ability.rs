//! Normalized ability records.
//!
//! Spells and maneuvers arrive in many JSON shapes. Everything is folded into
//! [`AbilityRecord`] at ingestion time so the rest of the crate never looks at
//! the source schema again.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

/// Provenance tag for abilities created by hand.
pub const CUSTOM_SOURCE: &str = "Custom";

/// Name given to records that arrive without one.
pub const UNNAMED: &str = "Unnamed";

/// Description given to records with no description-like field.
pub const NO_DESCRIPTION: &str = "No description.";

/// Matches inline markup such as `{@damage 8d6}` or `{@spell fireball|phb}`.
static INLINE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{@\w+ ([^|}]*)[^}]*\}").expect("inline tag pattern is valid"));

/// Whether an ability is a spell or a martial maneuver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AbilityKind {
    #[default]
    Spell,
    Maneuver,
}

impl AbilityKind {
    pub fn name(&self) -> &'static str {
        match self {
            AbilityKind::Spell => "Spell",
            AbilityKind::Maneuver => "Maneuver",
        }
    }

    /// Display marker used at the start of metadata lines.
    pub fn marker(&self) -> &'static str {
        match self {
            AbilityKind::Spell => "✨",
            AbilityKind::Maneuver => "⚔️",
        }
    }

    /// Parse a free-form `type` value, e.g. "spell", "Maneuvers".
    pub fn from_label(label: &str) -> Option<AbilityKind> {
        let label = label.trim().to_lowercase();
        if label.starts_with("spell") {
            Some(AbilityKind::Spell)
        } else if label.starts_with("maneuver") || label.starts_with("manoeuvre") {
            Some(AbilityKind::Maneuver)
        } else {
            None
        }
    }
}

impl fmt::Display for AbilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn default_description() -> String {
    NO_DESCRIPTION.to_string()
}

/// A single spell or maneuver.
///
/// `name` is the identity key for Known/Loadout membership. The nested
/// `time`/`range`/`duration` values are kept exactly as the source provided
/// them; the `*_text` overrides take precedence when describing the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityRecord {
    pub name: String,

    #[serde(default)]
    pub level: u8,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(rename = "type", default)]
    pub kind: AbilityKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_text: Option<String>,

    /// Maneuver cost, e.g. "1 superiority die".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_cost: Option<String>,

    #[serde(default)]
    pub source_file: String,

    /// Source fields with no dedicated slot (school, components, classes...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AbilityRecord {
    /// Create a bare record with defaults for everything but name and level.
    pub fn new(name: impl Into<String>, level: u8, kind: AbilityKind) -> Self {
        Self {
            name: name.into(),
            level,
            description: default_description(),
            kind,
            time: None,
            range: None,
            duration: None,
            time_text: None,
            range_text: None,
            duration_text: None,
            resource_cost: None,
            source_file: String::new(),
            extra: Map::new(),
        }
    }

    /// Build a hand-authored spell.
    pub fn custom_spell(
        name: impl Into<String>,
        level: u8,
        time_text: &str,
        range_text: &str,
        duration_text: &str,
        description: impl Into<String>,
    ) -> Self {
        let mut record = Self::new(name, level, AbilityKind::Spell);
        record.time_text = non_blank(time_text);
        record.range_text = non_blank(range_text);
        record.duration_text = non_blank(duration_text);
        record.description = description.into();
        record.source_file = CUSTOM_SOURCE.to_string();
        record
    }

    /// Build a hand-authored maneuver.
    pub fn custom_maneuver(
        name: impl Into<String>,
        level: u8,
        resource_cost: &str,
        extra_info: &str,
        description: impl Into<String>,
    ) -> Self {
        let mut record = Self::new(name, level, AbilityKind::Maneuver);
        record.resource_cost = non_blank(resource_cost);
        if let Some(info) = non_blank(extra_info) {
            record.extra.insert("extra_info".to_string(), Value::String(info));
        }
        record.description = description.into();
        record.source_file = CUSTOM_SOURCE.to_string();
        record
    }

    pub fn is_custom(&self) -> bool {
        self.source_file == CUSTOM_SOURCE
    }

    /// Whether the record carries the nested shapes spell sources use.
    pub fn has_spell_shape(&self) -> bool {
        matches!(self.time, Some(Value::Array(_)))
            || matches!(self.range, Some(Value::Object(_)))
            || self.time_text.is_some()
            || self.range_text.is_some()
    }
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Remove `{@tag content|extra}` markup, keeping `content`.
pub fn strip_inline_tags(text: &str) -> String {
    INLINE_TAG.replace_all(text, "$1").into_owned()
}

/// Collapse a nested description value into plain text.
///
/// Strings pass through with inline tags stripped, lists are joined by
/// newlines, and objects recurse into `entries`, `text` or `items`.
pub fn flatten_entries(entry: &Value) -> String {
    match entry {
        Value::String(s) => strip_inline_tags(s),
        Value::Array(items) => items
            .iter()
            .map(flatten_entries)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => ["entries", "text", "items"]
            .iter()
            .find_map(|key| map.get(*key))
            .map(flatten_entries)
            .unwrap_or_else(|| entry.to_string()),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
