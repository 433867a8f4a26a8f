//! Name-unique record collections for Known and Loadout.

use crate::ability::AbilityRecord;
use std::collections::HashSet;

/// An ordered list of records where each name appears at most once.
///
/// Records are owned copies; editing a library row never reaches a roster.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    records: Vec<AbilityRecord>,
    names: HashSet<String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records, keeping the first of any repeated name.
    pub fn from_records(records: impl IntoIterator<Item = AbilityRecord>) -> Self {
        let mut roster = Self::new();
        for record in records {
            roster.insert(record);
        }
        roster
    }

    /// Append `record` unless its name is already present.
    pub fn insert(&mut self, record: AbilityRecord) -> bool {
        if self.names.contains(&record.name) {
            return false;
        }
        self.names.insert(record.name.clone());
        self.records.push(record);
        true
    }

    /// Remove by position; later records shift down.
    pub fn remove(&mut self, index: usize) -> Option<AbilityRecord> {
        if index >= self.records.len() {
            return None;
        }
        let record = self.records.remove(index);
        self.names.remove(&record.name);
        Some(record)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn records(&self) -> &[AbilityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
