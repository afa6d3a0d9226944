use serde::Serialize;
use std::collections::HashMap;

pub const UNKNOWN_ICONIC_TYPE: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesCountEntry {
    pub species_id: u64,
    pub observation_count: u64,
    pub iconic_type: String,
    pub quality_grade: String,
}

#[derive(Debug, Default, Clone)]
pub struct FrequencyTable {
    entries: HashMap<u64, SpeciesCountEntry>,
    total_observations: u64,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A re-emitted id overwrites the previous entry; the running total still counts both.
    pub fn upsert(&mut self, entry: SpeciesCountEntry) {
        self.total_observations = self.total_observations.saturating_add(entry.observation_count);
        self.entries.insert(entry.species_id, entry);
    }

    pub fn get(&self, species_id: u64) -> Option<&SpeciesCountEntry> {
        self.entries.get(&species_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_observations(&self) -> u64 {
        self.total_observations
    }

    pub fn entries(&self) -> impl Iterator<Item = &SpeciesCountEntry> {
        self.entries.values()
    }
}

impl FromIterator<SpeciesCountEntry> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = SpeciesCountEntry>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for entry in iter {
            table.upsert(entry);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedResult {
    pub display_name: String,
    pub species_id: u64,
    pub observation_count: u64,
    pub iconic_type: String,
    pub observation_link: String,
    pub image_url: String,
    pub quality_grade: String,
}
