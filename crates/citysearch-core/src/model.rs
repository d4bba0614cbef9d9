// crates/citysearch-core/src/model.rs
use crate::common::DbStats;
use crate::text::fold_key;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One municipality.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub name: String,
    /// Two-letter postal code, always upper-case.
    pub state_code: String,
    pub state_name: String,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub population: Option<u32>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl CityRecord {
    /// Minimal record; the state name is filled from the US state table
    /// when the code is known.
    pub fn new(name: impl Into<String>, state_code: impl Into<String>) -> Self {
        let state_code = state_code.into().trim().to_ascii_uppercase();
        let state_name = crate::states::state_name(&state_code)
            .unwrap_or_default()
            .to_string();
        Self {
            name: name.into(),
            state_code,
            state_name,
            county: None,
            population: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    pub fn with_population(mut self, population: u32) -> Self {
        self.population = Some(population);
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state_code(&self) -> &str {
        &self.state_code
    }

    pub fn county(&self) -> Option<&str> {
        self.county.as_deref()
    }

    /// Canonical identity string, e.g. `"Phoenix, AZ"`.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.state_code)
    }

    /// Deduplication key: folded name plus upper-case state code.
    pub fn key(&self) -> CityKey {
        CityKey::new(&self.name, &self.state_code)
    }
}

impl fmt::Display for CityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.name, self.state_code)
    }
}

/// Identity of a city within a tier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CityKey {
    name: String,
    state_code: String,
}

impl CityKey {
    pub fn new(name: &str, state_code: &str) -> Self {
        Self {
            name: fold_key(name.trim()),
            state_code: state_code.trim().to_ascii_uppercase(),
        }
    }
}

/// Which partition of the dataset produced a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Small embedded list, resident from construction.
    Instant,
    /// Complete dataset, loaded once on demand.
    Full,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Instant => f.write_str("instant"),
            Tier::Full => f.write_str("full"),
        }
    }
}

/// An immutable tier snapshot.
///
/// Records keep insertion order. Duplicate `(name, state_code)` pairs are
/// dropped on insert, first occurrence wins. A per-state grouping backs
/// state-scoped queries without a full scan.
#[derive(Clone, Debug, Default)]
pub struct CitySet {
    records: Vec<CityRecord>,
    by_key: HashMap<CityKey, usize>,
    by_state: HashMap<String, Vec<usize>>,
}

impl CitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set, dropping later duplicates.
    pub fn from_records(records: impl IntoIterator<Item = CityRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.insert(record);
        }
        set
    }

    /// Adds a record unless its key is already present.
    ///
    /// Returns `false` for a duplicate.
    pub fn insert(&mut self, record: CityRecord) -> bool {
        let key = record.key();
        if self.by_key.contains_key(&key) {
            return false;
        }
        let pos = self.records.len();
        self.by_state
            .entry(record.state_code.clone())
            .or_default()
            .push(pos);
        self.by_key.insert(key, pos);
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CityRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CityRecord> {
        self.records.iter()
    }

    pub fn get(&self, name: &str, state_code: &str) -> Option<&CityRecord> {
        self.position(&CityKey::new(name, state_code))
            .map(|pos| &self.records[pos])
    }

    pub(crate) fn get_mut(&mut self, key: &CityKey) -> Option<&mut CityRecord> {
        let pos = self.position(key)?;
        self.records.get_mut(pos)
    }

    fn position(&self, key: &CityKey) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    /// Positions of every record in the given state (upper-case code).
    pub fn state_positions(&self, state_code: &str) -> &[usize] {
        self.by_state
            .get(state_code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Records in a state, in insertion order.
    pub fn in_state<'a>(&'a self, state_code: &str) -> impl Iterator<Item = &'a CityRecord> + 'a {
        let code = state_code.trim().to_ascii_uppercase();
        self.state_positions(&code)
            .iter()
            .map(move |&pos| &self.records[pos])
    }

    /// State codes present in this set with their city counts, sorted by code.
    pub fn state_counts(&self) -> Vec<(&str, usize)> {
        let mut out: Vec<(&str, usize)> = self
            .by_state
            .iter()
            .map(|(code, positions)| (code.as_str(), positions.len()))
            .collect();
        out.sort_unstable_by(|a, b| a.0.cmp(b.0));
        out
    }

    pub fn stats(&self) -> DbStats {
        DbStats {
            states: self.by_state.len(),
            cities: self.records.len(),
        }
    }
}

impl<'a> IntoIterator for &'a CitySet {
    type Item = &'a CityRecord;
    type IntoIter = std::slice::Iter<'a, CityRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<CityRecord> for CitySet {
    fn from_iter<I: IntoIterator<Item = CityRecord>>(iter: I) -> Self {
        Self::from_records(iter)
    }
}
