// crates/citysearch-core/src/index.rs

//! # City Index
//!
//! Ranked lookup over one tier. Search keys are folded once at build time
//! so a query only folds its own text.

use crate::model::{CityRecord, CitySet};
use crate::states;
use crate::text::{fold_key, is_state_code_shape, query_len};
use std::cmp::Ordering;
use std::sync::Arc;

/// Queries shorter than this (after trimming) return nothing.
pub const MIN_QUERY_CHARS: usize = 2;

/// Restrictions applied before matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Only consider cities in this state. Accepts `"TX"` or `"Texas"`.
    pub state_code: Option<String>,
}

impl SearchOptions {
    pub fn in_state(state: impl Into<String>) -> Self {
        Self {
            state_code: Some(state.into()),
        }
    }
}

/// How a record matched. Declaration order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// Folded name equals the query.
    Exact,
    /// Name starts with the query.
    Prefix,
    /// Name, display name, or county contains the query, or the query is
    /// the state code.
    Substring,
}

/// A borrowed search result.
#[derive(Debug, Clone, Copy)]
pub struct CityHit<'a> {
    pub record: &'a CityRecord,
    pub kind: MatchKind,
}

struct SearchKeys {
    name: String,
    display: String,
    county: Option<String>,
}

/// Search structure over one tier snapshot. Never mutates the records.
pub struct CityIndex {
    set: Arc<CitySet>,
    keys: Vec<SearchKeys>,
}

impl std::fmt::Debug for CityIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CityIndex")
            .field("cities", &self.set.len())
            .finish()
    }
}

impl CityIndex {
    pub fn new(set: Arc<CitySet>) -> Self {
        let keys = set
            .iter()
            .map(|c| SearchKeys {
                name: fold_key(&c.name),
                display: fold_key(&c.display_name()),
                county: c.county.as_deref().map(fold_key),
            })
            .collect();
        Self { set, keys }
    }

    pub fn set(&self) -> &Arc<CitySet> {
        &self.set
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Ranked, owned results; at most `limit` of them.
    pub fn search(&self, query: &str, limit: usize, opts: &SearchOptions) -> Vec<CityRecord> {
        self.search_hits(query, limit, opts)
            .into_iter()
            .map(|hit| hit.record.clone())
            .collect()
    }

    /// Ranked hits with their match kind.
    pub fn search_hits(&self, query: &str, limit: usize, opts: &SearchOptions) -> Vec<CityHit<'_>> {
        let raw = query.trim();
        if limit == 0 || query_len(raw) < MIN_QUERY_CHARS {
            return Vec::new();
        }
        let q = fold_key(raw);
        let state_query = is_state_code_shape(raw).then(|| raw.to_ascii_uppercase());

        let mut hits: Vec<CityHit<'_>> = match &opts.state_code {
            Some(state) => {
                // Unknown states match nothing rather than everything.
                let Some(code) = resolve_state(state) else {
                    return Vec::new();
                };
                self.set
                    .state_positions(&code)
                    .iter()
                    .filter_map(|&pos| self.match_at(pos, &q, state_query.as_deref()))
                    .collect()
            }
            None => (0..self.keys.len())
                .filter_map(|pos| self.match_at(pos, &q, state_query.as_deref()))
                .collect(),
        };

        hits.sort_by(rank);
        hits.truncate(limit);
        hits
    }

    /// Resolves a previously selected `"Name, ST"` value to its record.
    pub fn find_by_display_name(&self, display: &str) -> Option<&CityRecord> {
        let (name, state) = display.rsplit_once(',')?;
        self.set.get(name.trim(), state.trim())
    }

    fn match_at(&self, pos: usize, q: &str, state_query: Option<&str>) -> Option<CityHit<'_>> {
        let keys = &self.keys[pos];
        let record = &self.set.records()[pos];

        let kind = if keys.name == q {
            MatchKind::Exact
        } else if keys.name.starts_with(q) {
            MatchKind::Prefix
        } else if keys.name.contains(q)
            || keys.display.contains(q)
            || keys.county.as_deref().is_some_and(|c| c.contains(q))
            || state_query.is_some_and(|s| record.state_code == s)
        {
            MatchKind::Substring
        } else {
            return None;
        };
        Some(CityHit { record, kind })
    }
}

fn resolve_state(state: &str) -> Option<String> {
    match states::state_code(state) {
        Some(code) => Some(code.to_string()),
        // Territories outside the table are still usable by raw code.
        None if is_state_code_shape(state.trim()) => Some(state.trim().to_ascii_uppercase()),
        None => None,
    }
}

/// Match class, then population (known before unknown, larger first),
/// then name, then state code.
fn rank(a: &CityHit<'_>, b: &CityHit<'_>) -> Ordering {
    a.kind
        .cmp(&b.kind)
        .then_with(|| match (a.record.population, b.record.population) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.record.name.cmp(&b.record.name))
        .then_with(|| a.record.state_code.cmp(&b.record.state_code))
}
