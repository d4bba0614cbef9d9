// crates/citysearch-core/src/instant.rs

//! The embedded hot tier: a few hundred popular US cities compiled into the
//! binary so the first keystroke has something to match against.

use crate::model::CitySet;
use crate::parse::{parse_dataset, DEFAULT_DELIMITER};
use once_cell::sync::Lazy;
use std::sync::Arc;

static EMBEDDED_CSV: &str = include_str!("../data/instant_cities.csv");

// Parsed once per process; every store shares the same snapshot.
static EMBEDDED_TIER: Lazy<Arc<CitySet>> =
    Lazy::new(|| Arc::new(parse_dataset(EMBEDDED_CSV, DEFAULT_DELIMITER).set));

/// The embedded instant tier.
///
/// ```rust
/// let tier = citysearch_core::instant::embedded_tier();
/// assert!(tier.get("Phoenix", "AZ").is_some());
/// ```
pub fn embedded_tier() -> Arc<CitySet> {
    Arc::clone(&EMBEDDED_TIER)
}
