// crates/citysearch-core/src/common.rs
use serde::{Deserialize, Serialize};

/// Simple aggregate statistics for one tier.
///
/// Returned by [`crate::CitySet::stats`], these counts reflect the
/// deduplicated in-memory snapshot, not the number of lines in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbStats {
    pub states: usize,
    pub cities: usize,
}
