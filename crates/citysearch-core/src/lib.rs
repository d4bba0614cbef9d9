// crates/citysearch-core/src/lib.rs

//! # citysearch-core
//!
//! US city lookup with two data tiers:
//!
//! * an **instant** tier compiled into the binary, available with no I/O;
//! * a **full** tier fetched on first demand from a file or URL.
//!
//! [`TieredCityStore`] owns both tiers and coalesces loads, [`CityIndex`]
//! ranks matches, and [`QueryCoordinator`] turns a stream of keystrokes
//! into debounced, never-stale [`SearchUpdate`]s.
//!
//! ```
//! use citysearch_core::{CityIndex, SearchOptions, TieredCityStore};
//!
//! let store = TieredCityStore::from_config(&Default::default());
//! let index = CityIndex::new(store.instant_set());
//! let hits = index.search("phoenix", 5, &SearchOptions::default());
//! assert_eq!(hits[0].display_name(), "Phoenix, AZ");
//! ```

pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod index;
pub mod instant;
pub mod model;
pub mod parse;
pub mod prelude;
pub mod states;
pub mod store;
pub mod text;

// Re-exports
pub use crate::common::DbStats;
pub use crate::config::LookupConfig;
pub use crate::coordinator::{
    CoordinatorSettings, PendingQuery, QueryCoordinator, QuerySession, SearchUpdate, SessionPhase,
};
pub use crate::error::{CityError, Result};
pub use crate::fetch::{source_for, CitySource, FileSource, StaticSource};
#[cfg(feature = "http")]
pub use crate::fetch::HttpSource;
pub use crate::index::{CityHit, CityIndex, MatchKind, SearchOptions, MIN_QUERY_CHARS};
pub use crate::model::{CityKey, CityRecord, CitySet, Tier};
pub use crate::parse::{parse_dataset, ParseReport};
pub use crate::store::{LoadPhase, TieredCityStore};
pub use crate::text::{equals_folded, fold_key};
