//! citysearch-rs: workspace crate hosting demos; re-exports `citysearch-core`.

pub use citysearch_core::*;
