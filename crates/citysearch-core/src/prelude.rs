//! citysearch prelude: bring common types into scope for demos.

pub use crate::config::LookupConfig;
pub use crate::coordinator::{CoordinatorSettings, QueryCoordinator, SearchUpdate};
pub use crate::error::{CityError, Result};
pub use crate::fetch::{source_for, CitySource, StaticSource};
pub use crate::index::{CityIndex, SearchOptions};
pub use crate::model::{CityRecord, CitySet, Tier};
pub use crate::states::{state_code, state_name};
pub use crate::store::TieredCityStore;
