// crates/citysearch-core/src/store.rs

//! # Tiered City Store
//!
//! Owns the instant and full tiers. The full tier is fetched at most once
//! at a time: the first caller flips the state to `Loading` under the lock
//! and spawns the load; everyone else (including the first caller) waits
//! on the same `watch` channel. Failures never escape: callers get the
//! instant tier back and the state returns to `Unloaded` for a later retry.

use crate::config::LookupConfig;
use crate::error::{CityError, Result};
use crate::fetch::{source_for, CitySource};
use crate::instant;
use crate::model::{CityRecord, CitySet, Tier};
use crate::parse::{parse_dataset, DEFAULT_DELIMITER};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const DEFAULT_LOAD_TIMEOUT: Duration =
    Duration::from_millis(crate::config::DEFAULT_LOAD_TIMEOUT_MS);

/// Lifecycle of the full tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Unloaded,
    Loading,
    Loaded,
}

#[derive(Clone)]
enum LoadOutcome {
    Loaded(Arc<CitySet>),
    Failed,
}

enum LoadState {
    Unloaded,
    Loading(watch::Receiver<Option<LoadOutcome>>),
    Loaded(Arc<CitySet>),
}

struct StoreInner {
    instant: Arc<CitySet>,
    source: Arc<dyn CitySource>,
    load_timeout: Duration,
    delimiter: char,
    state: Mutex<LoadState>,
}

/// Cheap-to-clone handle to the city tiers.
///
/// Construct one per process (or per test) and hand clones to every
/// consumer.
#[derive(Clone)]
pub struct TieredCityStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for TieredCityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCityStore")
            .field("source", &self.inner.source.describe())
            .field("instant", &self.inner.instant.len())
            .field("phase", &self.phase())
            .finish()
    }
}

impl TieredCityStore {
    /// Embedded instant tier, default timeout and delimiter.
    pub fn new(source: Arc<dyn CitySource>) -> Self {
        Self::with_instant(instant::embedded_tier(), source, DEFAULT_LOAD_TIMEOUT)
    }

    pub fn with_instant(
        instant: Arc<CitySet>,
        source: Arc<dyn CitySource>,
        load_timeout: Duration,
    ) -> Self {
        Self::build(instant, source, load_timeout, DEFAULT_DELIMITER)
    }

    pub fn from_config(config: &LookupConfig) -> Self {
        Self::build(
            instant::embedded_tier(),
            source_for(&config.dataset),
            config.load_timeout(),
            config.delimiter,
        )
    }

    fn build(
        instant: Arc<CitySet>,
        source: Arc<dyn CitySource>,
        load_timeout: Duration,
        delimiter: char,
    ) -> Self {
        if instant.is_empty() {
            warn!("instant tier is empty; searches return nothing until the full tier loads");
        }
        Self {
            inner: Arc::new(StoreInner {
                instant,
                source,
                load_timeout,
                delimiter,
                state: Mutex::new(LoadState::Unloaded),
            }),
        }
    }

    /// The resident hot tier. Never blocks, never fails.
    pub fn instant_cities(&self) -> &[CityRecord] {
        self.inner.instant.records()
    }

    pub fn instant_set(&self) -> Arc<CitySet> {
        Arc::clone(&self.inner.instant)
    }

    pub fn is_full_loaded(&self) -> bool {
        matches!(&*self.inner.lock_state(), LoadState::Loaded(_))
    }

    pub fn full_set(&self) -> Option<Arc<CitySet>> {
        match &*self.inner.lock_state() {
            LoadState::Loaded(set) => Some(Arc::clone(set)),
            _ => None,
        }
    }

    /// The best tier available right now.
    pub fn current(&self) -> (Tier, Arc<CitySet>) {
        match self.full_set() {
            Some(full) => (Tier::Full, full),
            None => (Tier::Instant, self.instant_set()),
        }
    }

    pub fn phase(&self) -> LoadPhase {
        match &*self.inner.lock_state() {
            LoadState::Unloaded => LoadPhase::Unloaded,
            LoadState::Loading(_) => LoadPhase::Loading,
            LoadState::Loaded(_) => LoadPhase::Loaded,
        }
    }

    pub fn source(&self) -> &Arc<dyn CitySource> {
        &self.inner.source
    }

    /// Loads the full tier once and returns it.
    ///
    /// Concurrent callers share one in-flight load. On failure or timeout
    /// this returns the instant tier and leaves the full tier unloaded, so
    /// the next call tries again.
    pub async fn ensure_full_loaded(&self) -> Arc<CitySet> {
        let mut rx = {
            let mut state = self.inner.lock_state();
            match &*state {
                LoadState::Loaded(set) => return Arc::clone(set),
                // A closed channel means the load task died without
                // publishing; fall through and start over.
                LoadState::Loading(rx) if rx.has_changed().is_ok() => rx.clone(),
                _ => {
                    let (tx, rx) = watch::channel(None);
                    *state = LoadState::Loading(rx.clone());
                    let inner = Arc::clone(&self.inner);
                    tokio::spawn(async move { inner.run_load(tx).await });
                    rx
                }
            }
        };

        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone(),
            Err(_) => None,
        };
        match outcome {
            Some(LoadOutcome::Loaded(set)) => set,
            _ => self.instant_set(),
        }
    }
}

impl StoreInner {
    fn lock_state(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_load(self: Arc<Self>, tx: watch::Sender<Option<LoadOutcome>>) {
        let origin = self.source.describe();
        let started = Instant::now();
        info!(source = %origin, "loading full city tier");

        let outcome = match tokio::time::timeout(self.load_timeout, self.source.fetch_text()).await {
            Ok(Ok(text)) => match build_full_tier(&text, &self.instant, self.delimiter) {
                Ok(full) => {
                    info!(
                        source = %origin,
                        cities = full.set.len(),
                        loaded = full.loaded_from_source,
                        skipped = full.skipped,
                        duplicates = full.duplicates,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "full city tier loaded"
                    );
                    LoadOutcome::Loaded(Arc::new(full.set))
                }
                Err(e) => {
                    warn!(source = %origin, error = %e, "rejected full city tier");
                    LoadOutcome::Failed
                }
            },
            Ok(Err(e)) => {
                warn!(source = %origin, error = %e, "failed to fetch full city tier");
                LoadOutcome::Failed
            }
            Err(_) => {
                warn!(
                    source = %origin,
                    timeout_ms = self.load_timeout.as_millis() as u64,
                    "timed out fetching full city tier"
                );
                LoadOutcome::Failed
            }
        };

        {
            let mut state = self.lock_state();
            *state = match &outcome {
                LoadOutcome::Loaded(set) => LoadState::Loaded(Arc::clone(set)),
                LoadOutcome::Failed => LoadState::Unloaded,
            };
        }
        debug!(source = %origin, "publishing full tier load outcome");
        tx.send_replace(Some(outcome));
    }
}

struct FullTier {
    set: CitySet,
    loaded_from_source: usize,
    skipped: usize,
    duplicates: usize,
}

/// Parses the dataset and folds the instant tier into it.
///
/// Parsed records missing a population (or coordinates) inherit them from
/// the matching instant record; instant records absent from the dataset
/// are appended, so the full tier never loses a city the instant tier had.
fn build_full_tier(text: &str, instant: &CitySet, delimiter: char) -> Result<FullTier> {
    let report = parse_dataset(text, delimiter);
    let loaded_from_source = report.set.len();
    if loaded_from_source == 0 {
        return Err(CityError::EmptyDataset);
    }
    let mut set = report.set;

    for hot in instant {
        let key = hot.key();
        match set.get_mut(&key) {
            Some(record) => {
                if record.population.is_none() {
                    record.population = hot.population;
                }
                if record.latitude.is_none() || record.longitude.is_none() {
                    record.latitude = hot.latitude;
                    record.longitude = hot.longitude;
                }
                if record.county.is_none() {
                    record.county = hot.county.clone();
                }
            }
            None => {
                set.insert(hot.clone());
            }
        }
    }

    Ok(FullTier {
        set,
        loaded_from_source,
        skipped: report.skipped,
        duplicates: report.duplicates,
    })
}
