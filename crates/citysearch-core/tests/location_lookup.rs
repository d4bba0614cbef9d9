// crates/citysearch-core/tests/location_lookup.rs
//
// End-to-end behavior of the store, index, and coordinator together.
// Time is paused so debounce windows elapse instantly and deterministically.

use async_trait::async_trait;
use citysearch_core::{
    CityError, CityIndex, CityRecord, CitySet, CitySource, CoordinatorSettings, QueryCoordinator,
    Result, SearchOptions, SearchUpdate, StaticSource, Tier, TieredCityStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

const DEBOUNCE: Duration = Duration::from_millis(300);
const LOAD_TIMEOUT: Duration = Duration::from_secs(15);

const FULL: &str = "\
id,state_code,state_name,city,county,latitude,longitude,population
1,TX,Texas,Austin,Travis,30.27,-97.74,961855
2,MA,Massachusetts,Boston,Suffolk,42.36,-71.06,675647
3,OR,Oregon,Boring,Clackamas,45.43,-122.37,
4,AZ,Arizona,Phoenix,Maricopa,33.45,-112.07,1608139
5,OR,Oregon,Phoenix,Jackson,42.27,-122.81,4475
6,TX,Texas,Austwell,Refugio,28.39,-96.84,
";

fn two_city_tier() -> Arc<CitySet> {
    Arc::new(CitySet::from_records([
        CityRecord::new("Austin", "TX"),
        CityRecord::new("Boston", "MA"),
    ]))
}

fn store(source: Arc<dyn CitySource>) -> TieredCityStore {
    TieredCityStore::with_instant(two_city_tier(), source, LOAD_TIMEOUT)
}

fn settings() -> CoordinatorSettings {
    CoordinatorSettings {
        debounce: DEBOUNCE,
        ..CoordinatorSettings::default()
    }
}

fn display(update: &SearchUpdate) -> Vec<String> {
    update.results.iter().map(|c| c.display_name()).collect()
}

async fn next(updates: &mut mpsc::UnboundedReceiver<SearchUpdate>) -> SearchUpdate {
    updates.recv().await.expect("coordinator stopped")
}

/// Waits long enough for any debounce or load to finish and asserts silence.
async fn assert_quiet(updates: &mut mpsc::UnboundedReceiver<SearchUpdate>) {
    let extra = tokio::time::timeout(Duration::from_secs(60), updates.recv()).await;
    assert!(extra.is_err(), "unexpected update: {extra:?}");
}

struct GatedSource {
    text: &'static str,
    gate: Notify,
    fetches: AtomicUsize,
}

impl GatedSource {
    fn new(text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            text,
            gate: Notify::new(),
            fetches: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CitySource for GatedSource {
    fn describe(&self) -> String {
        "gated".into()
    }

    async fn fetch_text(&self) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(self.text.to_string())
    }
}

#[derive(Default)]
struct FailingSource {
    fetches: AtomicUsize,
}

#[async_trait]
impl CitySource for FailingSource {
    fn describe(&self) -> String {
        "failing".into()
    }

    async fn fetch_text(&self) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Err(CityError::HttpStatus {
            url: "https://example.invalid/us_cities.csv".into(),
            status: 503,
        })
    }
}

#[tokio::test(start_paused = true)]
async fn instant_results_by_name_and_state_code() {
    let store = store(Arc::new(FailingSource::default()));
    let (coordinator, mut updates) = QueryCoordinator::spawn(store, settings());

    coordinator.submit("bo");
    let update = next(&mut updates).await;
    assert_eq!(update.tier, Tier::Instant);
    assert_eq!(display(&update), ["Boston, MA"]);

    coordinator.submit("TX");
    let update = next(&mut updates).await;
    assert_eq!(display(&update), ["Austin, TX"]);

    coordinator.submit("z");
    let update = next(&mut updates).await;
    assert_eq!(update.seq, 3);
    assert!(update.results.is_empty());

    assert_quiet(&mut updates).await;
}

#[tokio::test(start_paused = true)]
async fn upgrades_to_full_tier_for_same_query() {
    let store = store(Arc::new(StaticSource::new(FULL)));
    let (coordinator, mut updates) = QueryCoordinator::spawn(store.clone(), settings());

    coordinator.submit("bo");
    let first = next(&mut updates).await;
    assert_eq!((first.seq, first.tier), (1, Tier::Instant));
    assert_eq!(display(&first), ["Boston, MA"]);

    let second = next(&mut updates).await;
    assert_eq!((second.seq, second.tier), (1, Tier::Full));
    assert_eq!(second.query, "bo");
    assert_eq!(display(&second), ["Boston, MA", "Boring, OR"]);
    assert!(store.is_full_loaded());

    assert_quiet(&mut updates).await;
}

#[tokio::test(start_paused = true)]
async fn burst_of_keystrokes_yields_one_query() {
    let store = store(Arc::new(StaticSource::new(FULL)));
    let (coordinator, mut updates) = QueryCoordinator::spawn(store, settings());

    for typed in ["a", "au", "aus", "aust"] {
        coordinator.submit(typed);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let first = next(&mut updates).await;
    assert_eq!(first.seq, 4);
    assert_eq!(first.query, "aust");
    assert_eq!(first.tier, Tier::Instant);

    let second = next(&mut updates).await;
    assert_eq!((second.seq, second.tier), (4, Tier::Full));
    assert_eq!(display(&second), ["Austin, TX", "Austwell, TX"]);
}

#[tokio::test(start_paused = true)]
async fn slow_full_tier_never_overwrites_newer_query() {
    let source = GatedSource::new(FULL);
    let store = store(source.clone());
    let (coordinator, mut updates) = QueryCoordinator::spawn(store, settings());

    coordinator.submit("Pho");
    let pho = next(&mut updates).await;
    assert_eq!((pho.seq, pho.tier), (1, Tier::Instant));
    assert!(pho.results.is_empty());

    coordinator.submit("Aus");
    let aus = next(&mut updates).await;
    assert_eq!((aus.seq, aus.tier), (2, Tier::Instant));
    assert_eq!(display(&aus), ["Austin, TX"]);

    // The load started for "Pho" finishes only now; it must answer "Aus".
    source.gate.notify_one();
    let upgraded = next(&mut updates).await;
    assert_eq!((upgraded.seq, upgraded.tier), (2, Tier::Full));
    assert_eq!(upgraded.query, "Aus");
    assert_eq!(display(&upgraded), ["Austin, TX", "Austwell, TX"]);

    assert_quiet(&mut updates).await;
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn load_finishing_mid_debounce_goes_straight_to_full() {
    let source = GatedSource::new(FULL);
    let store = store(source.clone());
    let (coordinator, mut updates) = QueryCoordinator::spawn(store, settings());

    coordinator.submit("phoenix");
    assert_eq!(next(&mut updates).await.tier, Tier::Instant);

    coordinator.submit("phoenix, o");
    tokio::time::sleep(Duration::from_millis(100)).await;
    source.gate.notify_one();

    let update = next(&mut updates).await;
    assert_eq!((update.seq, update.tier), (2, Tier::Full));
    assert_eq!(display(&update), ["Phoenix, OR"]);
    assert_quiet(&mut updates).await;
}

#[tokio::test(start_paused = true)]
async fn full_tier_already_loaded_skips_instant() {
    let store = store(Arc::new(StaticSource::new(FULL)));
    store.ensure_full_loaded().await;

    let (coordinator, mut updates) = QueryCoordinator::spawn(store, settings());
    coordinator.submit("phoenix");

    let update = next(&mut updates).await;
    assert_eq!((update.seq, update.tier), (1, Tier::Full));
    assert_eq!(display(&update), ["Phoenix, AZ", "Phoenix, OR"]);
    assert_quiet(&mut updates).await;
}

#[tokio::test(start_paused = true)]
async fn failed_load_keeps_instant_results_and_retries() {
    let source = Arc::new(FailingSource::default());
    let store = store(source.clone());
    let (coordinator, mut updates) = QueryCoordinator::spawn(store.clone(), settings());

    coordinator.submit("bos");
    assert_eq!(next(&mut updates).await.tier, Tier::Instant);
    assert_quiet(&mut updates).await;
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

    coordinator.submit("bost");
    let update = next(&mut updates).await;
    assert_eq!(update.tier, Tier::Instant);
    assert_eq!(display(&update), ["Boston, MA"]);
    assert_quiet(&mut updates).await;
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    assert!(!store.is_full_loaded());
}

#[tokio::test(start_paused = true)]
async fn short_input_does_not_trigger_load() {
    let source = Arc::new(FailingSource::default());
    let store = store(source.clone());
    let (coordinator, mut updates) = QueryCoordinator::spawn(store, settings());

    coordinator.submit(" b ");
    let update = next(&mut updates).await;
    assert!(update.results.is_empty());
    assert_quiet(&mut updates).await;
    assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn session_state_filter_applies_to_both_tiers() {
    let store = store(Arc::new(StaticSource::new(FULL)));
    let settings = CoordinatorSettings {
        options: SearchOptions::in_state("Oregon"),
        ..settings()
    };
    let (coordinator, mut updates) = QueryCoordinator::spawn(store, settings);

    coordinator.submit("bo");
    let instant = next(&mut updates).await;
    assert!(instant.results.is_empty());

    let full = next(&mut updates).await;
    assert_eq!(full.tier, Tier::Full);
    assert_eq!(display(&full), ["Boring, OR"]);
}

#[tokio::test]
async fn concurrent_store_callers_share_one_fetch() {
    let source = GatedSource::new(FULL);
    let store = store(source.clone());

    let waiters: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.ensure_full_loaded().await })
        })
        .collect();
    while source.fetches.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    source.gate.notify_one();

    let mut sets = Vec::new();
    for waiter in waiters {
        sets.push(waiter.await.unwrap());
    }
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    assert!(sets.iter().all(|s| Arc::ptr_eq(s, &sets[0])));
    assert_eq!(sets[0].len(), 6);
}

#[test]
fn embedded_tier_searches_without_runtime() {
    let store = TieredCityStore::new(Arc::new(StaticSource::new("")));
    let index = CityIndex::new(store.instant_set());
    let hits = index.search("pho", 3, &SearchOptions::default());
    assert_eq!(hits[0].display_name(), "Phoenix, AZ");
    assert_eq!(hits[1].display_name(), "Phoenixville, PA");
}

#[tokio::test(start_paused = true)]
async fn settles_right_after_failed_load() {
    let store = store(Arc::new(FailingSource::default()));
    let (coordinator, mut updates) = QueryCoordinator::spawn(store, settings());

    coordinator.submit("bo");
    let started = tokio::time::Instant::now();
    coordinator.settled().await;
    // Only the debounce elapsed; nothing waited on the load timeout.
    assert!(started.elapsed() < LOAD_TIMEOUT);

    let update = updates.try_recv().unwrap();
    assert_eq!((update.seq, update.tier), (1, Tier::Instant));
    assert!(updates.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn settles_after_full_tier_upgrade() {
    let store = store(Arc::new(StaticSource::new(FULL)));
    let (coordinator, mut updates) = QueryCoordinator::spawn(store, settings());

    coordinator.settled().await;
    assert!(updates.try_recv().is_err());

    coordinator.submit("b");
    coordinator.submit("bo");
    coordinator.settled().await;

    let tiers: Vec<(u64, Tier)> = std::iter::from_fn(|| updates.try_recv().ok())
        .map(|u| (u.seq, u.tier))
        .collect();
    assert_eq!(tiers, [(2, Tier::Instant), (2, Tier::Full)]);
}
