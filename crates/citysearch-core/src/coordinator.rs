// crates/citysearch-core/src/coordinator.rs

//! # Query Coordinator
//!
//! The caller-facing side of city search for interactive inputs.
//!
//! ```text
//! submit("pho") ──► Debouncing ──(quiet for `debounce`)──► Querying
//!                                                     │
//!                     instant index ◄─────────────────┤ full tier not loaded
//!                     emit(seq, Instant)              │
//!                     ensure_full_loaded() ──► re-run current input
//!                                                     ▼
//!                                             emit(seq, Full) ──► Settled
//! ```
//!
//! Every update carries the sequence number of the input that produced it.
//! [`QuerySession`] refuses anything older than what it already emitted,
//! so a slow full-tier answer for an old input can never replace a newer
//! one.

use crate::config::LookupConfig;
use crate::index::{CityIndex, SearchOptions};
use crate::model::{CityRecord, Tier};
use crate::store::TieredCityStore;
use crate::text::query_len;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Knobs for one coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorSettings {
    pub debounce: Duration,
    pub min_query_chars: usize,
    pub limit: usize,
    pub options: SearchOptions,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from(&LookupConfig::default())
    }
}

impl From<&LookupConfig> for CoordinatorSettings {
    fn from(config: &LookupConfig) -> Self {
        Self {
            debounce: config.debounce(),
            min_query_chars: config.min_query_chars,
            limit: config.result_limit,
            options: SearchOptions::default(),
        }
    }
}

/// One emitted result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchUpdate {
    /// Sequence number of the submission that produced this result.
    pub seq: u64,
    /// The raw input that was searched.
    pub query: String,
    pub tier: Tier,
    pub results: Vec<CityRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Debouncing,
    Querying,
    Settled,
}

/// A submission whose debounce window has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub seq: u64,
    pub input: String,
}

/// Per-session state machine, driven by explicit timestamps.
///
/// Holds no city data and does no I/O, so it can be stepped by hand.
#[derive(Debug, Clone)]
pub struct QuerySession {
    debounce: Duration,
    phase: SessionPhase,
    input: String,
    seq: u64,
    deadline: Option<Instant>,
    dispatched_seq: u64,
    last_emitted: Option<(u64, Tier)>,
}

impl QuerySession {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            phase: SessionPhase::Idle,
            input: String::new(),
            seq: 0,
            deadline: None,
            dispatched_seq: 0,
            last_emitted: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Sequence number of the latest submission (0 before the first).
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn last_emitted(&self) -> Option<(u64, Tier)> {
        self.last_emitted
    }

    /// Records new input and restarts the debounce window.
    pub fn submit(&mut self, raw: impl Into<String>, now: Instant) -> u64 {
        self.seq += 1;
        self.input = raw.into();
        self.deadline = Some(now + self.debounce);
        self.phase = SessionPhase::Debouncing;
        self.seq
    }

    /// Hands out the pending query once its deadline has passed.
    pub fn fire(&mut self, now: Instant) -> Option<PendingQuery> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.phase = SessionPhase::Querying;
                self.dispatched_seq = self.seq;
                Some(PendingQuery {
                    seq: self.seq,
                    input: self.input.clone(),
                })
            }
            _ => None,
        }
    }

    /// The input currently shown to the caller, if it has been dispatched.
    ///
    /// `None` while a newer submission is still debouncing.
    pub fn current(&self) -> Option<PendingQuery> {
        match self.phase {
            SessionPhase::Querying | SessionPhase::Settled => Some(PendingQuery {
                seq: self.seq,
                input: self.input.clone(),
            }),
            SessionPhase::Idle | SessionPhase::Debouncing => None,
        }
    }

    /// Decides whether a result may be emitted and records it if so.
    ///
    /// Rejected: anything older than the last dispatched query or the last
    /// emitted result, and an instant result after a full one for the same
    /// sequence number.
    pub fn accept(&mut self, seq: u64, tier: Tier) -> bool {
        if seq < self.dispatched_seq {
            return false;
        }
        if let Some((last_seq, last_tier)) = self.last_emitted {
            if seq < last_seq || (seq == last_seq && tier < last_tier) {
                return false;
            }
        }
        self.last_emitted = Some((seq, tier));
        if seq == self.seq && self.phase == SessionPhase::Querying {
            self.phase = SessionPhase::Settled;
        }
        true
    }
}

/// Debounced, tier-upgrading search for one interactive input.
///
/// Must be created inside a tokio runtime. Dropping it stops the session
/// and closes the update stream.
#[derive(Debug)]
pub struct QueryCoordinator {
    submissions: mpsc::UnboundedSender<String>,
    submitted: AtomicU64,
    settled: watch::Receiver<u64>,
    driver: JoinHandle<()>,
}

impl QueryCoordinator {
    /// Starts a session. The returned receiver is the subscription: every
    /// non-stale result arrives there as a [`SearchUpdate`].
    pub fn spawn(
        store: TieredCityStore,
        settings: CoordinatorSettings,
    ) -> (Self, mpsc::UnboundedReceiver<SearchUpdate>) {
        let (submissions, submissions_rx) = mpsc::unbounded_channel();
        let (updates, updates_rx) = mpsc::unbounded_channel();
        let (loads, loads_rx) = mpsc::unbounded_channel();
        let (settled, settled_rx) = watch::channel(0);

        let instant_index = Arc::new(CityIndex::new(store.instant_set()));
        let driver = Driver {
            session: QuerySession::new(settings.debounce),
            store,
            settings,
            instant_index,
            full_index: None,
            updates,
            loads,
            load_in_flight: false,
            settled,
        };
        let driver = tokio::spawn(driver.run(submissions_rx, loads_rx));

        let coordinator = Self {
            submissions,
            submitted: AtomicU64::new(0),
            settled: settled_rx,
            driver,
        };
        (coordinator, updates_rx)
    }

    /// Submits the latest raw input. Never blocks.
    pub fn submit(&self, raw: impl Into<String>) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        if self.submissions.send(raw.into()).is_err() {
            debug!("query coordinator stopped; dropping submission");
        }
    }

    /// Resolves once every input submitted so far has fired and no full-tier
    /// load is pending, i.e. no further update will arrive without new input.
    ///
    /// Updates are queued before the session counts as settled, so the
    /// receiver can be drained with `try_recv` afterwards.
    pub async fn settled(&self) {
        let target = self.submitted.load(Ordering::SeqCst);
        let mut settled = self.settled.clone();
        if settled.wait_for(|&seq| seq >= target).await.is_err() {
            debug!("query coordinator stopped before settling");
        }
    }
}

impl Drop for QueryCoordinator {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

struct Driver {
    session: QuerySession,
    store: TieredCityStore,
    settings: CoordinatorSettings,
    instant_index: Arc<CityIndex>,
    full_index: Option<Arc<CityIndex>>,
    updates: mpsc::UnboundedSender<SearchUpdate>,
    loads: mpsc::UnboundedSender<()>,
    load_in_flight: bool,
    /// Sequence number of the latest submission once nothing more is due.
    settled: watch::Sender<u64>,
}

impl Driver {
    async fn run(
        mut self,
        mut submissions: mpsc::UnboundedReceiver<String>,
        mut loads: mpsc::UnboundedReceiver<()>,
    ) {
        loop {
            let deadline = self.session.deadline();
            tokio::select! {
                msg = submissions.recv() => match msg {
                    Some(raw) => {
                        let seq = self.session.submit(raw, Instant::now());
                        trace!(seq, "query submitted");
                    }
                    None => break,
                },
                () = sleep_until(deadline) => {
                    if let Some(query) = self.session.fire(Instant::now()) {
                        self.dispatch(query);
                    }
                }
                Some(()) = loads.recv() => {
                    self.load_in_flight = false;
                    self.on_full_tier_settled();
                }
            }
            if self.session.deadline().is_none() && !self.load_in_flight {
                self.settled.send_replace(self.session.seq());
            }
        }
        debug!("query coordinator finished");
    }

    fn dispatch(&mut self, query: PendingQuery) {
        if query_len(&query.input) < self.settings.min_query_chars {
            let tier = if self.store.is_full_loaded() {
                Tier::Full
            } else {
                Tier::Instant
            };
            self.emit(query, tier, Vec::new());
            return;
        }

        if let Some(full) = self.full_index() {
            let results = full.search(&query.input, self.settings.limit, &self.settings.options);
            self.emit(query, Tier::Full, results);
            return;
        }

        let results =
            self.instant_index
                .search(&query.input, self.settings.limit, &self.settings.options);
        self.emit(query, Tier::Instant, results);
        self.start_full_load();
    }

    fn on_full_tier_settled(&mut self) {
        let Some(full) = self.full_index() else {
            debug!("full tier unavailable; keeping instant results");
            return;
        };
        let Some(query) = self.session.current() else {
            return;
        };
        if query_len(&query.input) < self.settings.min_query_chars
            || self.session.last_emitted() == Some((query.seq, Tier::Full))
        {
            return;
        }
        let results = full.search(&query.input, self.settings.limit, &self.settings.options);
        self.emit(query, Tier::Full, results);
    }

    fn full_index(&mut self) -> Option<Arc<CityIndex>> {
        if self.full_index.is_none() {
            let set = self.store.full_set()?;
            self.full_index = Some(Arc::new(CityIndex::new(set)));
        }
        self.full_index.clone()
    }

    fn start_full_load(&mut self) {
        if self.load_in_flight {
            return;
        }
        self.load_in_flight = true;
        let store = self.store.clone();
        let done = self.loads.clone();
        tokio::spawn(async move {
            store.ensure_full_loaded().await;
            done.send(()).ok();
        });
    }

    fn emit(&mut self, query: PendingQuery, tier: Tier, results: Vec<CityRecord>) {
        if !self.session.accept(query.seq, tier) {
            debug!(seq = query.seq, %tier, "dropping stale result");
            return;
        }
        trace!(seq = query.seq, %tier, hits = results.len(), "emitting result");
        let update = SearchUpdate {
            seq: query.seq,
            query: query.input,
            tier,
            results,
        };
        if self.updates.send(update).is_err() {
            debug!("no subscriber for search updates");
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    #[test]
    fn debounce_supersedes_earlier_input() {
        let t0 = Instant::now();
        let mut session = QuerySession::new(DEBOUNCE);
        assert_eq!(session.phase(), SessionPhase::Idle);

        session.submit("p", t0);
        session.submit("ph", t0 + Duration::from_millis(100));
        let seq = session.submit("pho", t0 + Duration::from_millis(200));
        assert_eq!(seq, 3);
        assert_eq!(session.phase(), SessionPhase::Debouncing);

        // 300ms after the first keystroke is too early for the last one.
        assert!(session.fire(t0 + DEBOUNCE).is_none());

        let query = session.fire(t0 + Duration::from_millis(500)).unwrap();
        assert_eq!(query, PendingQuery { seq: 3, input: "pho".into() });
        assert_eq!(session.phase(), SessionPhase::Querying);
        assert!(session.fire(t0 + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn old_full_result_cannot_replace_newer_instant_result() {
        let t0 = Instant::now();
        let mut session = QuerySession::new(DEBOUNCE);

        session.submit("Pho", t0);
        let pho = session.fire(t0 + DEBOUNCE).unwrap();
        assert!(session.accept(pho.seq, Tier::Instant));

        session.submit("Aus", t0 + Duration::from_secs(1));
        let aus = session.fire(t0 + Duration::from_secs(2)).unwrap();
        assert!(session.accept(aus.seq, Tier::Instant));

        assert!(!session.accept(pho.seq, Tier::Full));
        assert!(session.accept(aus.seq, Tier::Full));
        assert_eq!(session.phase(), SessionPhase::Settled);
    }

    #[test]
    fn result_for_superseded_dispatch_is_dropped() {
        let t0 = Instant::now();
        let mut session = QuerySession::new(DEBOUNCE);

        session.submit("bos", t0);
        let first = session.fire(t0 + DEBOUNCE).unwrap();
        session.submit("aus", t0 + DEBOUNCE);
        session.fire(t0 + DEBOUNCE * 2).unwrap();

        // Nothing was emitted yet, but a newer query is already out.
        assert!(!session.accept(first.seq, Tier::Instant));
    }

    #[test]
    fn instant_never_downgrades_full_for_same_seq() {
        let t0 = Instant::now();
        let mut session = QuerySession::new(DEBOUNCE);
        session.submit("austin", t0);
        let q = session.fire(t0 + DEBOUNCE).unwrap();
        assert!(session.accept(q.seq, Tier::Full));
        assert!(!session.accept(q.seq, Tier::Instant));
        assert_eq!(session.last_emitted(), Some((q.seq, Tier::Full)));
    }

    #[test]
    fn current_hidden_while_debouncing() {
        let t0 = Instant::now();
        let mut session = QuerySession::new(DEBOUNCE);
        assert!(session.current().is_none());
        session.submit("den", t0);
        assert!(session.current().is_none());
        session.fire(t0 + DEBOUNCE).unwrap();
        assert_eq!(session.current().unwrap().input, "den");
        session.submit("denv", t0 + DEBOUNCE);
        assert!(session.current().is_none());
    }

    #[test]
    fn update_serializes_with_lowercase_tier() {
        let update = SearchUpdate {
            seq: 7,
            query: "aus".into(),
            tier: Tier::Full,
            results: vec![CityRecord::new("Austin", "TX").with_population(961_855)],
        };
        let text = serde_json::to_string(&update).unwrap();
        assert!(text.contains(r#""tier":"full""#), "{text}");

        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["seq"], 7);
        assert_eq!(value["query"], "aus");
        let austin = &value["results"][0];
        assert_eq!(austin["state_name"], "Texas");
        assert_eq!(austin["population"], 961_855);
        assert!(austin["county"].is_null());
        assert!(austin["latitude"].is_null());
    }

    #[test]
    fn settings_follow_config() {
        let config = LookupConfig {
            debounce_ms: 120,
            result_limit: 4,
            ..LookupConfig::default()
        };
        let settings = CoordinatorSettings::from(&config);
        assert_eq!(settings.debounce, Duration::from_millis(120));
        assert_eq!(settings.limit, 4);
        assert_eq!(settings.min_query_chars, 2);
    }
}
