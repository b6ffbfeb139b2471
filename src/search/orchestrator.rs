//! Search orchestration
//!
//! Turns triggers (submit, text input, language change, retry, random pick)
//! into state transitions, deciding between the cache and a provider fetch.
//!
//! Every trigger starts a new episode and cancels the previous one. State is
//! only committed while holding the session lock and only if the committing
//! episode is still current, so a superseded request can never reach the
//! published snapshot or the cache.

use super::controller::RequestController;
use super::debounce::DebounceGate;
use super::error::{FetchError, SearchFailure};
use super::state::{Banner, OrchestratorState, Resolution, Snapshot};
use crate::cache::CacheStore;
use crate::config::SearchSettings;
use crate::metrics::SearchMetrics;
use crate::preferences::{PreferenceStore, Preferences};
use crate::provider::RepositoryProvider;
use crate::query::{Query, QueryBuilder, SearchCriteria};
use crate::results::{RepositoryItem, SearchResultSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct Session {
    /// Token of the current episode
    episode: CancellationToken,
    /// Criteria of the latest resolution, reused by retry
    last_criteria: Option<SearchCriteria>,
    /// Full result set behind the current `Success`
    retained: Option<Arc<SearchResultSet>>,
}

struct Inner {
    builder: QueryBuilder,
    cache: CacheStore,
    controller: RequestController,
    gate: DebounceGate,
    preferences: Option<Arc<dyn PreferenceStore>>,
    metrics: Arc<SearchMetrics>,
    rng: Mutex<StdRng>,
    session: Mutex<Session>,
    snapshot: watch::Sender<Snapshot>,
    debounce_delay: Duration,
    min_term_length: usize,
    status_dwell: Duration,
}

impl Inner {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cancel the current episode and start a new one
    fn begin_episode(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut session = self.session();
        session.episode.cancel();
        session.episode = token.clone();
        token
    }

    /// Run `update` if `episode` is still current. Returns whether it ran.
    fn commit<F>(&self, episode: &CancellationToken, update: F) -> bool
    where
        F: FnOnce(&mut Session, &mut Snapshot),
    {
        let mut session = self.session();
        if episode.is_cancelled() {
            return false;
        }
        self.snapshot
            .send_modify(|snapshot| update(&mut *session, snapshot));
        true
    }

    fn save_preferences(&self, criteria: &SearchCriteria) {
        if let Some(store) = &self.preferences {
            if let Err(e) = store.save(&Preferences::from(criteria)) {
                warn!("Failed to save preferences: {}", e);
            }
        }
    }

    fn load_preferences(&self) -> SearchCriteria {
        let Some(store) = &self.preferences else {
            return SearchCriteria::default();
        };
        match store.load() {
            Ok(Some(preferences)) => preferences.criteria(),
            Ok(None) => SearchCriteria::default(),
            Err(e) => {
                warn!("Failed to load preferences: {}", e);
                SearchCriteria::default()
            }
        }
    }
}

/// Move the session and snapshot into `state`
fn apply(
    session: &mut Session,
    snapshot: &mut Snapshot,
    criteria: &SearchCriteria,
    state: &OrchestratorState,
) {
    match state {
        OrchestratorState::Success(set) => {
            session.retained = Some(set.clone());
            snapshot.displayed = Some(set.clone());
        }
        OrchestratorState::Idle | OrchestratorState::Empty | OrchestratorState::Error(_) => {
            session.retained = None;
            snapshot.displayed = None;
        }
        OrchestratorState::Debouncing | OrchestratorState::Loading => {}
    }
    snapshot.picked = false;
    if !matches!(state, OrchestratorState::Idle) {
        session.last_criteria = Some(criteria.clone());
    }
    snapshot.criteria = criteria.clone();
    snapshot.banner = Banner::for_state(state);
    snapshot.state = state.clone();
}

/// Builder for [`SearchOrchestrator`]
pub struct OrchestratorBuilder {
    provider: Arc<dyn RepositoryProvider>,
    settings: SearchSettings,
    preferences: Option<Arc<dyn PreferenceStore>>,
    seed: Option<u64>,
}

impl OrchestratorBuilder {
    pub fn settings(mut self, settings: &SearchSettings) -> Self {
        self.seed = self.seed.or(settings.random_seed);
        self.settings = settings.clone();
        self
    }

    pub fn preferences(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = Some(store);
        self
    }

    /// Seed the random source used by `pick_random`
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> SearchOrchestrator {
        let settings = self.settings;
        let metrics = Arc::new(SearchMetrics::new());
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let inner = Inner {
            builder: QueryBuilder::new(settings.min_stars),
            cache: CacheStore::new(settings.cache_ttl(), settings.cache_max_capacity),
            controller: RequestController::new(self.provider, metrics.clone()),
            gate: DebounceGate::new(),
            preferences: self.preferences,
            metrics,
            rng: Mutex::new(rng),
            session: Mutex::new(Session {
                episode: CancellationToken::new(),
                last_criteria: None,
                retained: None,
            }),
            snapshot: watch::channel(Snapshot::default()).0,
            debounce_delay: settings.debounce_delay(),
            min_term_length: settings.min_term_length,
            status_dwell: settings.status_dwell(),
        };

        SearchOrchestrator {
            inner: Arc::new(inner),
        }
    }
}

/// Search state machine bound to one UI session
///
/// Cheap to clone; clones share the same state. Triggers must be issued from
/// within a tokio runtime.
#[derive(Clone)]
pub struct SearchOrchestrator {
    inner: Arc<Inner>,
}

impl SearchOrchestrator {
    pub fn builder(provider: Arc<dyn RepositoryProvider>) -> OrchestratorBuilder {
        OrchestratorBuilder {
            provider,
            settings: SearchSettings::default(),
            preferences: None,
            seed: None,
        }
    }

    pub fn new(provider: Arc<dyn RepositoryProvider>, settings: &SearchSettings) -> Self {
        Self::builder(provider).settings(settings).build()
    }

    /// Watch the published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn state(&self) -> OrchestratorState {
        self.inner.snapshot.borrow().state.clone()
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.inner.metrics
    }

    pub fn cache(&self) -> &CacheStore {
        &self.inner.cache
    }

    pub fn provider_name(&self) -> &str {
        self.inner.controller.provider_name()
    }

    /// Query the builder produces for `criteria`
    pub fn query_for(&self, criteria: &SearchCriteria) -> Query {
        self.inner.builder.build(criteria)
    }

    /// Explicit submit: resolve immediately, bypassing the debounce gate.
    ///
    /// The trigger supersedes earlier ones when called; the returned future
    /// only drives the resolution, so it can be spawned.
    pub fn submit_search(
        &self,
        criteria: SearchCriteria,
    ) -> impl Future<Output = Resolution> + Send + 'static {
        self.inner.gate.cancel();
        let episode = self.inner.begin_episode();
        let this = self.clone();
        async move { this.resolve(criteria, episode).await }
    }

    /// Language selection: persist the criteria, then resolve immediately
    pub fn change_language(
        &self,
        criteria: SearchCriteria,
    ) -> impl Future<Output = Resolution> + Send + 'static {
        self.inner.save_preferences(&criteria);
        self.submit_search(criteria)
    }

    /// Criteria saved by an earlier session, empty when there are none
    pub fn restored_criteria(&self) -> SearchCriteria {
        self.inner.load_preferences()
    }

    /// Startup: resolve the criteria restored from the preference store
    pub fn mount(&self) -> impl Future<Output = Resolution> + Send + 'static {
        let criteria = self.restored_criteria();
        debug!("Mounting with restored criteria {:?}", criteria);
        self.submit_search(criteria)
    }

    /// Text input: schedule a debounced resolution, or go idle when the
    /// input is too short to search for
    pub fn on_text_input(&self, criteria: SearchCriteria) -> Resolution {
        let inner = &self.inner;
        let episode = inner.begin_episode();

        if !criteria.is_debounce_eligible(inner.min_term_length) {
            inner.gate.cancel();
            return self.reset_idle(&episode, &criteria);
        }

        let state = OrchestratorState::Debouncing;
        if !inner.commit(&episode, |session, snapshot| {
            apply(session, snapshot, &criteria, &state)
        }) {
            return Resolution::Superseded;
        }

        let this = self.clone();
        inner.gate.schedule(inner.debounce_delay, async move {
            this.resolve(criteria, episode).await;
        });
        Resolution::Applied(state)
    }

    /// Re-run the last criteria after an error
    pub fn retry(&self) -> impl Future<Output = Resolution> + Send + 'static {
        let criteria = {
            let session = self.inner.session();
            let failed = matches!(
                self.inner.snapshot.borrow().state,
                OrchestratorState::Error(_)
            );
            if failed {
                session.last_criteria.clone()
            } else {
                None
            }
        };

        let resolution = criteria.map(|criteria| {
            info!("Retrying search");
            self.submit_search(criteria)
        });
        async move {
            match resolution {
                Some(resolution) => resolution.await,
                None => Resolution::Ignored,
            }
        }
    }

    /// Show one random item of the current results, using the
    /// orchestrator's own random source
    pub fn pick_random(&self) -> Option<RepositoryItem> {
        let mut rng = self
            .inner
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.pick_random_with(&mut *rng)
    }

    /// Show one random item of the current results.
    ///
    /// Only valid in `Success`; the state, cache and retained set are left
    /// untouched.
    pub fn pick_random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<RepositoryItem> {
        let session = self.inner.session();
        if !self.inner.snapshot.borrow().state.is_success() {
            return None;
        }
        let retained = session.retained.clone()?;
        let item = retained.pick_random(rng)?.clone();

        let single = Arc::new(retained.single(item.clone()));
        self.inner.snapshot.send_modify(|snapshot| {
            snapshot.displayed = Some(single);
            snapshot.picked = true;
        });
        Some(item)
    }

    /// Show the full result set again after a random pick
    pub fn show_all(&self) -> bool {
        let session = self.inner.session();
        let Some(retained) = session.retained.clone() else {
            return false;
        };
        self.inner.snapshot.send_modify(|snapshot| {
            snapshot.displayed = Some(retained);
            snapshot.picked = false;
        });
        true
    }

    /// Cancel pending and in-flight work, drop cached results and return
    /// to `Idle`
    pub fn teardown(&self) {
        let inner = &self.inner;
        inner.gate.cancel();
        {
            let mut session = inner.session();
            session.episode.cancel();
            inner.snapshot.send_modify(|snapshot| {
                let criteria = snapshot.criteria.clone();
                apply(&mut session, snapshot, &criteria, &OrchestratorState::Idle);
            });
        }
        inner.controller.cancel();
        inner.cache.clear();
        info!("Search session torn down");
    }

    fn reset_idle(&self, episode: &CancellationToken, criteria: &SearchCriteria) -> Resolution {
        let state = OrchestratorState::Idle;
        if self.inner.commit(episode, |session, snapshot| {
            apply(session, snapshot, criteria, &state)
        }) {
            Resolution::Applied(state)
        } else {
            Resolution::Superseded
        }
    }

    async fn resolve(&self, criteria: SearchCriteria, episode: CancellationToken) -> Resolution {
        let inner = &self.inner;
        if criteria.is_empty() {
            return self.reset_idle(&episode, &criteria);
        }

        inner.metrics.record_resolution();
        let query = inner.builder.build(&criteria);

        if let Some(entry) = inner.cache.get(&query) {
            info!("Cache hit for '{}'", query);
            inner.metrics.record_cache_hit();
            let state = OrchestratorState::for_results(entry.payload);
            return self.finish(&episode, &criteria, state, None);
        }

        debug!("Cache miss for '{}'", query);
        let loading = OrchestratorState::Loading;
        if !inner.commit(&episode, |session, snapshot| {
            apply(session, snapshot, &criteria, &loading)
        }) {
            return Resolution::Superseded;
        }

        info!("Searching {} for '{}'", inner.controller.provider_name(), query);
        match inner.controller.fetch(&query, &episode).await {
            Ok(set) => {
                let set = Arc::new(set);
                // Empty pages are not pinned; the next attempt asks again
                let to_cache = (!set.is_empty()).then(|| (query, set.clone()));
                let state = OrchestratorState::for_results(set);
                self.finish(&episode, &criteria, state, to_cache)
            }
            Err(FetchError::Cancelled) => Resolution::Superseded,
            Err(err) => {
                warn!("Search for '{}' failed: {}", query, err);
                inner.metrics.record_error();
                match SearchFailure::from_fetch_error(&err) {
                    Some(failure) => self.finish(
                        &episode,
                        &criteria,
                        OrchestratorState::Error(failure),
                        None,
                    ),
                    None => Resolution::Superseded,
                }
            }
        }
    }

    fn finish(
        &self,
        episode: &CancellationToken,
        criteria: &SearchCriteria,
        state: OrchestratorState,
        to_cache: Option<(Query, Arc<SearchResultSet>)>,
    ) -> Resolution {
        let cache = &self.inner.cache;
        let committed = self.inner.commit(episode, |session, snapshot| {
            if let Some((query, set)) = to_cache {
                cache.put(&query, set);
            }
            apply(session, snapshot, criteria, &state);
        });

        if !committed {
            debug!("Discarding superseded {} outcome", state.name());
            return Resolution::Superseded;
        }

        debug!("Search state -> {}", state.name());
        if state.is_success() {
            self.schedule_dwell(episode.clone());
        }
        Resolution::Applied(state)
    }

    /// Flip the "found" banner to neutral after the dwell time
    fn schedule_dwell(&self, episode: CancellationToken) {
        let this = self.clone();
        let dwell = self.inner.status_dwell;
        tokio::spawn(async move {
            tokio::select! {
                _ = episode.cancelled() => {}
                _ = tokio::time::sleep(dwell) => {
                    this.inner.commit(&episode, |_, snapshot| {
                        if matches!(snapshot.banner, Banner::Found { .. }) {
                            snapshot.banner = Banner::Neutral;
                        }
                    });
                }
            }
        });
    }
}
