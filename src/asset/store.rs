//! The image store: bulk loading with per-batch completion tracking.
//!
//! Loads are handed to a [`Dispatcher`] and report back over a channel. The
//! store's owner pumps that channel ([`ImageStore::poll`],
//! [`ImageStore::wait`]); completion callbacks therefore always run on the
//! owning thread, in whatever order the loads happened to finish.

use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::batch::{Batch, BatchId, BatchReport, CompletionCallback};
use super::{AssetKey, AssetSource, ImageHandle, LoadError, StoreError};
use crate::catalog::Catalog;
use crate::pixel::PixelBuffer;
use crate::progress::{LoadStatus, NullProgress, ProgressEvent, ProgressReporter};

/// Category name to identifiers, for requests spanning several categories.
pub type AssetList = BTreeMap<String, Vec<String>>;

/// Retention tier of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Tier {
    /// Warm the source cache only
    Cache,
    /// Decode and keep a handle
    Retain,
}

impl Tier {
    fn label(self) -> &'static str {
        match self {
            Tier::Cache => "cache",
            Tier::Retain => "retain",
        }
    }
}

/// How asset loads are executed.
#[derive(Clone, Default)]
pub enum Dispatcher {
    /// Run each load inside the call that issues it. Completions are still
    /// delivered through the channel, at the next poll.
    #[default]
    Inline,
    /// Run loads on a rayon thread pool.
    Pool(Arc<rayon::ThreadPool>),
}

impl Dispatcher {
    /// Create a pool dispatcher with `jobs` loader threads.
    pub fn pool(jobs: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .thread_name(|i| format!("tileblend-load-{}", i))
            .panic_handler(|_| log::error!("asset loader thread panicked; its batch will not complete"))
            .build()?;
        Ok(Dispatcher::Pool(Arc::new(pool)))
    }

    fn dispatch<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            Dispatcher::Inline => job(),
            Dispatcher::Pool(pool) => pool.spawn(job),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatcher::Inline => write!(f, "Inline"),
            Dispatcher::Pool(pool) => write!(f, "Pool({} threads)", pool.current_num_threads()),
        }
    }
}

/// Result of one load, sent from the loader back to the store.
struct Completion {
    key: AssetKey,
    tier: Tier,
    result: Result<Option<PixelBuffer>, LoadError>,
}

/// What a request for one key turns into.
enum Plan {
    /// Nothing to wait for
    Skip,
    /// Wait on a load already in flight
    Join(Tier),
    /// Issue a new load
    Issue,
}

/// Owner of decoded image handles and of every bulk request in flight.
pub struct ImageStore {
    catalog: Catalog,
    source: Arc<dyn AssetSource>,
    dispatcher: Dispatcher,
    progress: Box<dyn ProgressReporter>,
    /// Retained handles; inserted once and never replaced
    retained: HashMap<AssetKey, ImageHandle>,
    /// Keys whose source cache is known to be warm
    warmed: HashSet<AssetKey>,
    /// Batches waiting on each load in flight, with the tier each asked for
    in_flight: HashMap<(AssetKey, Tier), Vec<(BatchId, Tier)>>,
    batches: HashMap<BatchId, Batch>,
    next_batch: u64,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
}

impl std::fmt::Debug for ImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageStore")
            .field("dispatcher", &self.dispatcher)
            .field("retained", &self.retained.len())
            .field("warmed", &self.warmed.len())
            .field("in_flight", &self.in_flight.len())
            .field("batches", &self.batches.len())
            .finish()
    }
}

impl ImageStore {
    /// Create a store loading through `source`, with inline dispatch and no
    /// progress output.
    pub fn new(catalog: Catalog, source: Arc<dyn AssetSource>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            catalog,
            source,
            dispatcher: Dispatcher::Inline,
            progress: Box::new(NullProgress::new()),
            retained: HashMap::new(),
            warmed: HashSet::new(),
            in_flight: HashMap::new(),
            batches: HashMap::new(),
            next_batch: 1,
            sender,
            receiver,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Load images and keep their decoded handles.
    ///
    /// Identifiers already retained are not counted. An identifier whose
    /// retained load is already in flight is counted but not loaded again.
    /// `on_all_loaded` fires exactly once, after every counted load has
    /// reported, or before this call returns if nothing needed loading.
    pub fn retain<I, S, F>(
        &mut self,
        category: &str,
        identifiers: I,
        on_all_loaded: F,
    ) -> Result<BatchId, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnOnce(BatchReport) + Send + 'static,
    {
        let keys = self.resolve_keys(category, identifiers, Tier::Retain)?;
        Ok(self.open_batch(keys, Tier::Retain, Some(Box::new(on_all_loaded))))
    }

    /// Retain images from several categories as one batch.
    ///
    /// Every category is validated before any load is issued.
    pub fn retain_list<F>(&mut self, list: &AssetList, on_all_loaded: F) -> Result<BatchId, StoreError>
    where
        F: FnOnce(BatchReport) + Send + 'static,
    {
        let mut keys = Vec::new();
        for (category, identifiers) in list {
            keys.extend(self.resolve_keys(category, identifiers, Tier::Retain)?);
        }
        Ok(self.open_batch(keys, Tier::Retain, Some(Box::new(on_all_loaded))))
    }

    /// Warm the source cache for images without keeping handles.
    ///
    /// Identifiers already warmed or retained are skipped. `on_complete`,
    /// if given, fires once every issued load has reported.
    pub fn cache_only<I, S>(
        &mut self,
        category: &str,
        identifiers: I,
        on_complete: Option<CompletionCallback>,
    ) -> Result<BatchId, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = self.resolve_keys(category, identifiers, Tier::Cache)?;
        Ok(self.open_batch(keys, Tier::Cache, on_complete))
    }

    /// Warm the cache for every identifier the catalog enumerates.
    pub fn warm_catalog(&mut self, on_complete: Option<CompletionCallback>) -> BatchId {
        for (name, spec) in self.catalog.categories() {
            if spec.identifiers.is_empty() {
                self.progress.report(ProgressEvent::Warning {
                    message: format!("category '{}' lists no identifiers; nothing to warm", name),
                });
            }
        }
        let keys = self.catalog.keys();
        self.open_batch(keys, Tier::Cache, on_complete)
    }

    /// Look up a retained image. Never triggers a load.
    pub fn get(&self, category: &str, identifier: &str) -> Result<ImageHandle, StoreError> {
        let key = AssetKey::new(category, identifier);
        self.get_key(&key)
    }

    /// Look up a retained image by key.
    pub fn get_key(&self, key: &AssetKey) -> Result<ImageHandle, StoreError> {
        self.retained.get(key).cloned().ok_or_else(|| StoreError::NotLoaded { key: key.clone() })
    }

    pub fn is_retained(&self, category: &str, identifier: &str) -> bool {
        self.retained.contains_key(&AssetKey::new(category, identifier))
    }

    /// True once the source has fetched the key's image, whether or not it
    /// was retained.
    pub fn is_warmed(&self, category: &str, identifier: &str) -> bool {
        self.warmed.contains(&AssetKey::new(category, identifier))
    }

    pub fn retained_count(&self) -> usize {
        self.retained.len()
    }

    /// Number of loads issued and not yet reported.
    pub fn pending_loads(&self) -> usize {
        self.in_flight.len()
    }

    /// Check whether a batch is still waiting on loads.
    pub fn is_pending(&self, batch: BatchId) -> bool {
        self.batches.contains_key(&batch)
    }

    /// Process every completion that has already arrived, without blocking.
    ///
    /// Returns the number of completions processed.
    pub fn poll(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(completion) = self.receiver.try_recv() {
            self.process(completion);
            processed += 1;
        }
        processed
    }

    /// Block until `batch` has completed.
    ///
    /// There is no cancellation: if one of the batch's loads never reports,
    /// this never returns. Use [`ImageStore::wait_timeout`] to bound it.
    pub fn wait(&mut self, batch: BatchId) {
        while self.batches.contains_key(&batch) {
            match self.receiver.recv() {
                Ok(completion) => self.process(completion),
                Err(_) => break,
            }
        }
    }

    /// Block until `batch` has completed or `timeout` elapses.
    ///
    /// Returns true if the batch completed. A timeout leaves the batch and
    /// its loads in flight.
    pub fn wait_timeout(&mut self, batch: BatchId, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait(batch);
            return !self.is_pending(batch);
        };
        while self.batches.contains_key(&batch) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(completion) => self.process(completion),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false
                }
            }
        }
        true
    }

    /// Block until no load is in flight.
    pub fn wait_idle(&mut self) {
        while !self.in_flight.is_empty() {
            match self.receiver.recv() {
                Ok(completion) => self.process(completion),
                Err(_) => break,
            }
        }
    }

    /// Validate a request against the catalog and turn it into keys,
    /// dropping duplicates while keeping request order.
    fn resolve_keys<I, S>(
        &self,
        category: &str,
        identifiers: I,
        tier: Tier,
    ) -> Result<Vec<AssetKey>, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let spec = self
            .catalog
            .category(category)
            .ok_or_else(|| StoreError::UnknownCategory { category: category.to_string() })?;
        if tier == Tier::Retain && !spec.retain {
            return Err(StoreError::NotRetainable { category: category.to_string() });
        }

        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for identifier in identifiers {
            let identifier = identifier.as_ref();
            if !spec.accepts(identifier) {
                return Err(StoreError::UnknownIdentifier {
                    category: category.to_string(),
                    identifier: identifier.to_string(),
                });
            }
            if seen.insert(identifier.to_string()) {
                keys.push(AssetKey::new(category, identifier));
            }
        }
        Ok(keys)
    }

    fn plan(&self, key: &AssetKey, tier: Tier) -> Plan {
        let in_flight = |t: Tier| self.in_flight.contains_key(&(key.clone(), t));
        match tier {
            Tier::Retain if self.retained.contains_key(key) => Plan::Skip,
            Tier::Retain if in_flight(Tier::Retain) => Plan::Join(Tier::Retain),
            Tier::Retain => Plan::Issue,
            Tier::Cache if self.retained.contains_key(key) || self.warmed.contains(key) => {
                Plan::Skip
            }
            // A retained load warms the cache too
            Tier::Cache if in_flight(Tier::Retain) => Plan::Join(Tier::Retain),
            Tier::Cache if in_flight(Tier::Cache) => Plan::Join(Tier::Cache),
            Tier::Cache => Plan::Issue,
        }
    }

    fn open_batch(
        &mut self,
        keys: Vec<AssetKey>,
        tier: Tier,
        on_complete: Option<CompletionCallback>,
    ) -> BatchId {
        let id = BatchId::new(self.next_batch);
        self.next_batch += 1;

        let mut waits = 0;
        let mut to_issue = Vec::new();
        let mut seen = HashSet::new();
        for key in keys {
            if !seen.insert(key.clone()) {
                continue;
            }
            match self.plan(&key, tier) {
                Plan::Skip => {}
                Plan::Join(joined) => {
                    if let Some(waiters) = self.in_flight.get_mut(&(key, joined)) {
                        waiters.push((id, tier));
                        waits += 1;
                    }
                }
                Plan::Issue => {
                    self.in_flight.insert((key.clone(), tier), vec![(id, tier)]);
                    to_issue.push(key);
                    waits += 1;
                }
            }
        }

        debug!("{} opened ({}): waiting on {}, issuing {}", id, tier.label(), waits, to_issue.len());
        self.progress.report(ProgressEvent::BatchStarted {
            batch: id.get(),
            tier: tier.label(),
            total: waits,
            issued: to_issue.len(),
        });

        let batch = Batch::new(id, waits, on_complete);
        if batch.is_done() {
            self.finish_batch(batch);
            return id;
        }
        self.batches.insert(id, batch);

        // Issued after the batch is registered so an inline load finds it
        for key in to_issue {
            self.issue(key, tier);
        }
        id
    }

    fn issue(&self, key: AssetKey, tier: Tier) {
        debug!("issuing {} load for {}", tier.label(), key);
        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        self.dispatcher.dispatch(move || {
            let result = match tier {
                Tier::Retain => source.load(&key).map(Some),
                Tier::Cache => source.prefetch(&key).map(|()| None),
            };
            // A dropped store no longer cares about the result
            let _ = sender.send(Completion { key, tier, result });
        });
    }

    fn process(&mut self, completion: Completion) {
        let Completion { key, tier, result } = completion;
        let waiters = self.in_flight.remove(&(key.clone(), tier)).unwrap_or_default();

        let fetched = result.is_ok();
        let outcome = match result {
            Ok(Some(buffer)) => {
                // Fetched bytes warm the source cache even when the size is wrong
                self.warmed.insert(key.clone());
                self.check_dimensions(&key, &buffer).map(|()| {
                    self.retained
                        .entry(key.clone())
                        .or_insert_with(|| ImageHandle::new(key.clone(), buffer));
                    LoadStatus::Retained
                })
            }
            Ok(None) => {
                self.warmed.insert(key.clone());
                Ok(LoadStatus::Warmed)
            }
            Err(error) => Err(error),
        };

        let status = match &outcome {
            Ok(status) => {
                debug!("{} {}", status, key);
                status.clone()
            }
            Err(error) => {
                warn!("{}", error);
                LoadStatus::Failed(error.to_string())
            }
        };
        self.progress.report(ProgressEvent::AssetCompleted { key: key.to_string(), status });

        let retained = outcome.map(|_| key.clone());
        for (batch_id, wanted) in waiters {
            // Cache-only waiters need the fetch, not the size check
            let outcome = match wanted {
                Tier::Cache if fetched => Ok(key.clone()),
                _ => retained.clone(),
            };
            let done = match self.batches.get_mut(&batch_id) {
                Some(batch) => batch.record(outcome),
                None => false,
            };
            if done {
                if let Some(batch) = self.batches.remove(&batch_id) {
                    self.finish_batch(batch);
                }
            }
        }
    }

    fn check_dimensions(&self, key: &AssetKey, buffer: &PixelBuffer) -> Result<(), LoadError> {
        match self.catalog.category(&key.category) {
            Some(spec) if spec.dimensions() != buffer.dimensions() => {
                Err(LoadError::DimensionMismatch {
                    key: key.clone(),
                    actual: buffer.dimensions(),
                    expected: spec.dimensions(),
                })
            }
            _ => Ok(()),
        }
    }

    fn finish_batch(&self, batch: Batch) {
        debug_assert_eq!(batch.remaining(), 0);
        let report = batch.complete();
        if report.is_success() {
            info!("{} complete: {} loaded", report.id, report.loaded.len());
        } else {
            warn!(
                "{} complete: {} loaded, {} failed",
                report.id,
                report.loaded.len(),
                report.failures.len()
            );
        }
        self.progress.report(ProgressEvent::BatchCompleted {
            batch: report.id.get(),
            loaded: report.loaded.len(),
            failed: report.failures.len(),
            duration_ms: report.duration.as_millis() as u64,
        });
    }
}
