//! Bulk request bookkeeping: one pending counter per batch.

use std::time::{Duration, Instant};

use super::{AssetKey, LoadError};

/// Handle identifying one bulk load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(u64);

impl BatchId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "batch#{}", self.0)
    }
}

/// Outcome of a finished bulk request, handed to its completion callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// The batch this report belongs to
    pub id: BatchId,
    /// Keys that finished loading, in completion order
    pub loaded: Vec<AssetKey>,
    /// Loads that failed, in completion order
    pub failures: Vec<LoadError>,
    /// Time from issuing the batch to its last completion
    pub duration: Duration,
}

impl BatchReport {
    fn new(id: BatchId) -> Self {
        Self { id, loaded: Vec::new(), failures: Vec::new(), duration: Duration::ZERO }
    }

    /// True when no load in the batch failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of loads the batch waited on.
    pub fn total(&self) -> usize {
        self.loaded.len() + self.failures.len()
    }
}

/// Callback fired once when a batch completes.
pub type CompletionCallback = Box<dyn FnOnce(BatchReport) + Send>;

/// Count of loads a batch is still waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingCounter {
    remaining: usize,
}

impl PendingCounter {
    pub(crate) fn new(remaining: usize) -> Self {
        Self { remaining }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.remaining
    }

    pub(crate) fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Count one completion. Returns true on the decrement that reaches zero.
    pub(crate) fn decrement(&mut self) -> bool {
        match self.remaining {
            0 => false,
            n => {
                self.remaining = n - 1;
                self.remaining == 0
            }
        }
    }
}

/// A bulk request in flight.
pub(crate) struct Batch {
    counter: PendingCounter,
    report: BatchReport,
    on_complete: Option<CompletionCallback>,
    started: Instant,
}

impl Batch {
    pub(crate) fn new(id: BatchId, pending: usize, on_complete: Option<CompletionCallback>) -> Self {
        Self {
            counter: PendingCounter::new(pending),
            report: BatchReport::new(id),
            on_complete,
            started: Instant::now(),
        }
    }

    pub(crate) fn is_done(&self) -> bool {
        self.counter.is_done()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.counter.remaining()
    }

    /// Record one finished load. Returns true once every load has reported.
    pub(crate) fn record(&mut self, outcome: Result<AssetKey, LoadError>) -> bool {
        match outcome {
            Ok(key) => self.report.loaded.push(key),
            Err(error) => self.report.failures.push(error),
        }
        self.counter.decrement()
    }

    /// Fire the completion callback and hand back the final report.
    pub(crate) fn complete(mut self) -> BatchReport {
        self.report.duration = self.started.elapsed();
        if let Some(callback) = self.on_complete.take() {
            callback(self.report.clone());
        }
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_counter_reaches_zero_once() {
        let mut counter = PendingCounter::new(2);
        assert!(!counter.decrement());
        assert!(counter.decrement());
        assert!(!counter.decrement());
        assert!(counter.is_done());
    }

    #[test]
    fn test_batch_records_successes_and_failures() {
        let mut batch = Batch::new(BatchId::new(1), 2, None);
        let key = AssetKey::new("floors", "1");
        assert!(!batch.record(Ok(key.clone())));
        assert!(batch.record(Err(LoadError::NotFound { key: AssetKey::new("floors", "2") })));

        let report = batch.complete();
        assert_eq!(report.loaded, vec![key]);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_success());
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn test_complete_fires_callback_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let batch = Batch::new(
            BatchId::new(7),
            0,
            Some(Box::new(move |report: BatchReport| {
                assert_eq!(report.id, BatchId::new(7));
                calls_clone.fetch_add(1, Ordering::SeqCst);
            })),
        );
        assert!(batch.is_done());
        batch.complete();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
