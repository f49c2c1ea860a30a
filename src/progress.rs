//! Load progress reporting.
//!
//! The image store reports every batch it opens, every load that finishes
//! and every batch that completes. Reporters decide what to do with those
//! events: discard them, print them for a terminal, or emit JSON lines.
//!
//! # Example
//!
//! ```ignore
//! use tileblend::progress::{ConsoleProgress, ProgressEvent, ProgressReporter};
//!
//! let reporter = ConsoleProgress::new();
//! reporter.report(ProgressEvent::BatchStarted { batch: 1, tier: "retain", total: 3, issued: 3 });
//! ```

use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Outcome of a single asset load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum LoadStatus {
    /// Decoded and retained
    Retained,
    /// Source cache warmed, nothing kept
    Warmed,
    /// Load failed
    Failed(String),
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStatus::Retained => write!(f, "retained"),
            LoadStatus::Warmed => write!(f, "warmed"),
            LoadStatus::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Events reported while loading assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A bulk request was opened
    BatchStarted {
        /// Batch number
        batch: u64,
        /// "retain" or "cache"
        tier: &'static str,
        /// Number of loads the batch waits on
        total: usize,
        /// Loads newly issued for the batch; the rest join loads in flight
        issued: usize,
    },
    /// One asset load finished
    AssetCompleted {
        /// Asset key as `category/identifier`
        key: String,
        /// Load outcome
        #[serde(flatten)]
        status: LoadStatus,
    },
    /// Every load of a batch has reported
    BatchCompleted {
        /// Batch number
        batch: u64,
        /// Loads that succeeded
        loaded: usize,
        /// Loads that failed
        failed: usize,
        /// Time since the batch was opened
        duration_ms: u64,
    },
    /// Something worth telling the user that is not an error
    Warning {
        /// Warning message
        message: String,
    },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);

    /// Check if this reporter wants verbose output.
    fn is_verbose(&self) -> bool {
        false
    }
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    use_colors: bool,
    verbose: bool,
    /// Loads finished so far
    current: AtomicUsize,
    /// Loads issued so far
    total: AtomicUsize,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .field("current", &self.current)
            .field("total", &self.total)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a console reporter writing to stderr.
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false, // Disable colors for custom output
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(output)),
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::BatchStarted { batch, tier, total, issued } => {
                self.total.fetch_add(issued, Ordering::SeqCst);
                self.writeln(&format!(
                    "{} batch#{} {} {} asset{}",
                    self.cyan("[load]"),
                    batch,
                    tier,
                    total,
                    if total == 1 { "" } else { "s" }
                ));
            }
            ProgressEvent::AssetCompleted { key, status } => {
                let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
                let total = self.total.load(Ordering::SeqCst);
                match status {
                    LoadStatus::Failed(err) => {
                        self.writeln(&format!(
                            "{} [{}/{}] {} {}",
                            self.cyan("[load]"),
                            current,
                            total,
                            self.red("FAILED"),
                            key
                        ));
                        self.writeln(&format!("        {}", self.red(&err)));
                    }
                    status if self.verbose => {
                        self.writeln(&format!(
                            "{} [{}/{}] {} {}",
                            self.cyan("[load]"),
                            current,
                            total,
                            self.green(&status.to_string()),
                            key
                        ));
                    }
                    _ => {}
                }
            }
            ProgressEvent::BatchCompleted { batch, loaded, failed, duration_ms } => {
                let duration = format_duration(duration_ms);
                if failed == 0 {
                    self.writeln(&format!(
                        "{} batch#{}: {} loaded in {}",
                        self.green("[done]"),
                        batch,
                        loaded,
                        duration
                    ));
                } else {
                    self.writeln(&format!(
                        "{} batch#{}: {} loaded, {} {} in {}",
                        self.red("[error]"),
                        batch,
                        loaded,
                        failed,
                        if failed == 1 { "failure" } else { "failures" },
                        duration
                    ));
                }
            }
            ProgressEvent::Warning { message } => {
                self.writeln(&format!("{} {}", self.yellow("[warn]"), message));
            }
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// JSON progress reporter for machine-readable output, one object per line.
pub struct JsonProgress {
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProgress").finish()
    }
}

impl JsonProgress {
    /// Create a new JSON progress reporter writing to stderr.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(std::io::stderr())) }
    }

    /// Create a JSON progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let Ok(json) = serde_json::to_string(&event) else {
            return;
        };
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", json);
        }
    }
}

/// Format milliseconds for humans: `850ms`, `2.5s`, `3m 12s`.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}
