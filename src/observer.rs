//! Diagnostic observers and the logging sink for dependency injection.
//!
//! Observers get a synchronous callback on every resolve; the log sink
//! (`LogCategory` -> `LogEntry`) is the coarser-grained hook described by
//! `container_options.log_sink` — used for the two structural warnings the
//! container itself emits (registration-after-lock, disposal errors) rather
//! than per-resolve tracing.

use std::sync::Arc;
use crate::Key;

/// Severity of a single log entry emitted by the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
}

/// Category a log entry was emitted under, passed to `log_sink` so callers
/// can route different kinds of container diagnostics differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Registration,
    Resolution,
    Scope,
    Disposal,
}

/// A single structured log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// A log sink: `(category) -> (entry) -> ()`, matching the shape in the
/// spec's container options. The default sink writes warnings to stderr and
/// drops info-level entries, mirroring the `eprintln!` warnings this crate
/// already emits on Drop for undisposed resources.
pub type LogSink = Arc<dyn Fn(LogCategory) -> Box<dyn FnMut(LogEntry) + Send> + Send + Sync>;

pub(crate) fn default_log_sink() -> LogSink {
    Arc::new(|_category| {
        Box::new(|entry: LogEntry| {
            if entry.level == LogLevel::Warning {
                eprintln!("[ferrous-di] {}", entry.message);
            }
        })
    })
}

/// Observer trait for dependency injection resolution events.
///
/// Calls are made synchronously on the resolving thread; keep
/// implementations cheap.
pub trait DiObserver: Send + Sync {
    /// Called before a service's factory is invoked.
    fn resolving(&self, key: &Key);

    /// Called after a service is successfully resolved.
    fn resolved(&self, key: &Key, duration: std::time::Duration);

    /// Called when a factory panics during resolution. The panic still
    /// propagates after this call returns.
    fn factory_panic(&self, key: &Key, message: &str);
}

/// Container for registered observers. Minimal overhead when empty.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, duration: std::time::Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    #[inline]
    #[allow(dead_code)]
    pub(crate) fn factory_panic(&self, key: &Key, message: &str) {
        for observer in &self.observers {
            observer.factory_panic(key, message);
        }
    }
}

/// Built-in observer that logs resolution events to stdout/stderr.
///
/// # Examples
///
/// ```
/// use ferrous_di::{ServiceCollection, LoggingObserver};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(LoggingObserver::new()));
/// let provider = services.build();
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self { prefix: "[ferrous-di]".to_string() }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        println!("{} Resolving: {}", self.prefix, key.display_name());
    }

    fn resolved(&self, key: &Key, duration: std::time::Duration) {
        println!("{} Resolved: {} in {:?}", self.prefix, key.display_name(), duration);
    }

    fn factory_panic(&self, key: &Key, message: &str) {
        eprintln!("{} FACTORY PANIC in {}: {}", self.prefix, key.display_name(), message);
    }
}
