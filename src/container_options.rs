//! Container-wide options: feature toggles, the scope-manager strategy, and
//! the structural log sink, applied once at `ServiceCollection::build()` time.

use crate::observer::{default_log_sink, LogSink};

/// Which scope-manager implementation backs `ServiceProvider::begin_scope`.
///
/// Only one strategy exists today; the enum exists so the switch is already
/// in place if a task-local (async-flow) manager is ever added alongside
/// the thread-local one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeManagerKind {
    /// Scopes are tracked on a per-thread stack via `begin_scope`/`end_scope`.
    ThreadLocal,
}

impl Default for ScopeManagerKind {
    fn default() -> Self {
        ScopeManagerKind::ThreadLocal
    }
}

/// Container-wide configuration, set once via `ServiceCollection::with_options`
/// before `build()`.
#[derive(Clone)]
pub struct ContainerOptions {
    /// Enables variance-aware enumerable resolution (spec §4.3.3): when a
    /// trait has no direct multi-bindings, `get_all_trait` falls back to
    /// aggregating the compatible trait families declared via
    /// `ServiceCollection::add_variant`.
    pub enable_variance: bool,
    /// Enables property injection: `Resolver::inject_properties` runs the
    /// registered injectors; without this, it is a no-op.
    pub enable_property_injection: bool,
    /// Sink for the structural warnings the container emits itself
    /// (undisposed resources on `Drop`, registration-after-lock).
    pub log_sink: LogSink,
    /// Which scope-manager implementation backs `begin_scope`/`end_scope`.
    pub scope_manager: ScopeManagerKind,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            enable_variance: false,
            enable_property_injection: false,
            log_sink: default_log_sink(),
            scope_manager: ScopeManagerKind::ThreadLocal,
        }
    }
}
