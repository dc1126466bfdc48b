//! Registration overrides: predicate-gated rewrites applied at build time,
//! before decorators.

use std::sync::Arc;

use crate::key::Key;
use crate::registration::Registration;

/// A registration override. Every override whose predicate matches a given
/// key runs during `build()`, in declaration order, each receiving the
/// registration produced by the previous one (or the original, for the
/// first override to match).
#[derive(Clone)]
pub(crate) struct OverrideRule {
    pub(crate) predicate: Arc<dyn Fn(&Key) -> bool + Send + Sync>,
    pub(crate) rewrite: Arc<dyn Fn(&Key, Registration) -> Registration + Send + Sync>,
}

impl OverrideRule {
    pub(crate) fn matches(&self, key: &Key) -> bool {
        (self.predicate)(key)
    }
}
