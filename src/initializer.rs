//! Post-construction initializers: a predicate plus an action run on every
//! freshly constructed instance of a matching service, before it is handed
//! to its lifetime's cache (so a `PerContainer` instance is initialized
//! exactly once; a `Transient` one on every construction).

use std::sync::Arc;

use crate::key::Key;
use crate::provider::ResolverContext;
use crate::registration::AnyArc;

#[derive(Clone)]
pub(crate) struct Initializer {
    pub(crate) predicate: Arc<dyn Fn(&Key) -> bool + Send + Sync>,
    pub(crate) action: Arc<dyn for<'a> Fn(&ResolverContext<'a>, &AnyArc) + Send + Sync>,
}

impl Initializer {
    pub(crate) fn matches(&self, key: &Key) -> bool {
        (self.predicate)(key)
    }
}
