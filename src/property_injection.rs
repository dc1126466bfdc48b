//! Property (setter) injection: predicate-gated actions run against an
//! already-constructed instance, invoked explicitly via
//! `Resolver::inject_properties`, not folded into construction the way
//! `initializer.rs` actions are — `inject_properties` must be idempotent to
//! call twice on the same instance (spec §8), which an always-on
//! construction-time hook cannot guarantee for externally-constructed
//! values.

use std::sync::Arc;

use crate::key::Key;
use crate::provider::ResolverContext;
use crate::registration::AnyArc;

#[derive(Clone)]
pub(crate) struct PropertyInjectorEntry {
    pub(crate) predicate: Arc<dyn Fn(&Key) -> bool + Send + Sync>,
    pub(crate) inject: Arc<dyn for<'a> Fn(&ResolverContext<'a>, &AnyArc) + Send + Sync>,
}

impl PropertyInjectorEntry {
    pub(crate) fn matches(&self, key: &Key) -> bool {
        (self.predicate)(key)
    }
}
