//! Fallback rules: last-resort factories consulted when no registration,
//! open-generic expansion, or structural synthesis produces an emitter.

use std::sync::Arc;

use crate::error::DiResult;
use crate::key::Key;
use crate::provider::ResolverContext;
use crate::registration::AnyArc;

/// A fallback rule: if `predicate(key)` accepts, `factory` is asked to
/// build the instance. Rules are tried in registration order; the first
/// whose predicate accepts wins. The resulting registration is installed
/// back into the registry under that key so subsequent resolves hit the
/// ordinary (now-direct) registration path.
#[derive(Clone)]
pub(crate) struct FallbackRule {
    pub(crate) predicate: Arc<dyn Fn(&Key) -> bool + Send + Sync>,
    pub(crate) factory: Arc<dyn for<'a> Fn(&ResolverContext<'a>, &Key) -> DiResult<AnyArc> + Send + Sync>,
    pub(crate) lifetime: crate::lifetime::Lifetime,
}

impl FallbackRule {
    pub(crate) fn matches(&self, key: &Key) -> bool {
        (self.predicate)(key)
    }
}
