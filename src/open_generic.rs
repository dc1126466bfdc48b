//! Open-generic registration storage.
//!
//! `TypeId` carries no recoverable generic-argument information, so this
//! crate cannot expand `Repository<T>` into a family the way a reflection-
//! based container would. Instead, each closed instantiation
//! (`Repository<User>`, `Repository<Order>`, ...) is registered individually
//! under its own `TypeId`, tagged with the shared `base_name` the open
//! generic was declared under, so the crate can still report "this came from
//! the `Repository<T>` open-generic binding" for diagnostics.

use std::sync::Arc;
use crate::lifetime::Lifetime;
use crate::registration::CtorFn;
use crate::provider::ResolverContext;

/// Runtime check on the implementing type's generic arguments, run before
/// the factory on every resolve of a closed instantiation. Returns the
/// violation message on failure (spec §4.3.1).
pub(crate) type ConstraintFn = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> Result<(), String> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct OpenGenericEntry {
    pub(crate) base_name: &'static str,
    pub(crate) ctor: CtorFn,
    pub(crate) lifetime: Lifetime,
    pub(crate) constraint: Option<ConstraintFn>,
}
