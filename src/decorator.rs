//! Construction-based service decoration.
//!
//! A decorator wraps the instance a registration would otherwise produce.
//! Concretely it is a closure `(resolver, inner) -> replacement` — the
//! "inner" emitter it wraps is substituted directly, so there is no
//! recursive `resolve()` call and therefore no cycle-guard interaction at
//! all (see `internal/circular.rs`).
//!
//! Multiple decorators on the same key are folded at `build()` time in
//! descending registration-index order: the most-recently-registered
//! decorator is applied first (closest to the target), so the
//! first-registered decorator ends up outermost.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::error::DiResult;
use crate::provider::ResolverContext;
use crate::registration::AnyArc;

type DecorateAnyFn = Arc<dyn for<'a> Fn(AnyArc, &ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// One registered decorator, tagged with its registration-order index.
#[derive(Clone)]
pub(crate) struct DecoratorEntry {
    pub(crate) index: usize,
    pub(crate) decorate: DecorateAnyFn,
}

/// Strongly-typed decorator for a concrete service type `T`.
///
/// Implement this to wrap every instance of `T` the container produces,
/// regardless of how it was registered (value, factory, or another
/// decorator further in).
pub trait ServiceDecorator<T: Send + Sync + 'static>: Send + Sync {
    /// Wraps (or replaces) `original`, optionally consulting `resolver` for
    /// additional dependencies.
    fn decorate(&self, original: Arc<T>, resolver: &dyn crate::traits::ResolverCore) -> Arc<T>;
}

/// Strongly-typed decorator for a trait object service `T: ?Sized`.
pub trait TraitDecorator<T: ?Sized + Send + Sync + 'static>: Send + Sync {
    /// Wraps (or replaces) `original`.
    fn decorate(&self, original: Arc<T>, resolver: &dyn crate::traits::ResolverCore) -> Arc<T>;
}

impl<T, F> ServiceDecorator<T> for F
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>, &dyn crate::traits::ResolverCore) -> Arc<T> + Send + Sync,
{
    fn decorate(&self, original: Arc<T>, resolver: &dyn crate::traits::ResolverCore) -> Arc<T> {
        (self)(original, resolver)
    }
}

/// Builds a type-erased decorator entry from a concrete-type decorator.
pub(crate) fn erase_service_decorator<T, D>(index: usize, decorator: D) -> DecoratorEntry
where
    T: Send + Sync + 'static,
    D: ServiceDecorator<T> + 'static,
{
    let decorator = Arc::new(decorator);
    DecoratorEntry {
        index,
        decorate: Arc::new(move |any: AnyArc, resolver: &ResolverContext<'_>| -> DiResult<AnyArc> {
            let typed: Arc<T> = any
                .downcast::<T>()
                .map_err(|_| crate::error::DiError::TypeMismatch(std::any::type_name::<T>().to_string()))?;
            let decorated = decorator.decorate(typed, resolver);
            Ok(decorated as AnyArc)
        }),
    }
}

/// Builds a type-erased decorator entry from a plain closure that ignores
/// the resolver, wrapping a trait-object service (the `decorate_trait`
/// convenience form).
pub(crate) fn erase_trait_decorator_fn<T, F>(index: usize, f: F) -> DecoratorEntry
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(Arc<T>) -> Arc<T> + Send + Sync + 'static,
{
    DecoratorEntry {
        index,
        decorate: Arc::new(move |any: AnyArc, _resolver: &ResolverContext<'_>| -> DiResult<AnyArc> {
            let boxed: Arc<Arc<T>> = any
                .downcast::<Arc<T>>()
                .map_err(|_| crate::error::DiError::TypeMismatch(std::any::type_name::<T>().to_string()))?;
            let original = (*boxed).clone();
            let decorated = f(original);
            Ok(Arc::new(decorated) as AnyArc)
        }),
    }
}

/// Builds a type-erased decorator entry from a trait-object decorator.
///
/// `downcast` extracts the concrete `Arc<T>` stored in the registry's
/// `Arc<Arc<dyn Trait>>` double-wrap convention; `rewrap` re-applies it.
pub(crate) fn erase_trait_decorator<T, D>(
    index: usize,
    decorator: D,
) -> DecoratorEntry
where
    T: ?Sized + Send + Sync + 'static,
    D: TraitDecorator<T> + 'static,
{
    let decorator = Arc::new(decorator);
    DecoratorEntry {
        index,
        decorate: Arc::new(move |any: AnyArc, resolver: &ResolverContext<'_>| -> DiResult<AnyArc> {
            let boxed: Arc<Arc<T>> = any
                .downcast::<Arc<T>>()
                .map_err(|_| crate::error::DiError::TypeMismatch(std::any::type_name::<T>().to_string()))?;
            let original = (*boxed).clone();
            let decorated = decorator.decorate(original, resolver);
            Ok(Arc::new(decorated) as AnyArc)
        }),
    }
}

/// Folds a list of decorators, first-registered outermost, around `base`.
pub(crate) fn fold_decorators(
    base: Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>,
    mut entries: Vec<DecoratorEntry>,
) -> Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync> {
    entries.sort_by_key(|e| e.index);
    let mut current = base;
    for entry in entries.into_iter().rev() {
        let inner = current.clone();
        let decorate = entry.decorate.clone();
        current = Arc::new(move |r: &ResolverContext<'_>| -> DiResult<AnyArc> {
            let built = inner(r)?;
            decorate(built, r)
        });
    }
    current
}

/// Identity used to key a decorator target: a type or trait name plus the
/// normalized service name it decorates (empty = default).
pub(crate) fn decorator_type_id<T: 'static>() -> TypeId {
    TypeId::of::<T>()
}

#[allow(dead_code)]
pub(crate) fn any_type_id(value: &dyn Any) -> TypeId {
    value.type_id()
}
