//! Structural synthesis of `Lazy<T>`/`Func<T>` wrappers around an existing
//! resolver, exposed as inherent methods on `ServiceProvider`/`Scope` rather
//! than through `get::<Lazy<T>>()` — a `TypeId` carries no recoverable
//! generic argument, so the container cannot recognize "this is a `Lazy` of
//! some `T`" from the key alone the way it recognizes a plain `T`.

use std::sync::{Arc, OnceLock};

use crate::error::DiResult;

/// A deferred, memoized resolution of `T`: the factory runs at most once, on
/// first `.get()`.
pub struct Lazy<T: Send + Sync + 'static> {
    cell: OnceLock<Arc<T>>,
    factory: Arc<dyn Fn() -> DiResult<Arc<T>> + Send + Sync>,
}

impl<T: Send + Sync + 'static> Lazy<T> {
    pub(crate) fn new(factory: Arc<dyn Fn() -> DiResult<Arc<T>> + Send + Sync>) -> Self {
        Self { cell: OnceLock::new(), factory }
    }

    /// Resolves `T`, reusing the cached instance after the first call.
    pub fn get(&self) -> DiResult<Arc<T>> {
        if let Some(v) = self.cell.get() {
            return Ok(v.clone());
        }
        let v = (self.factory)()?;
        Ok(self.cell.get_or_init(|| v).clone())
    }
}

/// A re-resolving accessor for `T`: every `.call()` runs the lookup again,
/// honoring whatever lifetime `T` was registered with (a fresh instance for
/// `Transient`, the same one for `PerContainer`).
pub struct Func<T: Send + Sync + 'static> {
    factory: Arc<dyn Fn() -> DiResult<Arc<T>> + Send + Sync>,
}

impl<T: Send + Sync + 'static> Func<T> {
    pub(crate) fn new(factory: Arc<dyn Fn() -> DiResult<Arc<T>> + Send + Sync>) -> Self {
        Self { factory }
    }

    pub fn call(&self) -> DiResult<Arc<T>> {
        (self.factory)()
    }
}
