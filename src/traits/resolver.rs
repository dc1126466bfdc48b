//! Resolver traits for service resolution.

use std::any::TypeId;
use std::sync::Arc;
use crate::error::DiError;
use crate::error::DiResult;
use crate::key::Key;
use crate::runtime_args::RuntimeArgs;
use crate::traits::{Dispose, AsyncDispose};
use crate::internal::BoxFutureUnit;

/// Core resolver trait for object-safe service resolution.
///
/// Object-safe so it can be stored as `&dyn ResolverCore` inside a compiled
/// recipe closure. Handles circular dependency detection via the per-thread
/// stack in [`crate::internal::circular`]; most callers want the ergonomic
/// generic methods on [`Resolver`] instead.
pub trait ResolverCore: Send + Sync {
    /// Resolves a single service by key.
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn std::any::Any + Send + Sync>>;

    /// Resolves every implementation registered for a multi-bound trait key.
    /// Concrete-type and single-bound trait keys return an empty vector.
    fn resolve_many(&self, key: &Key) -> DiResult<Vec<Arc<dyn std::any::Any + Send + Sync>>>;

    /// Registers a synchronous disposal hook against the current scope (or
    /// the root container, if there is no enclosing scope).
    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>);

    /// Registers an asynchronous disposal hook.
    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>);

    /// Runs every registered property injector whose key matches `key`
    /// against `instance`, returning it (possibly mutated through interior
    /// mutability) unchanged in identity. A no-op if property injection is
    /// disabled.
    fn inject_properties_any(&self, key: &Key, instance: Arc<dyn std::any::Any + Send + Sync>) -> Arc<dyn std::any::Any + Send + Sync>;
}

/// High-level resolver interface with generic, type-safe methods.
///
/// Implemented by `ServiceProvider`, `Scope`, and `ResolverContext`, so
/// factory closures and application code share the same API regardless of
/// where the resolve call originates.
///
/// # Examples
///
/// ```
/// use ferrous_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str);
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) {
///         println!("LOG: {}", msg);
///     }
/// }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(42usize);
/// collection.add_singleton_trait(Arc::new(ConsoleLogger) as Arc<dyn Logger>);
///
/// let provider = collection.build();
///
/// let number = provider.get_required::<usize>();
/// assert_eq!(*number, 42);
///
/// let logger = provider.get_required_trait::<dyn Logger>();
/// logger.log("Service resolved successfully");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Resolver};
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_singleton("configuration".to_string());
    ///
    /// let provider = collection.build();
    /// let config = provider.get::<String>().unwrap();
    /// assert_eq!(&*config, "configuration");
    /// ```
    fn get<T: 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        let any = self.resolve_any(&key)?;
        any.downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))
    }

    /// Resolves a single trait implementation. If multiple implementations
    /// are registered, returns the most recently registered one; use
    /// [`get_all_trait`](Self::get_all_trait) to access every implementation.
    fn get_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Arc<T>>
    where
        Arc<T>: 'static,
    {
        let key = Key::Trait(std::any::type_name::<T>());
        let any = self.resolve_any(&key)?;
        any.downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))
    }

    /// Resolves every registered implementation of a trait, in registration
    /// order.
    fn get_all_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Vec<Arc<T>>>
    where
        Arc<T>: 'static,
    {
        let key = Key::Trait(std::any::type_name::<T>());
        let anys = self.resolve_many(&key)?;

        let mut results = Vec::with_capacity(anys.len());
        for any in anys {
            let arc = any
                .downcast::<Arc<T>>()
                .map(|boxed| (*boxed).clone())
                .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))?;
            results.push(arc);
        }
        Ok(results)
    }

    /// Resolves a concrete service type, panicking on failure. Prefer
    /// [`get`](Self::get) unless the registration is known to be present.
    fn get_required<T: 'static + Send + Sync>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a trait implementation, panicking on failure.
    fn get_required_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Arc<T>
    where
        Arc<T>: 'static,
    {
        self.get_trait::<T>()
            .unwrap_or_else(|e| panic!("failed to resolve trait {}: {}", std::any::type_name::<T>(), e))
    }

    /// Registers a service for synchronous disposal in the current scope
    /// (or the root container, if called outside of any scope). Disposal
    /// hooks run in LIFO order.
    fn register_disposer<T: Dispose>(&self, service: Arc<T>) {
        self.push_sync_disposer(Box::new(move || service.dispose()));
    }

    /// Registers a service for asynchronous disposal. Async hooks run
    /// before sync hooks, both in LIFO order.
    fn register_async_disposer<T: AsyncDispose>(&self, service: Arc<T>) {
        self.push_async_disposer(Box::new(move || {
            Box::pin(async move {
                service.dispose().await;
            })
        }));
    }

    /// Resolves a named concrete service registration.
    fn get_named<T: 'static + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
        let key = Key::named_type(TypeId::of::<T>(), std::any::type_name::<T>(), name);
        let any = self.resolve_any(&key)?;
        any.downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))
    }

    /// Resolves a named concrete service registration, panicking on failure.
    fn get_named_required<T: 'static + Send + Sync>(&self, name: &str) -> Arc<T> {
        self.get_named::<T>(name)
            .unwrap_or_else(|e| panic!("failed to resolve {} named '{}': {}", std::any::type_name::<T>(), name, e))
    }

    /// Resolves a named trait implementation.
    fn get_named_trait<T: ?Sized + 'static + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>>
    where
        Arc<T>: 'static,
    {
        let key = Key::named_trait(std::any::type_name::<T>(), name);
        let any = self.resolve_any(&key)?;
        any.downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>().to_string()))
    }

    /// Resolves a named trait implementation, panicking on failure.
    fn get_named_trait_required<T: ?Sized + 'static + Send + Sync>(&self, name: &str) -> Arc<T>
    where
        Arc<T>: 'static,
    {
        self.get_named_trait::<T>(name)
            .unwrap_or_else(|e| panic!("failed to resolve trait {} named '{}': {}", std::any::type_name::<T>(), name, e))
    }

    /// Applies every matching registered property injector to `instance`,
    /// returning it unchanged if none match or property injection is
    /// disabled. Safe to call more than once: injectors are expected to use
    /// interior mutability (`OnceLock`, etc.), so a repeat call is a no-op
    /// (spec §8).
    fn inject_properties<T: 'static + Send + Sync>(&self, instance: Arc<T>) -> Arc<T> {
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        let any: Arc<dyn std::any::Any + Send + Sync> = instance;
        let injected = self.inject_properties_any(&key, any);
        injected
            .downcast::<T>()
            .unwrap_or_else(|_| panic!("inject_properties_any returned a different type than it was given"))
    }

    /// Resolves a dependency required while constructing `for_type`, turning
    /// a missing registration into `DiError::UnresolvedDependency` rather
    /// than `DiError::NotRegistered`.
    fn require_dependency<T: 'static + Send + Sync>(&self, for_type: &'static str) -> DiResult<Arc<T>> {
        self.get::<T>().map_err(|_| DiError::UnresolvedDependency {
            for_type: for_type.to_string(),
            dependency: std::any::type_name::<T>().to_string(),
        })
    }

    /// Resolves `T` using the supplied runtime arguments in place of (or
    /// alongside) the registered constructor, as far as the factory
    /// consults `RuntimeArgs::current()` (spec §3, §4.6).
    fn resolve_with_args<T: 'static + Send + Sync>(&self, args: RuntimeArgs) -> DiResult<Arc<T>> {
        let _guard = RuntimeArgs::push(args);
        self.get::<T>()
    }
}
