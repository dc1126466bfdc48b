//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type and related functionality
//! for registering services and building service providers.

use std::any::TypeId;
use std::sync::Arc;

use crate::{DiResult, DiError, Key, Lifetime, ServiceDescriptor, DiObserver};
use crate::registration::{Registry, Registration, AnyArc};
use crate::provider::ResolverContext;
use crate::observer::Observers;
use crate::ServiceProvider;
use crate::container_options::ContainerOptions;
use crate::fallback::FallbackRule;
use crate::initializer::Initializer;
use crate::override_rule::OverrideRule;
use crate::open_generic::OpenGenericEntry;
use crate::property_injection::PropertyInjectorEntry;


pub mod module_system;
pub use module_system::*;

pub struct ServiceCollection {
    registry: Registry,
    observers: Observers,
    options: ContainerOptions,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            observers: Observers::new(),
            options: ContainerOptions::default(),
        }
    }
    
    // ----- Concrete Type Registrations -----
    
    /// Registers a singleton instance that will be shared across the entire application.
    /// 
    /// The instance is created immediately and wrapped in an `Arc` for thread-safe sharing.
    /// All requests for this service type will return the same instance.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::ServiceCollection;
    /// struct Config { 
    ///     database_url: String 
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Config {
    ///     database_url: "postgres://localhost".to_string()
    /// });
    /// ```
    pub fn add_singleton<T: 'static + Send + Sync>(&mut self, value: T) -> &mut Self {
        let arc = Arc::new(value);
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> {
            Ok(arc.clone())
        };
        self.registry.insert(key, Registration::with_metadata(
            Lifetime::PerContainer,
            Arc::new(ctor),
            None,
            Some(TypeId::of::<T>()),
        ));
        self
    }
    
    /// Registers a singleton factory that creates the instance on first request.
    ///
    /// The factory is called only once, and the result is cached and shared across
    /// all subsequent requests. The factory receives a `ResolverContext` to resolve
    /// dependencies.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// struct Database { url: String }
    /// struct UserService { db: Arc<Database> }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Database { url: "postgres://localhost".to_string() });
    /// services.add_singleton_factory::<UserService, _>(|resolver| {
    ///     UserService {
    ///         db: resolver.get_required::<Database>()
    ///     }
    /// });
    /// ```
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::PerContainer, factory)
    }
    
    /// Registers a scoped factory that creates one instance per scope.
    ///
    /// Each scope gets its own instance, but within a scope, the same instance
    /// is reused. Perfect for per-request services in web applications.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// struct Database { url: String }
    /// struct RequestContext { request_id: String }
    /// struct UserService { db: Arc<Database>, context: Arc<RequestContext> }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Database { url: "postgres://localhost".to_string() });
    /// services.add_scoped_factory::<RequestContext, _>(|_| {
    ///     RequestContext { request_id: "req-123".to_string() }
    /// });
    /// services.add_scoped_factory::<UserService, _>(|resolver| {
    ///     UserService {
    ///         db: resolver.get_required::<Database>(),
    ///         context: resolver.get_required::<RequestContext>()
    ///     }
    /// });
    /// ```
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::PerScope, factory)
    }
    
    /// Registers a transient factory that creates a new instance on every request.
    ///
    /// No caching is performed - the factory is called every time this service
    /// is resolved, even within the same scope.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// struct Database { url: String }
    /// struct Logger { timestamp: std::time::SystemTime }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Database { url: "postgres://localhost".to_string() });
    /// services.add_transient_factory::<Logger, _>(|_| {
    ///     Logger { timestamp: std::time::SystemTime::now() }
    /// });
    /// ```
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Transient, factory)
    }

    /// Registers a per-request factory: a new instance every call, same as
    /// [`add_transient_factory`](Self::add_transient_factory), except the
    /// instance is expected to register its own disposal (via
    /// [`Resolver::register_disposer`](crate::Resolver::register_disposer))
    /// with the resolving scope, rather than going untracked.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// struct RequestTicket(u32);
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_per_request_factory::<RequestTicket, _>(|_| RequestTicket(1));
    /// ```
    pub fn add_per_request_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::PerRequest, factory)
    }

    fn add_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        let factory = Arc::new(factory);
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            // Let factories run - circular dependencies will panic with CircularPanic
            // All other panics (including from get_required) will be caught at the top level
            Ok(Arc::new(factory(r)))
        };
        self.registry.insert(key, Registration::with_metadata(
            lifetime,
            Arc::new(ctor),
            None,
            Some(TypeId::of::<T>()),
        ));
        self
    }
    
    // ----- Trait Single-Binding Registrations -----
    
    /// Registers a singleton trait implementation.
    ///
    /// Binds a concrete implementation to a trait, creating a single instance
    /// that's shared across the entire application. The implementation must
    /// already be wrapped in an `Arc`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Logger: Send + Sync {
    ///     fn log(&self, message: &str);
    /// }
    ///
    /// struct FileLogger { path: String }
    /// impl Logger for FileLogger {
    ///     fn log(&self, message: &str) {
    ///         // Write to file
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// let logger = Arc::new(FileLogger { path: "/var/log/app.log".to_string() });
    /// services.add_singleton_trait::<dyn Logger>(logger);
    /// ```
    pub fn add_singleton_trait<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        let key = Key::Trait(std::any::type_name::<T>());
        // Expert fix: Store as Arc<Arc<dyn Trait>> in Any
        let any_arc: AnyArc = Arc::new(value.clone());
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> {
            Ok(any_arc.clone())
        };
        self.registry.insert(key, Registration::with_metadata(
            Lifetime::PerContainer,
            Arc::new(ctor),
            None,
            None, // We don't know the concrete implementation type for trait objects
        ));
        self
    }
    
    /// Registers a singleton trait factory.
    ///
    /// The factory creates a trait implementation on first request, and the result
    /// is cached as a singleton. The factory must return an `Arc<Trait>`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Logger: Send + Sync {
    ///     fn log(&self, message: &str);
    /// }
    ///
    /// struct FileLogger { path: String }
    /// impl Logger for FileLogger {
    ///     fn log(&self, message: &str) {
    ///         // Write to file
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_trait_factory::<dyn Logger, _>(|_| {
    ///     Arc::new(FileLogger { path: "/var/log/app.log".to_string() })
    /// });
    /// ```
    pub fn add_singleton_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_trait_factory_impl(Lifetime::PerContainer, factory)
    }
    
    /// Registers a scoped trait factory.
    ///
    /// Creates one trait implementation per scope. Within a scope, the same instance
    /// is reused, but different scopes get different instances.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait RequestLogger: Send + Sync {
    ///     fn log_request(&self, path: &str);
    /// }
    ///
    /// struct FileRequestLogger { 
    ///     request_id: String,
    ///     file_handle: std::fs::File 
    /// }
    /// impl RequestLogger for FileRequestLogger {
    ///     fn log_request(&self, path: &str) {
    ///         // Log with request ID
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_scoped_trait_factory::<dyn RequestLogger, _>(|_| {
    ///     Arc::new(FileRequestLogger { 
    ///         request_id: "req-456".to_string(),
    ///         file_handle: std::fs::File::create("/tmp/request.log").unwrap()
    ///     })
    /// });
    /// ```
    pub fn add_scoped_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_trait_factory_impl(Lifetime::PerScope, factory)
    }
    
    /// Registers a transient trait factory.
    ///
    /// Creates a new trait implementation on every request. No caching is performed,
    /// making this suitable for lightweight, stateless services.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ferrous_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait TimeProvider: Send + Sync {
    ///     fn now(&self) -> std::time::SystemTime;
    /// }
    ///
    /// struct SystemTimeProvider;
    /// impl TimeProvider for SystemTimeProvider {
    ///     fn now(&self) -> std::time::SystemTime {
    ///         std::time::SystemTime::now()
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_transient_trait_factory::<dyn TimeProvider, _>(|_| {
    ///     Arc::new(SystemTimeProvider)
    /// });
    /// ```
    pub fn add_transient_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_trait_factory_impl(Lifetime::Transient, factory)
    }
    
    fn add_trait_factory_impl<Trait, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        let key = Key::Trait(std::any::type_name::<Trait>());
        let factory = Arc::new(factory);
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            // Expert fix: Store as Arc<Arc<dyn Trait>> in Any
            Ok(Arc::new(factory(r)))
        };
        self.registry.insert(key, Registration::with_metadata(
            lifetime,
            Arc::new(ctor),
            None,
            None, // We don't know the concrete implementation type for trait factories
        ));
        self
    }
    
    // ----- Trait Multi-Binding Registrations -----
    
    /// Add trait implementation to multi-binding list
    pub fn add_trait_implementation<T>(&mut self, value: Arc<T>, lifetime: Lifetime) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        let name = std::any::type_name::<T>();
        // Expert fix: Store Arc<dyn Trait> INSIDE Any as Arc<Arc<dyn Trait>>
        let any_arc: AnyArc = Arc::new(value.clone());
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> {
            Ok(any_arc.clone())
        };
        self.registry.many.entry(name).or_default().push(Registration::with_metadata(
            lifetime,
            Arc::new(ctor),
            None,
            None, // We don't know the concrete implementation type for trait objects
        ));
        self
    }
    
    /// Add trait factory to multi-binding list
    pub fn add_trait_factory<Trait, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        let name = std::any::type_name::<Trait>();
        let factory = Arc::new(factory);
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            // Expert fix: Store as Arc<Arc<dyn Trait>> in Any
            Ok(Arc::new(factory(r)))
        };
        self.registry.many.entry(name).or_default().push(Registration::with_metadata(
            lifetime,
            Arc::new(ctor),
            None,
            None, // We don't know the concrete implementation type for trait factories
        ));
        self
    }
    
    // ----- Service Descriptors and Introspection -----
    
    /// Get all service descriptors for introspection and diagnostics.
    ///
    /// Returns a vector of `ServiceDescriptor` objects that describe all registered services,
    /// including their keys, lifetimes, and implementation type information when available.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Lifetime};
    /// use std::sync::Arc;
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(42usize);
    /// services.add_scoped_factory::<String, _>(|_| "hello".to_string());
    ///
    /// let descriptors = services.get_service_descriptors();
    /// assert_eq!(descriptors.len(), 2);
    /// 
    /// // Find the usize singleton
    /// let usize_desc = descriptors.iter()
    ///     .find(|d| d.type_name().contains("usize"))
    ///     .unwrap();
    /// assert_eq!(usize_desc.lifetime, Lifetime::PerContainer);
    /// ```
    pub fn get_service_descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut descriptors = Vec::new();
        
        // Single-binding services
        for (key, registration) in self.registry.iter() {
            descriptors.push(ServiceDescriptor {
                key: key.clone(),
                lifetime: registration.lifetime,
                impl_type_id: registration.impl_id,
                impl_type_name: registration.impl_id.map(|_| key.display_name()), // Use the key's display name as impl name
                has_metadata: registration.metadata.is_some(),
            });
        }
        
        // Multi-binding services
        for (trait_name, registrations) in &self.registry.many {
            for (index, registration) in registrations.iter().enumerate() {
                descriptors.push(ServiceDescriptor {
                    key: Key::MultiTrait(trait_name, index),
                    lifetime: registration.lifetime,
                    impl_type_id: registration.impl_id,
                    impl_type_name: registration.impl_id.map(|_| *trait_name),
                    has_metadata: registration.metadata.is_some(),
                });
            }
        }
        
        descriptors
    }
    
    /// Register a service with custom metadata.
    ///
    /// Metadata can be used for diagnostics, configuration, or other runtime introspection.
    /// The metadata must implement Send + Sync + 'static.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Lifetime};
    /// use std::sync::Arc;
    ///
    /// #[derive(Debug)]
    /// struct ServiceMetadata {
    ///     description: String,
    ///     version: String,
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_with_metadata(
    ///     42usize,
    ///     Lifetime::PerContainer,
    ///     ServiceMetadata {
    ///         description: "Answer to everything".to_string(),
    ///         version: "1.0".to_string(),
    ///     }
    /// );
    /// ```
    pub fn add_with_metadata<T, M>(&mut self, value: T, lifetime: Lifetime, metadata: M) -> &mut Self
    where
        T: 'static + Send + Sync,
        M: Send + Sync + 'static,
    {
        let arc = Arc::new(value);
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> {
            Ok(arc.clone())
        };
        self.registry.insert(key, Registration::with_metadata(
            lifetime,
            Arc::new(ctor),
            Some(Box::new(metadata)),
            Some(TypeId::of::<T>()),
        ));
        self
    }
    
    /// Get metadata for a specific service key.
    ///
    /// Returns the metadata if it exists and can be downcast to the specified type.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ferrous_di::{ServiceCollection, Lifetime, Key};
    /// # use std::any::TypeId;
    /// # #[derive(Debug, PartialEq)]
    /// # struct ServiceMetadata { description: String }
    /// # let mut services = ServiceCollection::new();
    /// # services.add_with_metadata(42usize, Lifetime::PerContainer, ServiceMetadata { description: "test".to_string() });
    /// let key = Key::Type(TypeId::of::<usize>(), "usize");
    /// let metadata = services.get_metadata::<ServiceMetadata>(&key);
    /// assert!(metadata.is_some());
    /// ```
    pub fn get_metadata<M: 'static>(&self, key: &Key) -> Option<&M> {
        self.registry.get(key)?
            .metadata.as_ref()?
            .downcast_ref::<M>()
    }
    
    // ----- Conditional Registration (TryAdd*) -----
    
    /// Register a singleton if not already registered.
    ///
    /// This method only registers the service if no service of type `T` is currently registered.
    /// It returns `true` if the service was registered, `false` if it was already registered.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::ServiceCollection;
    ///
    /// let mut services = ServiceCollection::new();
    /// 
    /// let registered1 = services.try_add_singleton(42usize);
    /// assert!(registered1); // First registration succeeds
    /// 
    /// let registered2 = services.try_add_singleton(100usize);
    /// assert!(!registered2); // Second registration is ignored
    /// ```
    pub fn try_add_singleton<T: 'static + Send + Sync>(&mut self, value: T) -> bool {
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        if self.registry.contains_key(&key) {
            false
        } else {
            self.add_singleton(value);
            true
        }
    }
    
    /// Register a singleton factory if not already registered.
    pub fn try_add_singleton_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        if self.registry.contains_key(&key) {
            false
        } else {
            self.add_singleton_factory(factory);
            true
        }
    }
    
    /// Register a scoped factory if not already registered.
    pub fn try_add_scoped_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        if self.registry.contains_key(&key) {
            false
        } else {
            self.add_scoped_factory(factory);
            true
        }
    }
    
    /// Register a transient factory if not already registered.
    pub fn try_add_transient_factory<T, F>(&mut self, factory: F) -> bool
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        if self.registry.contains_key(&key) {
            false
        } else {
            self.add_transient_factory(factory);
            true
        }
    }
    
    /// Register a singleton trait if not already registered.
    pub fn try_add_singleton_trait<T>(&mut self, value: Arc<T>) -> bool
    where
        T: ?Sized + 'static + Send + Sync,
    {
        let key = Key::Trait(std::any::type_name::<T>());
        if self.registry.contains_key(&key) {
            false
        } else {
            self.add_singleton_trait(value);
            true
        }
    }
    
    /// Register a singleton trait factory if not already registered.
    pub fn try_add_singleton_trait_factory<Trait, F>(&mut self, factory: F) -> bool
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        let key = Key::Trait(std::any::type_name::<Trait>());
        if self.registry.contains_key(&key) {
            false
        } else {
            self.add_singleton_trait_factory(factory);
            true
        }
    }
    
    /// Register a scoped trait factory if not already registered.
    pub fn try_add_scoped_trait_factory<Trait, F>(&mut self, factory: F) -> bool
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        let key = Key::Trait(std::any::type_name::<Trait>());
        if self.registry.contains_key(&key) {
            false
        } else {
            self.add_scoped_trait_factory(factory);
            true
        }
    }
    
    /// Register a transient trait factory if not already registered.
    pub fn try_add_transient_trait_factory<Trait, F>(&mut self, factory: F) -> bool
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        let key = Key::Trait(std::any::type_name::<Trait>());
        if self.registry.contains_key(&key) {
            false
        } else {
            self.add_transient_trait_factory(factory);
            true
        }
    }
    
    /// Add enumerable trait registration (always adds, doesn't check for existing).
    ///
    /// This method is equivalent to `add_trait_implementation` but with a name that matches
    /// Microsoft.Extensions.DependencyInjection conventions.
    pub fn try_add_enumerable<T>(&mut self, value: Arc<T>, lifetime: Lifetime) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        // For enumerable services, we always add (no conditional logic)
        self.add_trait_implementation(value, lifetime)
    }
    
    // ----- Named Service Registration -----
    
    /// Register a named singleton service.
    ///
    /// Named services allow multiple registrations of the same type distinguished by name.
    /// This is useful for scenarios like multiple database connections, different configurations, etc.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::ServiceCollection;
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_named_singleton("primary", 42usize);
    /// services.add_named_singleton("secondary", 100usize);
    /// 
    /// let provider = services.build();
    /// // These would be resolved separately by name
    /// ```
    pub fn add_named_singleton<T: 'static + Send + Sync>(&mut self, name: &'static str, value: T) -> &mut Self {
        let arc = Arc::new(value);
        let key = Key::named_type(TypeId::of::<T>(), std::any::type_name::<T>(), name);
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> {
            Ok(arc.clone())
        };
        self.registry.insert(key, Registration::with_metadata(
            Lifetime::PerContainer,
            Arc::new(ctor),
            None,
            Some(TypeId::of::<T>()),
        ));
        self
    }

    /// Register a named singleton factory.
    pub fn add_named_singleton_factory<T, F>(&mut self, name: &'static str, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let key = Key::named_type(TypeId::of::<T>(), std::any::type_name::<T>(), name);
        let factory = Arc::new(factory);
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(r)))
        };
        self.registry.insert(key, Registration::with_metadata(
            Lifetime::PerContainer,
            Arc::new(ctor),
            None,
            Some(TypeId::of::<T>()),
        ));
        self
    }
    
    /// Register a named scoped factory.
    pub fn add_named_scoped_factory<T, F>(&mut self, name: &'static str, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let key = Key::named_type(TypeId::of::<T>(), std::any::type_name::<T>(), name);
        let factory = Arc::new(factory);
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(r)))
        };
        self.registry.insert(key, Registration::with_metadata(
            Lifetime::PerScope,
            Arc::new(ctor),
            None,
            Some(TypeId::of::<T>()),
        ));
        self
    }
    
    /// Register a named transient factory.
    pub fn add_named_transient_factory<T, F>(&mut self, name: &'static str, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let key = Key::named_type(TypeId::of::<T>(), std::any::type_name::<T>(), name);
        let factory = Arc::new(factory);
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(r)))
        };
        self.registry.insert(key, Registration::with_metadata(
            Lifetime::Transient,
            Arc::new(ctor),
            None,
            Some(TypeId::of::<T>()),
        ));
        self
    }

    /// Register a named singleton trait.
    pub fn add_named_singleton_trait<T>(&mut self, name: &'static str, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        let key = Key::named_trait(std::any::type_name::<T>(), name);
        let any_arc: AnyArc = Arc::new(value.clone());
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> {
            Ok(any_arc.clone())
        };
        self.registry.insert(key, Registration::with_metadata(
            Lifetime::PerContainer,
            Arc::new(ctor),
            None,
            None, // We don't know the concrete implementation type for trait objects
        ));
        self
    }
    
    /// Register a named singleton trait factory.
    pub fn add_named_singleton_trait_factory<Trait, F>(&mut self, name: &'static str, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        let key = Key::named_trait(std::any::type_name::<Trait>(), name);
        let factory = Arc::new(factory);
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(r)))
        };
        self.registry.insert(key, Registration::with_metadata(
            Lifetime::PerContainer,
            Arc::new(ctor),
            None,
            None,
        ));
        self
    }
    
    /// Register a named scoped trait factory.
    pub fn add_named_scoped_trait_factory<Trait, F>(&mut self, name: &'static str, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        let key = Key::named_trait(std::any::type_name::<Trait>(), name);
        let factory = Arc::new(factory);
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(r)))
        };
        self.registry.insert(key, Registration::with_metadata(
            Lifetime::PerScope,
            Arc::new(ctor),
            None,
            None,
        ));
        self
    }
    
    /// Register a named transient trait factory.
    pub fn add_named_transient_trait_factory<Trait, F>(&mut self, name: &'static str, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        let key = Key::named_trait(std::any::type_name::<Trait>(), name);
        let factory = Arc::new(factory);
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(r)))
        };
        self.registry.insert(key, Registration::with_metadata(
            Lifetime::Transient,
            Arc::new(ctor),
            None,
            None,
        ));
        self
    }
    
    /// Add named multi-trait registration.
    pub fn add_named_trait_implementation<T>(&mut self, name: &'static str, value: Arc<T>, lifetime: Lifetime) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        let trait_name = std::any::type_name::<T>();
        let any_arc: AnyArc = Arc::new(value.clone());
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> {
            Ok(any_arc.clone())
        };
        
        // For named multi-trait, we need to create unique keys with names
        // We'll use a combination approach: store in many with a combined key
        let combined_key = format!("{}#{}", trait_name, name);
        let static_key: &'static str = Box::leak(combined_key.into_boxed_str());
        
        self.registry.many.entry(static_key).or_default().push(Registration::with_metadata(
            lifetime,
            Arc::new(ctor),
            None,
            None,
        ));
        self
    }
    
    // ----- Observer Management -----
    
    /// Adds a diagnostic observer for DI resolution events.
    ///
    /// Observers enable structured tracing and monitoring of the dependency injection
    /// container's behavior. This is particularly valuable for agentic systems where
    /// you need to correlate DI events with agent execution steps and debug complex
    /// resolution chains.
    ///
    /// # Performance
    ///
    /// Observer calls are made synchronously during resolution. Keep observer
    /// implementations lightweight to avoid impacting performance.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, LoggingObserver, DiObserver};
    /// use std::sync::Arc;
    ///
    /// // Using the built-in logging observer
    /// let mut services = ServiceCollection::new();
    /// services.add_observer(Arc::new(LoggingObserver::new()));
    ///
    /// // Using a custom observer
    /// struct MetricsObserver {
    ///     counter: std::sync::Arc<std::sync::atomic::AtomicU64>,
    /// }
    ///
    /// impl DiObserver for MetricsObserver {
    ///     fn resolving(&self, key: &ferrous_di::Key) {
    ///         self.counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    ///     }
    ///
    ///     fn resolved(&self, _key: &ferrous_di::Key, _duration: std::time::Duration) {}
    ///     fn factory_panic(&self, _key: &ferrous_di::Key, _message: &str) {}
    /// }
    ///
    /// let counter = Arc::new(std::sync::atomic::AtomicU64::new(0));
    /// services.add_observer(Arc::new(MetricsObserver { counter: counter.clone() }));
    ///
    /// let provider = services.build();
    /// // All resolutions will be observed
    /// ```
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }
    
    // ----- Decoration / Interceptors -----
    
    /// Decorates all registrations of a trait with a wrapper function.
    ///
    /// This enables cross-cutting concerns like logging, timeouts, retries, rate limiting,
    /// authentication, and PII scrubbing without modifying the original implementations.
    /// The decorator function is applied to both single-binding and multi-binding registrations.
    ///
    /// This is particularly powerful for agentic systems where you need to apply consistent
    /// policies across all tools or services.
    ///
    /// # Arguments
    ///
    /// * `decorator` - A function that takes an `Arc<T>` and returns a wrapped `Arc<T>`
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Tool: Send + Sync {
    ///     fn execute(&self, input: &str) -> String;
    /// }
    ///
    /// struct FileTool;
    /// impl Tool for FileTool {
    ///     fn execute(&self, input: &str) -> String {
    ///         format!("File operation: {}", input)
    ///     }
    /// }
    ///
    /// struct LoggingWrapper<T: ?Sized> {
///     inner: Arc<T>,
/// }
///
/// impl<T: ?Sized> LoggingWrapper<T> {
///     fn new(inner: Arc<T>) -> Self { Self { inner } }
/// }
///
/// impl<T: Tool + ?Sized> Tool for LoggingWrapper<T> {
    ///     fn execute(&self, input: &str) -> String {
    ///         println!("Executing tool with input: {}", input);
    ///         let result = self.inner.execute(input);
    ///         println!("Tool result: {}", result);
    ///         result
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// 
    /// // Register tools
    /// services.add_singleton_trait::<dyn Tool>(Arc::new(FileTool));
    ///
    /// // Apply logging to all tools
    /// services.decorate_trait::<dyn Tool, _>(|tool| {
    ///     Arc::new(LoggingWrapper::new(tool))
    /// });
    ///
    /// let provider = services.build();
    /// let tool = provider.get_required_trait::<dyn Tool>();
    /// let result = tool.execute("test.txt");
    /// // Logs: "Executing tool with input: test.txt"
    /// // Logs: "Tool result: File operation: test.txt"
    /// ```
    pub fn decorate_trait<T, F>(&mut self, decorator: F) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
        F: Fn(Arc<T>) -> Arc<T> + Send + Sync + 'static,
    {
        let trait_name = std::any::type_name::<T>();
        // Deferred until `finalize()`: whichever registration(s) exist under
        // this key by build() time get decorated, regardless of whether
        // they were registered before or after this call. The first
        // decorator registered ends up outermost (spec §4.3.4).
        self.registry.add_decorator(Key::Trait(trait_name), |index| {
            crate::decorator::erase_trait_decorator_fn::<T, F>(index, decorator)
        });
        self
    }

    /// Decorates every registration of the concrete type `T`, the
    /// non-trait counterpart to [`decorate_trait`](Self::decorate_trait).
    /// `D` implements [`ServiceDecorator<T>`](crate::decorator::ServiceDecorator).
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Resolver, ServiceDecorator};
    /// use std::sync::Arc;
    ///
    /// struct Greeter { name: String }
    ///
    /// struct Shout;
    /// impl ServiceDecorator<Greeter> for Shout {
    ///     fn decorate(&self, original: Arc<Greeter>, _resolver: &dyn ferrous_di::ResolverCore) -> Arc<Greeter> {
    ///         Arc::new(Greeter { name: original.name.to_uppercase() })
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Greeter { name: "hi".to_string() });
    /// services.decorate::<Greeter, _>(Shout);
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<Greeter>().name, "HI");
    /// ```
    pub fn decorate<T, D>(&mut self, decorator: D) -> &mut Self
    where
        T: 'static + Send + Sync,
        D: crate::decorator::ServiceDecorator<T> + 'static,
    {
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        self.registry.add_decorator(key, |index| {
            crate::decorator::erase_service_decorator::<T, D>(index, decorator)
        });
        self
    }

    // ----- Fallback / Override / Initializer rules -----

    /// Registers a fallback used to synthesize a value when `key` has no
    /// direct registration (spec §4.3.3). Fallbacks are tried in
    /// registration order; the first whose predicate matches wins. The
    /// synthesized value honors `lifetime` the same way a normal
    /// registration would, except `Lifetime::PerScope` is rejected at
    /// resolve time (there is no slot to assign a dynamically-synthesized
    /// registration to).
    pub fn add_fallback<F, P>(&mut self, lifetime: Lifetime, predicate: P, factory: F) -> &mut Self
    where
        P: Fn(&Key) -> bool + Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>, &Key) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.registry.fallbacks.push(FallbackRule {
            predicate: Arc::new(predicate),
            factory: Arc::new(factory),
            lifetime,
        });
        self
    }

    /// Registers a build-time rewrite applied to every registration whose
    /// key matches `predicate`, before decorators are folded in. Useful for
    /// blanket lifetime changes or metadata-driven rewrites across many
    /// registrations at once.
    pub fn add_override<P, R>(&mut self, predicate: P, rewrite: R) -> &mut Self
    where
        P: Fn(&Key) -> bool + Send + Sync + 'static,
        R: Fn(&Key, Registration) -> Registration + Send + Sync + 'static,
    {
        self.registry.overrides.push(OverrideRule {
            predicate: Arc::new(predicate),
            rewrite: Arc::new(rewrite),
        });
        self
    }

    /// Registers a post-construction initializer: `action` runs once against
    /// every freshly-built instance whose key matches `predicate`, before
    /// the instance is cached or returned.
    pub fn add_initializer<P, A>(&mut self, predicate: P, action: A) -> &mut Self
    where
        P: Fn(&Key) -> bool + Send + Sync + 'static,
        A: for<'a> Fn(&ResolverContext<'a>, &AnyArc) + Send + Sync + 'static,
    {
        self.registry.initializers.push(Initializer {
            predicate: Arc::new(predicate),
            action: Arc::new(action),
        });
        self
    }

    // ----- Property injection -----

    /// Enables property injection: without this, `Resolver::inject_properties`
    /// is a no-op regardless of registered injectors (spec §4.2).
    pub fn enable_property_injection(&mut self) -> &mut Self {
        self.registry.property_injection_enabled = true;
        self.options.enable_property_injection = true;
        self
    }

    /// Registers a property injector: `inject` runs against every instance
    /// whose key matches `predicate`, whenever `Resolver::inject_properties`
    /// is called for it. Injectors are expected to mutate through interior
    /// mutability on the service type, since instances are shared via `Arc`.
    pub fn add_property_injector<P, I>(&mut self, predicate: P, inject: I) -> &mut Self
    where
        P: Fn(&Key) -> bool + Send + Sync + 'static,
        I: for<'a> Fn(&ResolverContext<'a>, &AnyArc) + Send + Sync + 'static,
    {
        self.registry.property_injectors.push(PropertyInjectorEntry {
            predicate: Arc::new(predicate),
            inject: Arc::new(inject),
        });
        self
    }

    // ----- Open generics -----

    /// Registers one closed instantiation of an open generic (spec §4.3.1).
    /// `TypeId` carries no recoverable generic-argument information, so each
    /// closed instantiation (`Repository<User>`, `Repository<Order>`, ...)
    /// must be registered individually; `base_name` tags them as belonging
    /// to the same open-generic family for diagnostics.
    pub fn add_open_generic<T, F>(&mut self, base_name: &'static str, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let ctor: crate::registration::CtorFn = Arc::new(move |r: &ResolverContext| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(r)))
        });
        self.registry.open_generics.insert(
            TypeId::of::<T>(),
            OpenGenericEntry { base_name, ctor, lifetime, constraint: None },
        );
        self
    }

    /// Like [`add_open_generic`](Self::add_open_generic), but `constraint`
    /// is checked before the factory on every resolve; a failing constraint
    /// raises `DiError::GenericConstraint` instead of running the factory
    /// (spec §4.3.1). Use this when the implementing type has generic
    /// bounds `TypeId` can't enforce at compile time for the caller.
    pub fn add_open_generic_constrained<T, F, C>(
        &mut self,
        base_name: &'static str,
        lifetime: Lifetime,
        constraint: C,
        factory: F,
    ) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
        C: for<'a> Fn(&ResolverContext<'a>) -> Result<(), String> + Send + Sync + 'static,
    {
        let ctor: crate::registration::CtorFn = Arc::new(move |r: &ResolverContext| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(r)))
        });
        self.registry.open_generics.insert(
            TypeId::of::<T>(),
            OpenGenericEntry { base_name, ctor, lifetime, constraint: Some(Arc::new(constraint)) },
        );
        self
    }

    // ----- Variance-aware enumerable resolution -----

    /// Enables variance-aware enumerable resolution (spec §4.3.3): when
    /// `get_all_trait::<Base>` finds no direct multi-bindings, it also
    /// aggregates the trait families declared compatible via `add_variant`.
    pub fn enable_variance(&mut self) -> &mut Self {
        self.registry.variance_enabled = true;
        self.options.enable_variance = true;
        self
    }

    /// Declares `compatible_trait_name` as a source to aggregate from when
    /// resolving `base_trait_name`'s enumerable, once variance is enabled.
    pub fn add_variant(&mut self, base_trait_name: &'static str, compatible_trait_name: &'static str) -> &mut Self {
        self.registry.variance.entry(base_trait_name).or_default().push(compatible_trait_name);
        self
    }

    // ----- Constructor selection -----

    /// Applies container-wide options (feature toggles, log sink, scope
    /// manager strategy) before `build()`.
    pub fn with_options(&mut self, options: ContainerOptions) -> &mut Self {
        self.registry.property_injection_enabled = options.enable_property_injection;
        self.registry.variance_enabled = options.enable_variance;
        self.options = options;
        self
    }

    /// Registers `T` with several candidate constructors (spec §3):
    /// at resolve time, the candidate with the most parameters whose
    /// dependencies are all resolvable is chosen; ties favor the
    /// earliest-declared candidate of that size.
    pub fn add_transient_with_constructors<T>(&mut self, candidates: Vec<ConstructorCandidate<T>>) -> &mut Self
    where
        T: 'static + Send + Sync,
    {
        let key = Key::Type(TypeId::of::<T>(), std::any::type_name::<T>());
        let type_name = std::any::type_name::<T>();
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> {
            if candidates.is_empty() {
                return Err(DiError::NoPublicConstructor(type_name.to_string()));
            }
            let mut best: Option<&ConstructorCandidate<T>> = None;
            for candidate in &candidates {
                if (candidate.resolvable)(r) {
                    best = match best {
                        Some(current) if current.param_count >= candidate.param_count => Some(current),
                        _ => Some(candidate),
                    };
                }
            }
            let chosen = best.ok_or_else(|| DiError::NoResolvableConstructor(type_name.to_string()))?;
            Ok(Arc::new((chosen.build)(r)))
        };
        self.registry.insert(key, Registration::with_metadata(
            Lifetime::Transient,
            Arc::new(ctor),
            None,
            Some(TypeId::of::<T>()),
        ));
        self
    }

    /// Builds the final service provider from this collection.
    ///
    /// This method consumes the `ServiceCollection` and creates a `ServiceProvider`
    /// that can resolve registered services. The service provider is thread-safe
    /// and can be used to create scoped contexts for request-scoped services.
    ///
    /// # Returns
    ///
    /// A `ServiceProvider` that can resolve all registered services according to
    /// their configured lifetimes.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_di::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_singleton(42usize);
    /// collection.add_transient_factory::<String, _>(|_| "Hello".to_string());
    ///
    /// let provider = collection.build();
    /// let number = provider.get_required::<usize>();
    /// let text = provider.get_required::<String>();
    ///
    /// assert_eq!(*number, 42);
    /// assert_eq!(&*text, "Hello");
    /// ```
    pub fn build(mut self) -> ServiceProvider {
        // Finalize registry by assigning scoped slot indices
        self.registry.finalize();
        ServiceProvider::new_with_observers(self.registry, self.observers, self.options)
    }

}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// One candidate constructor for [`ServiceCollection::add_transient_with_constructors`].
pub struct ConstructorCandidate<T> {
    param_count: usize,
    resolvable: Arc<dyn Fn(&ResolverContext) -> bool + Send + Sync>,
    build: Arc<dyn Fn(&ResolverContext) -> T + Send + Sync>,
}

impl<T> ConstructorCandidate<T> {
    /// `param_count` is used to break ties toward the "greediest" resolvable
    /// candidate (spec §3): the constructor with the most satisfiable
    /// parameters wins. `resolvable` checks whether every dependency this
    /// candidate needs is currently registered; `build` constructs `T` given
    /// the same resolver.
    pub fn new<R, B>(param_count: usize, resolvable: R, build: B) -> Self
    where
        R: Fn(&ResolverContext) -> bool + Send + Sync + 'static,
        B: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        Self { param_count, resolvable: Arc::new(resolvable), build: Arc::new(build) }
    }
}

