//! Service descriptors for introspection and diagnostics.

use std::any::TypeId;
use crate::key::Key;
use crate::lifetime::Lifetime;

/// Service descriptor for introspection and diagnostics.
///
/// Contains metadata about a registered service: its key, lifetime, and
/// (when known) the concrete implementation type backing it. Used for
/// debugging, startup validation, and dependency-graph tooling.
///
/// # Examples
///
/// ```rust
/// use ferrous_di::{ServiceCollection, ServiceDescriptor, Lifetime};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { name: String }
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
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_scoped_factory::<Repository, _>(|_| Repository { name: "UserRepo".to_string() });
/// services.add_singleton_trait(Arc::new(ConsoleLogger) as Arc<dyn Logger>);
/// services.add_named_singleton("config_value", 42u32);
///
/// let descriptors = services.get_service_descriptors();
///
/// let db_descriptor = descriptors.iter()
///     .find(|d| d.type_name().contains("Database"))
///     .unwrap();
/// assert_eq!(db_descriptor.lifetime, Lifetime::PerContainer);
/// assert!(!db_descriptor.is_named());
///
/// let config_descriptor = descriptors.iter()
///     .find(|d| d.is_named() && d.service_name() == Some("config_value"))
///     .unwrap();
/// assert_eq!(config_descriptor.type_name(), "u32");
/// assert_eq!(config_descriptor.service_name(), Some("config_value"));
///
/// let singleton_count = descriptors.iter()
///     .filter(|d| d.lifetime == Lifetime::PerContainer)
///     .count();
/// let scoped_count = descriptors.iter()
///     .filter(|d| d.lifetime == Lifetime::PerScope)
///     .count();
///
/// println!("Registered {} per-container, {} per-scope services", singleton_count, scoped_count);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The service key (type/trait name with optional service name).
    pub key: Key,
    /// Service lifetime.
    pub lifetime: Lifetime,
    /// Implementation type ID (if available).
    pub impl_type_id: Option<TypeId>,
    /// Implementation type name (if available).
    pub impl_type_name: Option<&'static str>,
    /// Whether this registration has metadata attached.
    pub has_metadata: bool,
}

impl ServiceDescriptor {
    /// Returns the normalized service name, or `None` for the default
    /// (unnamed) registration.
    pub fn service_name(&self) -> Option<&str> {
        self.key.service_name()
    }

    /// The human-readable type or trait name (`std::any::type_name` result).
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// `true` if this descriptor represents a named registration.
    pub fn is_named(&self) -> bool {
        self.service_name().is_some()
    }
}
