//! Service lifetime definitions.

/// Service lifetimes controlling instance caching and disposal ownership.
///
/// # Lifetime Characteristics
///
/// - **PerContainer**: one instance for the whole container, cached forever,
///   materialized at emit time (the compiled delegate is a plain load).
/// - **PerScope**: one instance per (registration, scope); owned and
///   disposed by the scope it was created in.
/// - **PerRequest**: a fresh instance every call, same as `Transient`,
///   except that a disposable instance's ownership transfers to the current
///   scope (failing if there is none) rather than going untracked.
/// - **Transient**: a fresh instance every call, never tracked.
///
/// # Examples
///
/// ```rust
/// use ferrous_di::{ServiceCollection, Resolver, Lifetime};
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
/// struct RequestModel { id: u32 }
///
/// let mut services = ServiceCollection::new();
///
/// services.add_singleton(Database {
///     url: "postgres://localhost".to_string()
/// });
///
/// services.add_scoped_factory::<Repository, _>(|r| {
///     let db = r.get_required::<Database>();
///     Repository { db_url: db.url.clone() }
/// });
///
/// services.add_transient_factory::<RequestModel, _>(|_| {
///     RequestModel { id: 12345 }
/// });
///
/// let provider = services.build();
///
/// let db1 = provider.get_required::<Database>();
/// let scope1 = provider.create_scope();
/// let db2 = scope1.get_required::<Database>();
/// assert!(std::ptr::eq(&*db1, &*db2));
///
/// let repo1a = scope1.get_required::<Repository>();
/// let repo1b = scope1.get_required::<Repository>();
/// assert!(std::ptr::eq(&*repo1a, &*repo1b));
///
/// let scope2 = provider.create_scope();
/// let repo2 = scope2.get_required::<Repository>();
/// assert!(!std::ptr::eq(&*repo1a, &*repo2));
///
/// let model1 = scope1.get_required::<RequestModel>();
/// let model2 = scope1.get_required::<RequestModel>();
/// assert!(!std::ptr::eq(&*model1, &*model2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// One instance per container, cached forever; disposed when the
    /// container is disposed.
    PerContainer,
    /// One instance per (registration, scope); disposed when that scope
    /// ends.
    PerScope,
    /// New instance every call; if disposable, ownership transfers to the
    /// current scope (an error if there is none).
    PerRequest,
    /// New instance every call; never tracked, never disposed by the
    /// container.
    Transient,
}

impl Default for Lifetime {
    fn default() -> Self {
        Lifetime::Transient
    }
}
