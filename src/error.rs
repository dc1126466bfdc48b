//! Error types for the dependency injection container.

use std::fmt;

/// Dependency injection errors.
///
/// Represents the various failure modes of the registry, the construction
/// planner, the recipe compiler, and the scope manager. None are
/// recoverable by retrying the identical call; the registration or the
/// dependency graph needs to change.
///
/// # Examples
///
/// ```rust
/// use ferrous_di::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::NotRegistered(name)) => {
///         assert!(name.contains("String"));
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// No emitter could be produced for this (identity, name) after every
    /// expansion strategy (direct registration, open-generic, fallback,
    /// structural synthesis) was tried.
    NotRegistered(String),
    /// The dependency stack re-entered the same emitter while expanding a
    /// construction (the decorator-target edge is exempt).
    CyclicDependency(Vec<String>),
    /// A required constructor or property dependency could not be resolved
    /// while compiling an emitter.
    UnresolvedDependency {
        /// The type being constructed.
        for_type: String,
        /// The dependency that could not be resolved.
        dependency: String,
    },
    /// The construction planner found zero registered builders for a type.
    NoPublicConstructor(String),
    /// The construction planner found candidate builders but none had every
    /// parameter resolvable.
    NoResolvableConstructor(String),
    /// A scope was ended with a live child, ended while not the current
    /// scope, or asked to track a disposable after it was disposed.
    InvalidScope(String),
    /// A registration, decorator, override, or fallback was attempted after
    /// the container's first resolve call; the existing registration set is
    /// kept unchanged.
    RegistrationAfterLock(String),
    /// Open-generic expansion produced an implementing type whose generic
    /// constraints the concrete arguments violate.
    GenericConstraint(String),
    /// A resolved value did not downcast to the requested type.
    TypeMismatch(String),
    /// A `PerScope` registration was resolved directly against the root
    /// container instead of a scope.
    WrongLifetime(String),
    /// The per-thread dependency stack exceeded its recursion guard.
    DepthExceeded(usize),
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotRegistered(name) => write!(f, "no registration found for '{name}'"),
            DiError::CyclicDependency(path) => {
                write!(f, "circular dependency: {}", path.join(" -> "))
            }
            DiError::UnresolvedDependency { for_type, dependency } => write!(
                f,
                "cannot resolve dependency '{dependency}' required by '{for_type}'"
            ),
            DiError::NoPublicConstructor(name) => write!(f, "no builder registered for '{name}'"),
            DiError::NoResolvableConstructor(name) => write!(
                f,
                "no candidate builder for '{name}' has every parameter resolvable"
            ),
            DiError::InvalidScope(msg) => write!(f, "invalid scope operation: {msg}"),
            DiError::RegistrationAfterLock(name) => write!(
                f,
                "registration for '{name}' rejected: container locked after its first resolve"
            ),
            DiError::GenericConstraint(msg) => write!(f, "open-generic constraint violated: {msg}"),
            DiError::TypeMismatch(name) => write!(f, "type mismatch resolving '{name}'"),
            DiError::WrongLifetime(msg) => write!(f, "wrong lifetime: {msg}"),
            DiError::DepthExceeded(depth) => write!(f, "max resolution depth {depth} exceeded"),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;
