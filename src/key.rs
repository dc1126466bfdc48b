//! Service key types for the dependency injection container.

use std::any::TypeId;
use std::sync::Arc;

/// Normalizes a service name for case-insensitive lookup.
///
/// An empty string denotes "the default (unnamed) registration" per the
/// data model; callers never need to special-case it explicitly because
/// `Key::named` collapses an empty, normalized name back to the unnamed
/// variant.
pub(crate) fn normalize_name(name: &str) -> Arc<str> {
    Arc::from(name.to_lowercase())
}

/// Key for service storage and lookup.
///
/// A key is `(service identity, service name)`. The identity is a type
/// token (`TypeId` for concrete types, a stable type-name string for trait
/// objects, since traits have no `TypeId`); the name is an arbitrary,
/// case-insensitive string, empty meaning "default". Names are normalized
/// to lowercase once, at registration or lookup time, and stored as `Arc<str>`
/// so cloning a `Key` never re-allocates.
///
/// The unnamed, non-multi forms (`Type`, `Trait`) are the hot path: they
/// carry no heap-allocated name and compare/hash on `TypeId` alone.
#[derive(Debug, Clone)]
pub enum Key {
    /// Concrete type, default name.
    Type(TypeId, &'static str),
    /// Concrete type, explicit (normalized) name.
    TypeNamed(TypeId, &'static str, Arc<str>),
    /// Trait object, default name.
    Trait(&'static str),
    /// Trait object, explicit (normalized) name.
    TraitNamed(&'static str, Arc<str>),
    /// One slot of a multi-binding (`resolve_all`), default name.
    MultiTrait(&'static str, usize),
    /// One slot of a multi-binding, explicit (normalized) name.
    MultiTraitNamed(&'static str, Arc<str>, usize),
}

impl Key {
    /// Builds a type key, collapsing an empty/whitespace name to the
    /// unnamed (default) variant.
    pub fn named_type(type_id: TypeId, display: &'static str, name: &str) -> Key {
        if name.is_empty() {
            Key::Type(type_id, display)
        } else {
            Key::TypeNamed(type_id, display, normalize_name(name))
        }
    }

    /// Builds a trait key, collapsing an empty name to the unnamed variant.
    pub fn named_trait(trait_name: &'static str, name: &str) -> Key {
        if name.is_empty() {
            Key::Trait(trait_name)
        } else {
            Key::TraitNamed(trait_name, normalize_name(name))
        }
    }

    /// The human-readable type or trait name (`std::any::type_name` result),
    /// ignoring any service name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Trait(name) => name,
            Key::MultiTrait(name, _) => name,
            Key::TypeNamed(_, name, _) => name,
            Key::TraitNamed(name, _) => name,
            Key::MultiTraitNamed(name, _, _) => name,
        }
    }

    /// The normalized service name, or `None` for the default (unnamed)
    /// registration.
    pub fn service_name(&self) -> Option<&str> {
        match self {
            Key::Type(_, _) | Key::Trait(_) | Key::MultiTrait(_, _) => None,
            Key::TypeNamed(_, _, name) => Some(name),
            Key::TraitNamed(_, name) => Some(name),
            Key::MultiTraitNamed(_, name, _) => Some(name),
        }
    }

    /// The `TypeId` backing a concrete-type key (`Type`/`TypeNamed`), if any.
    /// Trait keys carry no `TypeId` (trait objects have no stable one), so
    /// open-generic lookup — which is keyed by `TypeId` — only ever matches
    /// concrete-type keys.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Key::Type(id, _) | Key::TypeNamed(id, _, _) => Some(*id),
            _ => None,
        }
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::TypeNamed(a, _, name_a), Key::TypeNamed(b, _, name_b)) => a == b && name_a == name_b,
            (Key::Trait(a), Key::Trait(b)) => a == b,
            (Key::TraitNamed(a, name_a), Key::TraitNamed(b, name_b)) => a == b && name_a == name_b,
            (Key::MultiTrait(a, idx_a), Key::MultiTrait(b, idx_b)) => a == b && idx_a == idx_b,
            (Key::MultiTraitNamed(a, name_a, idx_a), Key::MultiTraitNamed(b, name_b, idx_b)) => {
                a == b && name_a == name_b && idx_a == idx_b
            }
            _ => false,
        }
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Stable discriminant used only to order distinct `Key` variants relative
/// to one another (the exact order doesn't matter, only that it's total).
fn variant_rank(k: &Key) -> u8 {
    match k {
        Key::Type(..) => 0,
        Key::TypeNamed(..) => 1,
        Key::Trait(..) => 2,
        Key::TraitNamed(..) => 3,
        Key::MultiTrait(..) => 4,
        Key::MultiTraitNamed(..) => 5,
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a.cmp(b),
            (Key::TypeNamed(a, _, name_a), Key::TypeNamed(b, _, name_b)) => {
                a.cmp(b).then_with(|| name_a.cmp(name_b))
            }
            (Key::Trait(a), Key::Trait(b)) => a.cmp(b),
            (Key::TraitNamed(a, name_a), Key::TraitNamed(b, name_b)) => {
                a.cmp(b).then_with(|| name_a.cmp(name_b))
            }
            (Key::MultiTrait(a, idx_a), Key::MultiTrait(b, idx_b)) => {
                a.cmp(b).then_with(|| idx_a.cmp(idx_b))
            }
            (Key::MultiTraitNamed(a, name_a, idx_a), Key::MultiTraitNamed(b, name_b, idx_b)) => {
                a.cmp(b).then_with(|| name_a.cmp(name_b)).then_with(|| idx_a.cmp(idx_b))
            }
            _ => variant_rank(self).cmp(&variant_rank(other)),
        }
    }
}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::TypeNamed(id, _, name) => {
                1u8.hash(state);
                id.hash(state);
                name.hash(state);
            }
            Key::Trait(name) => {
                2u8.hash(state);
                name.hash(state);
            }
            Key::TraitNamed(name, named) => {
                3u8.hash(state);
                name.hash(state);
                named.hash(state);
            }
            Key::MultiTrait(name, idx) => {
                4u8.hash(state);
                name.hash(state);
                idx.hash(state);
            }
            Key::MultiTraitNamed(name, named, idx) => {
                5u8.hash(state);
                name.hash(state);
                named.hash(state);
                idx.hash(state);
            }
        }
    }
}

/// Builds the default (unnamed) key for a concrete type.
#[inline(always)]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}
