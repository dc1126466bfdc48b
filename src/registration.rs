//! Service registration storage: the registry itself, plus the build-time
//! composition of overrides and decorators onto each registration's ctor.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::decorator::{fold_decorators, DecoratorEntry};
use crate::error::DiResult;
use crate::fallback::FallbackRule;
use crate::initializer::Initializer;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::open_generic::OpenGenericEntry;
use crate::override_rule::OverrideRule;
use crate::property_injection::PropertyInjectorEntry;

#[cfg(feature = "once-cell")]
use once_cell::sync::OnceCell;

pub(crate) use crate::provider::ResolverContext;

/// Type-erased `Arc` used to store any resolved instance.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type CtorFn = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// One compiled recipe for a single `(identity, name)`.
///
/// Opaque outside the crate: fields stay `pub(crate)`, but the type itself
/// is `pub` so it can appear in `ServiceCollection::add_override`'s public
/// signature without exposing its internals.
pub struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) ctor: CtorFn,
    /// Optional metadata for diagnostics and introspection.
    pub(crate) metadata: Option<Box<dyn Any + Send + Sync>>,
    /// Implementation type ID, when known (helps identify the concrete type
    /// backing a trait registration).
    pub(crate) impl_id: Option<TypeId>,

    /// `PerContainer` cache: `OnceCell` gives lock-free reads after the
    /// first resolve.
    #[cfg(feature = "once-cell")]
    pub(crate) single_runtime: Option<OnceCell<AnyArc>>,
    #[cfg(not(feature = "once-cell"))]
    pub(crate) single_runtime: Option<Arc<std::sync::Mutex<Option<AnyArc>>>>,

    /// Slot index into a scope's cache array, assigned by `finalize()` for
    /// every `PerScope` registration.
    pub(crate) scoped_slot: Option<usize>,
}

impl Registration {
    pub(crate) fn new(lifetime: Lifetime, ctor: CtorFn) -> Self {
        let single_runtime = match lifetime {
            Lifetime::PerContainer => {
                #[cfg(feature = "once-cell")]
                { Some(OnceCell::new()) }
                #[cfg(not(feature = "once-cell"))]
                { Some(Arc::new(std::sync::Mutex::new(None))) }
            }
            _ => None,
        };

        Self {
            lifetime,
            ctor,
            metadata: None,
            impl_id: None,
            single_runtime,
            scoped_slot: None,
        }
    }

    pub(crate) fn with_metadata(
        lifetime: Lifetime,
        ctor: CtorFn,
        metadata: Option<Box<dyn Any + Send + Sync>>,
        impl_id: Option<TypeId>,
    ) -> Self {
        let mut reg = Self::new(lifetime, ctor);
        reg.metadata = metadata;
        reg.impl_id = impl_id;
        reg
    }

    /// This registration's current lifetime.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Returns this registration with its lifetime changed to `lifetime`.
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// A fresh copy of this registration for an independent container: same
    /// ctor/lifetime/impl id, but a brand-new `PerContainer` cache cell so
    /// the clone never observes an instance cached by the source. Diagnostic
    /// metadata is not carried over.
    pub(crate) fn clone_fresh(&self) -> Self {
        let mut fresh = Registration::new(self.lifetime, self.ctor.clone());
        fresh.impl_id = self.impl_id;
        fresh.scoped_slot = self.scoped_slot;
        fresh
    }
}

/// The service registry: two-level `identity -> (name -> registration)`
/// collapsed into a single `Key -> Registration` map (the name lives
/// inside `Key`), plus the decorator/fallback/override/initializer lists
/// and the scoped-slot bookkeeping the scope manager needs.
pub(crate) struct Registry {
    /// Fast `Vec` lookup for the first `small_threshold` registrations
    /// (cache-friendly linear scan; sorted after `finalize()`).
    pub(crate) one_small: Vec<(Key, Registration)>,
    /// `HashMap` fallback once `one_small` exceeds its threshold.
    pub(crate) one_large: HashMap<Key, Registration>,
    /// Multi-binding registrations (`resolve_all`), append-only per trait
    /// name.
    pub(crate) many: HashMap<&'static str, Vec<Registration>>,
    /// Total count of `PerScope` registrations, used to size each scope's
    /// slot array.
    pub(crate) scoped_count: usize,
    /// Multi-binding scoped slot mapping: `(trait_name, index) -> slot`.
    pub(crate) multi_scoped_slots: HashMap<(&'static str, usize), usize>,
    /// `Vec` vs `HashMap` crossover point.
    pub(crate) small_threshold: usize,

    pub(crate) decorators: HashMap<Key, Vec<DecoratorEntry>>,
    pub(crate) fallbacks: Vec<FallbackRule>,
    pub(crate) overrides: Vec<OverrideRule>,
    pub(crate) initializers: Vec<Initializer>,
    next_decorator_index: usize,

    /// Open-generic registrations, keyed by the closed instantiation's
    /// `TypeId` (see `open_generic.rs`).
    pub(crate) open_generics: HashMap<TypeId, OpenGenericEntry>,
    /// Property injectors, consulted by `inject_properties` in registration
    /// order.
    pub(crate) property_injectors: Vec<PropertyInjectorEntry>,
    pub(crate) property_injection_enabled: bool,
    /// Variance table: trait name -> compatible trait names, consulted by
    /// `get_all_trait` when the direct multi-binding is empty.
    pub(crate) variance: HashMap<&'static str, Vec<&'static str>>,
    pub(crate) variance_enabled: bool,

    /// Set by `finalize()`; once true the registry has been compiled into
    /// its emit form and must not be mutated further.
    pub(crate) locked: bool,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            one_small: Vec::new(),
            one_large: HashMap::new(),
            many: HashMap::new(),
            scoped_count: 0,
            multi_scoped_slots: HashMap::new(),
            small_threshold: 16,
            decorators: HashMap::new(),
            fallbacks: Vec::new(),
            overrides: Vec::new(),
            initializers: Vec::new(),
            next_decorator_index: 0,
            open_generics: HashMap::new(),
            property_injectors: Vec::new(),
            property_injection_enabled: false,
            variance: HashMap::new(),
            variance_enabled: false,
            locked: false,
        }
    }

    /// Produces an independent registry mirroring this one's registrations
    /// (same compiled ctors, decorators, fallbacks, open-generics), but with
    /// every `PerContainer` cache cell reset so the clone never observes an
    /// instance cached through the source. Only valid to call after
    /// `finalize()` — the source's ctors already have decorators/overrides/
    /// initializers folded in, so the clone needs no re-finalization.
    pub(crate) fn clone_fresh(&self) -> Self {
        Self {
            one_small: self.one_small.iter().map(|(k, r)| (k.clone(), r.clone_fresh())).collect(),
            one_large: self.one_large.iter().map(|(k, r)| (k.clone(), r.clone_fresh())).collect(),
            many: self
                .many
                .iter()
                .map(|(name, regs)| (*name, regs.iter().map(Registration::clone_fresh).collect()))
                .collect(),
            scoped_count: self.scoped_count,
            multi_scoped_slots: self.multi_scoped_slots.clone(),
            small_threshold: self.small_threshold,
            decorators: self.decorators.clone(),
            fallbacks: self.fallbacks.clone(),
            overrides: self.overrides.clone(),
            initializers: self.initializers.clone(),
            next_decorator_index: self.next_decorator_index,
            open_generics: self.open_generics.clone(),
            property_injectors: self.property_injectors.clone(),
            property_injection_enabled: self.property_injection_enabled,
            variance: self.variance.clone(),
            variance_enabled: self.variance_enabled,
            locked: self.locked,
        }
    }

    pub(crate) fn insert(&mut self, key: Key, registration: Registration) {
        if self.one_small.len() < self.small_threshold {
            if let Some(pos) = self.one_small.iter().position(|(k, _)| k == &key) {
                self.one_small[pos] = (key, registration);
            } else {
                self.one_small.push((key, registration));
            }
        } else if let Some(pos) = self.one_small.iter().position(|(k, _)| k == &key) {
            self.one_small[pos] = (key, registration);
        } else {
            self.one_large.insert(key, registration);
        }
    }

    #[inline(always)]
    pub(crate) fn get(&self, key: &Key) -> Option<&Registration> {
        for (k, reg) in &self.one_small {
            if k == key {
                return Some(reg);
            }
        }
        self.one_large.get(key)
    }

    #[inline(always)]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.one_small.iter().any(|(k, _)| k == key) || self.one_large.contains_key(key)
    }

    pub(crate) fn get_mut(&mut self, key: &Key) -> Option<&mut Registration> {
        for (k, reg) in &mut self.one_small {
            if k == key {
                return Some(reg);
            }
        }
        self.one_large.get_mut(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Registration)> {
        self.one_small.iter().map(|(k, r)| (k, r)).chain(self.one_large.iter())
    }

    /// Registers a decorator for `key`, assigning it the next monotonic
    /// registration-order index. The decorator is folded onto the matching
    /// registration(s) at `finalize()` time, so it applies regardless of
    /// whether the target is registered before or after this call.
    pub(crate) fn add_decorator(&mut self, key: Key, entry_builder: impl FnOnce(usize) -> DecoratorEntry) {
        let index = self.next_decorator_index;
        self.next_decorator_index += 1;
        self.decorators.entry(key).or_default().push(entry_builder(index));
    }

    /// Applies overrides (declaration order, left-to-right) and folds
    /// decorators (descending index, first-registered outermost) onto
    /// every matching registration, assigns `PerScope` slots, and sorts
    /// the small-vec for cache locality. Idempotent: calling twice is a
    /// no-op after the first call.
    pub(crate) fn finalize(&mut self) {
        if self.locked {
            return;
        }

        let overrides = std::mem::take(&mut self.overrides);
        if !overrides.is_empty() {
            apply_overrides(&mut self.one_small, &overrides);
            apply_overrides_map(&mut self.one_large, &overrides);
        }
        self.overrides = overrides;

        if !self.decorators.is_empty() {
            let decorators_by_key = self.decorators.clone();
            for (key, reg) in self.one_small.iter_mut() {
                apply_decorators(key, reg, &decorators_by_key);
            }
            for (key, reg) in self.one_large.iter_mut() {
                apply_decorators(key, reg, &decorators_by_key);
            }
            for (trait_name, regs) in self.many.iter_mut() {
                let trait_key = Key::Trait(trait_name);
                if let Some(entries) = decorators_by_key.get(&trait_key) {
                    for reg in regs.iter_mut() {
                        let base = reg.ctor.clone();
                        reg.ctor = fold_decorators(base, entries.clone());
                    }
                }
            }
        }

        if !self.initializers.is_empty() {
            let initializers = self.initializers.clone();
            for (key, reg) in self.one_small.iter_mut() {
                apply_initializers(key, reg, &initializers);
            }
            for (key, reg) in self.one_large.iter_mut() {
                apply_initializers(key, reg, &initializers);
            }
        }

        let mut next_scoped_slot = 0;
        self.one_small.sort_by(|a, b| a.0.cmp(&b.0));

        for (_, reg) in &mut self.one_small {
            if reg.lifetime == Lifetime::PerScope {
                reg.scoped_slot = Some(next_scoped_slot);
                next_scoped_slot += 1;
            }
        }
        for reg in self.one_large.values_mut() {
            if reg.lifetime == Lifetime::PerScope {
                reg.scoped_slot = Some(next_scoped_slot);
                next_scoped_slot += 1;
            }
        }
        for (trait_name, regs) in self.many.iter_mut() {
            for (index, reg) in regs.iter_mut().enumerate() {
                if reg.lifetime == Lifetime::PerScope {
                    reg.scoped_slot = Some(next_scoped_slot);
                    self.multi_scoped_slots.insert((trait_name, index), next_scoped_slot);
                    next_scoped_slot += 1;
                }
            }
        }

        self.scoped_count = next_scoped_slot;
        self.locked = true;
    }
}

fn apply_overrides(entries: &mut [(Key, Registration)], overrides: &[OverrideRule]) {
    for (key, reg) in entries.iter_mut() {
        let mut current = std::mem::replace(reg, Registration::new(Lifetime::Transient, noop_ctor()));
        for rule in overrides {
            if rule.matches(key) {
                current = (rule.rewrite)(key, current);
            }
        }
        *reg = current;
    }
}

fn apply_overrides_map(entries: &mut HashMap<Key, Registration>, overrides: &[OverrideRule]) {
    let keys: Vec<Key> = entries.keys().cloned().collect();
    for key in keys {
        if let Some(reg) = entries.remove(&key) {
            let mut current = reg;
            for rule in overrides {
                if rule.matches(&key) {
                    current = (rule.rewrite)(&key, current);
                }
            }
            entries.insert(key, current);
        }
    }
}

fn apply_decorators(key: &Key, reg: &mut Registration, decorators_by_key: &HashMap<Key, Vec<DecoratorEntry>>) {
    let Some(entries) = decorators_by_key.get(key) else { return };
    let base = reg.ctor.clone();
    reg.ctor = fold_decorators(base, entries.clone());
}

fn apply_initializers(key: &Key, reg: &mut Registration, initializers: &[Initializer]) {
    let matching: Vec<Initializer> = initializers.iter().filter(|i| i.matches(key)).cloned().collect();
    if matching.is_empty() {
        return;
    }
    let base = reg.ctor.clone();
    reg.ctor = Arc::new(move |r: &ResolverContext<'_>| -> DiResult<AnyArc> {
        let built = base(r)?;
        for init in &matching {
            (init.action)(r, &built);
        }
        Ok(built)
    });
}

fn noop_ctor() -> CtorFn {
    Arc::new(|_r: &ResolverContext<'_>| -> DiResult<AnyArc> {
        Err(crate::error::DiError::NotRegistered("<override-placeholder>".into()))
    })
}
