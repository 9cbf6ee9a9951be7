//! Named service registry.
//!
//! This module contains the [`ServiceRegistry`] type: a table of named
//! service descriptors that resolves them to instances according to their
//! lifetime, with child scopes that inherit a snapshot of the table.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};

use crate::descriptors::ServiceDescriptor;
use crate::error::{BoxError, DiError, DiResult};
use crate::internal::{with_circular_catch, Frame};
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::registration::{AnyArc, Ctor, Registration, Registry};
use crate::traits::{Resolver, ResolverCore};

pub mod context;
pub mod scope;
pub use context::ResolverContext;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Registry of named services.
///
/// A `ServiceRegistry` is a cheap, cloneable handle (it uses `Arc`
/// internally): clones refer to the same table and caches. Registration takes
/// `&self` and may happen at any time, including after the registry has been
/// handed out by an [`ApplicationBuilder`](crate::ApplicationBuilder).
///
/// # Lifetimes
///
/// - **Singleton**: a directly registered value, or a factory that runs at
///   most once; shared with every scope that inherited the entry
/// - **Scoped**: one instance per registry, kept in that registry's own cache
/// - **Transient**: a fresh instance per resolution
///
/// # Examples
///
/// ```
/// use wa_shell::ServiceRegistry;
///
/// let root = ServiceRegistry::new();
/// root.register_instance("greeting", "hi");
/// assert_eq!(*root.resolve_required::<&str>("greeting").unwrap(), "hi");
///
/// let scope = root.create_scope();
/// assert_eq!(*scope.resolve_required::<&str>("greeting").unwrap(), "hi");
///
/// scope.register_instance("greeting", "yo");
/// assert_eq!(*scope.resolve_required::<&str>("greeting").unwrap(), "yo");
/// assert_eq!(*root.resolve_required::<&str>("greeting").unwrap(), "hi");
/// ```
#[derive(Clone)]
pub struct ServiceRegistry {
    inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    pub(crate) id: u64,
    pub(crate) table: RwLock<Registry>,
    pub(crate) scoped: Mutex<HashMap<String, Arc<OnceCell<AnyArc>>>>,
    pub(crate) parent: Option<ParentLink>,
    pub(crate) observers: Arc<Observers>,
}

/// Link from a scope to the registry it was created from.
pub(crate) struct ParentLink {
    pub(crate) registry: ServiceRegistry,
    /// Parent revision at creation time; later parent entries stay invisible
    pub(crate) horizon: u64,
}

impl ServiceRegistry {
    /// Creates an empty root registry.
    pub fn new() -> Self {
        Self::from_parts(Registry::new(), None, Observers::new())
    }

    pub(crate) fn from_parts(table: Registry, parent: Option<ParentLink>, observers: Observers) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
                table: RwLock::new(table),
                scoped: Mutex::new(HashMap::new()),
                parent,
                observers: Arc::new(observers),
            }),
        }
    }

    // ----- Registration -----

    /// Registers an already-constructed value as a singleton.
    ///
    /// Overwrites any previous entry for `name` in this registry; ancestors
    /// and existing scopes are unaffected.
    pub fn register_instance<T>(&self, name: impl Into<String>, value: T) -> &Self
    where
        T: 'static + Send + Sync,
    {
        let value: AnyArc = Arc::new(value);
        self.insert(name.into(), move |revision| {
            Registration::with_instance(value, std::any::type_name::<T>(), revision)
        })
    }

    /// Registers a singleton factory that runs on first resolution.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use wa_shell::ServiceRegistry;
    ///
    /// let calls = Arc::new(AtomicUsize::new(0));
    /// let counter = calls.clone();
    ///
    /// let registry = ServiceRegistry::new();
    /// registry.register_singleton_factory("config", move |_| {
    ///     counter.fetch_add(1, Ordering::SeqCst);
    ///     String::from("loaded")
    /// });
    /// assert_eq!(calls.load(Ordering::SeqCst), 0);
    ///
    /// let a = registry.resolve_required::<String>("config").unwrap();
    /// let b = registry.resolve_required::<String>("config").unwrap();
    /// assert!(Arc::ptr_eq(&a, &b));
    /// assert_eq!(calls.load(Ordering::SeqCst), 1);
    /// ```
    pub fn register_singleton_factory<T, F>(&self, name: impl Into<String>, factory: F) -> &Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Singleton, name.into(), factory)
    }

    /// Registers a fallible singleton factory.
    ///
    /// A failed attempt is not cached: the next resolution runs the factory
    /// again.
    pub fn try_register_singleton_factory<T, F, E>(&self, name: impl Into<String>, factory: F) -> &Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.add_fallible_factory(Lifetime::Singleton, name.into(), factory)
    }

    /// Registers a transient factory that runs on every resolution.
    pub fn register_transient<T, F>(&self, name: impl Into<String>, factory: F) -> &Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Transient, name.into(), factory)
    }

    /// Registers a fallible transient factory.
    pub fn try_register_transient<T, F, E>(&self, name: impl Into<String>, factory: F) -> &Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.add_fallible_factory(Lifetime::Transient, name.into(), factory)
    }

    /// Registers a scoped factory: one instance per registry.
    ///
    /// The first resolution within a registry caches the value in that
    /// registry's own scoped cache. Sibling and child scopes build their own.
    pub fn register_scoped<T, F>(&self, name: impl Into<String>, factory: F) -> &Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Scoped, name.into(), factory)
    }

    /// Registers a fallible scoped factory.
    pub fn try_register_scoped<T, F, E>(&self, name: impl Into<String>, factory: F) -> &Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.add_fallible_factory(Lifetime::Scoped, name.into(), factory)
    }

    fn add_factory<T, F>(&self, lifetime: Lifetime, name: String, factory: F) -> &Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let ctor = move |ctx: &ResolverContext| -> DiResult<AnyArc> { Ok(Arc::new(factory(ctx))) };
        self.insert_ctor::<T>(lifetime, name, Arc::new(ctor))
    }

    fn add_fallible_factory<T, F, E>(&self, lifetime: Lifetime, name: String, factory: F) -> &Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let service = name.clone();
        let ctor = move |ctx: &ResolverContext| -> DiResult<AnyArc> {
            match factory(ctx) {
                Ok(value) => Ok(Arc::new(value)),
                Err(err) => Err(DiError::from_factory(&service, err.into())),
            }
        };
        self.insert_ctor::<T>(lifetime, name, Arc::new(ctor))
    }

    fn insert_ctor<T: 'static>(&self, lifetime: Lifetime, name: String, ctor: Ctor) -> &Self {
        self.insert(name, move |revision| {
            Registration::with_factory(lifetime, ctor, std::any::type_name::<T>(), revision)
        })
    }

    fn insert<F>(&self, name: String, build: F) -> &Self
    where
        F: FnOnce(u64) -> Registration,
    {
        self.inner.table.write().insert(name.clone(), build);
        // An overwritten scoped entry must not keep serving the old value
        self.inner.scoped.lock().remove(&name);
        tracing::trace!(registry = self.inner.id, service = %name, "registered");
        self
    }

    // ----- Resolution -----

    /// Resolves `name` and downcasts it to `T`.
    ///
    /// Looks in this registry first and delegates to the parent on a miss.
    /// Fails with [`DiError::NotFound`] when the whole chain misses.
    pub fn resolve_required<T: 'static + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
        Resolver::resolve_required::<T>(self, name)
    }

    /// Resolves `name`, yielding `Ok(None)` when no registry in the chain
    /// knows it. Other failures propagate.
    pub fn resolve_optional<T: 'static + Send + Sync>(&self, name: &str) -> DiResult<Option<Arc<T>>> {
        Resolver::resolve_optional::<T>(self, name)
    }

    /// True when `name` resolves somewhere in the chain.
    pub fn contains(&self, name: &str) -> bool {
        self.contains_visible(name, None)
    }

    fn contains_visible(&self, name: &str, horizon: Option<u64>) -> bool {
        if self.inner.table.read().get_visible(name, horizon).is_some() {
            return true;
        }
        self.inner
            .parent
            .as_ref()
            .map_or(false, |link| link.registry.contains_visible(name, Some(link.horizon)))
    }

    fn resolve_visible(&self, name: &str, horizon: Option<u64>) -> DiResult<AnyArc> {
        let found = self.inner.table.read().get_visible(name, horizon);
        match found {
            Some(reg) => self.materialize(name, &reg),
            None => match &self.inner.parent {
                // The whole resolution moves to the parent, caches included
                Some(link) => link.registry.resolve_visible(name, Some(link.horizon)),
                None => Err(DiError::NotFound(name.to_string())),
            },
        }
    }

    fn materialize(&self, name: &str, reg: &Arc<Registration>) -> DiResult<AnyArc> {
        match reg.lifetime {
            Lifetime::Singleton => self.resolve_singleton(name, reg),
            Lifetime::Scoped => self.resolve_scoped(name, reg),
            Lifetime::Transient => {
                let frame = Frame { registration: Arc::as_ptr(reg) as usize, cache_owner: 0 };
                with_circular_catch(frame, name, || self.invoke(name, reg))
            }
        }
    }

    fn resolve_singleton(&self, name: &str, reg: &Arc<Registration>) -> DiResult<AnyArc> {
        // Fast path: already materialized (always true for direct instances)
        if let Some(value) = reg.single_runtime.get() {
            return Ok(value.clone());
        }

        let frame = Frame { registration: Arc::as_ptr(reg) as usize, cache_owner: 0 };
        with_circular_catch(frame, name, || {
            reg.single_runtime.get_or_try_init(|| self.invoke(name, reg)).cloned()
        })
    }

    /// Runs the registration's factory with a context bound to this registry.
    pub(crate) fn invoke(&self, name: &str, reg: &Registration) -> DiResult<AnyArc> {
        let ctx = ResolverContext::new(self);
        let observers = &self.inner.observers;
        if !observers.has_observers() {
            return (reg.ctor)(&ctx);
        }

        let start = Instant::now();
        observers.resolving(name, reg.lifetime);
        let result = (reg.ctor)(&ctx);
        match &result {
            Ok(_) => observers.resolved(name, reg.lifetime, start.elapsed()),
            Err(error) => observers.factory_failed(name, error),
        }
        result
    }

    // ----- Introspection -----

    /// Describes the entries of this registry's own table, sorted by name.
    ///
    /// Entries reachable only through the parent are not listed.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let horizon = self.inner.parent.as_ref().map(|link| link.horizon);
        let scoped = self.inner.scoped.lock();
        let table = self.inner.table.read();
        let mut descriptors: Vec<ServiceDescriptor> = table
            .iter()
            .map(|(name, reg)| {
                let materialized = match reg.lifetime {
                    Lifetime::Singleton => reg.single_runtime.get().is_some(),
                    Lifetime::Scoped => scoped.get(name).map_or(false, |cell| cell.get().is_some()),
                    Lifetime::Transient => false,
                };
                ServiceDescriptor {
                    name: name.clone(),
                    lifetime: reg.lifetime,
                    type_name: reg.type_name,
                    has_factory: !reg.eager,
                    materialized,
                    inherited: horizon.map_or(false, |h| reg.revision <= h),
                }
            })
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Number of entries in this registry's own table.
    pub fn len(&self) -> usize {
        self.inner.table.read().len()
    }

    /// True when this registry's own table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The registry this scope was created from, if any.
    pub fn parent(&self) -> Option<&ServiceRegistry> {
        self.inner.parent.as_ref().map(|link| &link.registry)
    }

    /// Number of ancestors (0 for a root registry).
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(registry) = current {
            depth += 1;
            current = registry.parent();
        }
        depth
    }

    /// True when both handles refer to the same registry.
    pub fn ptr_eq(a: &ServiceRegistry, b: &ServiceRegistry) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Attaches an observer to this registry.
    ///
    /// The observer also sees factories run by scopes of this registry. It is
    /// never seen by the parent or by sibling scopes, and it is released when
    /// the last handle to this registry goes away.
    pub fn add_observer(&self, observer: Arc<dyn DiObserver>) -> &Self {
        self.inner.observers.add(observer);
        self
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Service Registry Debug ===\n");
        s.push_str(&format!("Registry #{} (depth {})\n", self.inner.id, self.depth()));
        for d in self.descriptors() {
            s.push_str(&format!(
                "  {}: {} {}{}{}\n",
                d.name,
                d.lifetime,
                d.type_name,
                if d.materialized { " [materialized]" } else { "" },
                if d.inherited { " [inherited]" } else { "" },
            ));
        }
        s
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("id", &self.inner.id)
            .field("depth", &self.depth())
            .field("services", &self.len())
            .finish()
    }
}

impl ResolverCore for ServiceRegistry {
    fn resolve_any(&self, name: &str) -> DiResult<AnyArc> {
        self.resolve_visible(name, None)
    }
}
