//! Service registration types.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::DiResult;
use crate::lifetime::Lifetime;

// ResolverContext is defined in registry module
pub(crate) use crate::registry::ResolverContext;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Ctor = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Service registration with lifetime and constructor
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) ctor: Ctor,
    /// Registered as a ready value rather than a factory
    pub(crate) eager: bool,
    /// Singleton slot, shared by every table that holds this registration
    pub(crate) single_runtime: OnceCell<AnyArc>,
    pub(crate) type_name: &'static str,
    /// Revision of the owning table when this registration was written
    pub(crate) revision: u64,
}

impl Registration {
    /// Creates a factory-backed registration
    pub(crate) fn with_factory(
        lifetime: Lifetime,
        ctor: Ctor,
        type_name: &'static str,
        revision: u64,
    ) -> Self {
        Self {
            lifetime,
            ctor,
            eager: false,
            single_runtime: OnceCell::new(),
            type_name,
            revision,
        }
    }

    /// Creates an eager singleton holding an already-built value
    pub(crate) fn with_instance(value: AnyArc, type_name: &'static str, revision: u64) -> Self {
        let stored = value.clone();
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> { Ok(stored.clone()) };
        Self {
            lifetime: Lifetime::Singleton,
            ctor: Arc::new(ctor),
            eager: true,
            single_runtime: OnceCell::with_value(value),
            type_name,
            revision,
        }
    }
}

/// Descriptor table of one registry
#[derive(Clone, Default)]
pub(crate) struct Registry {
    entries: HashMap<String, Arc<Registration>>,
    revision: u64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current revision; bumped by every insert
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    /// Inserts or replaces the registration for `name`. The builder receives
    /// the revision the new entry is stamped with.
    pub(crate) fn insert<F>(&mut self, name: String, build: F)
    where
        F: FnOnce(u64) -> Registration,
    {
        self.revision += 1;
        let registration = build(self.revision);
        self.entries.insert(name, Arc::new(registration));
    }

    /// Looks up a registration visible at `horizon` (`None` sees everything).
    pub(crate) fn get_visible(&self, name: &str, horizon: Option<u64>) -> Option<Arc<Registration>> {
        self.entries
            .get(name)
            .filter(|reg| horizon.map_or(true, |h| reg.revision <= h))
            .cloned()
    }

    /// Copies entries (not materialized scoped values) for a child scope.
    /// Singleton slots live inside the shared registrations, so parent and
    /// child observe the same singleton instance.
    pub(crate) fn snapshot(&self) -> Self {
        self.clone()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &Arc<Registration>)> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
