//! Service lifetime definitions.

use std::fmt;

/// Service lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use wa_shell::ServiceRegistry;
///
/// struct Database { url: String }
/// struct RequestModel { id: usize }
///
/// let registry = ServiceRegistry::new();
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// // Singleton: one instance for the registry and every scope that inherits it
/// registry.register_instance("db", Database { url: "postgres://localhost".to_string() });
///
/// // Scoped: one instance per registry
/// registry.register_scoped("request", |_| RequestModel { id: 7 });
///
/// // Transient: new instance every time
/// let c = counter.clone();
/// registry.register_transient("model", move |_| RequestModel { id: c.fetch_add(1, Ordering::SeqCst) });
///
/// let scope1 = registry.create_scope();
/// let scope2 = registry.create_scope();
///
/// let db1 = scope1.resolve_required::<Database>("db").unwrap();
/// let db2 = scope2.resolve_required::<Database>("db").unwrap();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// let r1 = scope1.resolve_required::<RequestModel>("request").unwrap();
/// let r2 = scope2.resolve_required::<RequestModel>("request").unwrap();
/// assert!(!Arc::ptr_eq(&r1, &r2));
///
/// let m1 = scope1.resolve_required::<RequestModel>("model").unwrap();
/// let m2 = scope1.resolve_required::<RequestModel>("model").unwrap();
/// assert_eq!((m1.id, m2.id), (0, 1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per owning registry, cached forever
    ///
    /// Either registered directly as a value or materialized from a factory on
    /// first resolution. Scopes created from the owning registry share the
    /// same instance.
    Singleton,
    /// Single instance per registry, cached in that registry's scoped cache
    ///
    /// Sibling and child scopes each get their own instance.
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        };
        f.write_str(label)
    }
}
