//! Service descriptors for introspection and diagnostics.

use crate::lifetime::Lifetime;

/// Service descriptor for introspection and diagnostics
///
/// A read-only view of one entry of a registry's own table, produced by
/// [`ServiceRegistry::descriptors`](crate::ServiceRegistry::descriptors).
///
/// # Examples
///
/// ```rust
/// use wa_shell::{Lifetime, ServiceRegistry};
///
/// let registry = ServiceRegistry::new();
/// registry.register_instance("greeting", "hi".to_string());
/// registry.register_scoped("request", |_| 0u64);
///
/// let scope = registry.create_scope();
/// scope.register_transient("clock", |_| std::time::Instant::now());
///
/// let descriptors = scope.descriptors();
/// let names: Vec<_> = descriptors.iter().map(|d| d.name.as_str()).collect();
/// assert_eq!(names, ["clock", "greeting", "request"]);
///
/// let greeting = &descriptors[1];
/// assert_eq!(greeting.lifetime, Lifetime::Singleton);
/// assert!(greeting.inherited);
/// assert!(greeting.materialized);
/// assert!(!greeting.has_factory);
///
/// let clock = &descriptors[0];
/// assert!(!clock.inherited);
/// assert_eq!(clock.type_name(), "std::time::Instant");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Registered name
    pub name: String,
    /// Service lifetime
    pub lifetime: Lifetime,
    /// Rust type name of the registered value
    pub type_name: &'static str,
    /// False for values registered directly
    pub has_factory: bool,
    /// A cached instance exists for this registry (singleton slot or scoped cache)
    pub materialized: bool,
    /// The entry came from the parent's table when the scope was created
    pub inherited: bool,
}

impl ServiceDescriptor {
    /// Rust type name of the registered value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True for singletons registered as a ready value.
    pub fn is_eager(&self) -> bool {
        self.lifetime == Lifetime::Singleton && !self.has_factory
    }
}
