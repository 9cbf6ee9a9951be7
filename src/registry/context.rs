//! Resolver context for factories.
//!
//! This module contains the ResolverContext type which provides the interface
//! factory functions use to reach other services.

use crate::error::DiResult;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

use super::ServiceRegistry;

/// Context passed to factory functions for resolving dependencies.
///
/// The context is bound to the registry performing the materialization: for
/// a scoped service that is the scope whose cache receives the value, for a
/// service delegated to an ancestor it is that ancestor.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use wa_shell::{Resolver, ServiceRegistry};
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let registry = ServiceRegistry::new();
/// registry.register_instance("db", Database { url: "postgres://localhost".to_string() });
/// registry.register_transient("users", |ctx| UserService {
///     // ctx is a ResolverContext that provides access to other services
///     db: ctx.get_required::<Database>("db"),
/// });
///
/// let users = registry.resolve_required::<UserService>("users").unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    registry: &'a ServiceRegistry,
}

impl<'a> ResolverContext<'a> {
    /// Creates a new ResolverContext wrapping the given registry.
    pub(crate) fn new(registry: &'a ServiceRegistry) -> Self {
        Self { registry }
    }

    /// The registry this context resolves against.
    ///
    /// Lets a factory create a nested scope or hand the registry to the
    /// service it builds.
    pub fn registry(&self) -> &'a ServiceRegistry {
        self.registry
    }
}

impl<'a> ResolverCore for ResolverContext<'a> {
    fn resolve_any(&self, name: &str) -> DiResult<AnyArc> {
        self.registry.resolve_any(name)
    }
}
