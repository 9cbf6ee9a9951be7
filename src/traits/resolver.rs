//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};

/// Core resolver trait for object-safe service resolution.
///
/// Implemented by [`ServiceRegistry`](crate::ServiceRegistry) and by the
/// [`ResolverContext`](crate::ResolverContext) handed to factories. Most users
/// should use the [`Resolver`] trait instead, which adds typed lookups on top.
pub trait ResolverCore: Send + Sync {
    /// Resolves a service by name, honoring its lifetime and the scope chain.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<dyn Any>)` - The resolved, type-erased service
    /// * `Err(DiError)` - Not found, factory failure, cycle or depth error
    fn resolve_any(&self, name: &str) -> DiResult<Arc<dyn Any + Send + Sync>>;
}

/// High-level resolver interface with typed lookups.
///
/// The registry stores values behind an opaque handle; the caller names the
/// expected type and a runtime check confirms that the registered value
/// matches.
///
/// # Examples
///
/// ```
/// use wa_shell::{Resolver, ServiceRegistry};
///
/// let registry = ServiceRegistry::new();
/// registry.register_instance("port", 8080u16);
///
/// let port = registry.resolve_required::<u16>("port").unwrap();
/// assert_eq!(*port, 8080);
///
/// assert!(registry.resolve_optional::<u16>("missing").unwrap().is_none());
/// assert!(registry.resolve_required::<String>("port").is_err());
/// assert!(registry.resolve_optional::<String>("port").is_err());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a service and downcasts it to `T`.
    ///
    /// # Errors
    ///
    /// * [`DiError::NotFound`] when no registry in the chain knows `name`
    /// * [`DiError::TypeMismatch`] when the registered value is not a `T`
    /// * any error raised while materializing the service
    fn resolve_required<T: 'static + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
        let any = self.resolve_any(name)?;
        any.downcast::<T>().map_err(|_| DiError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Resolves a service that may be absent.
    ///
    /// Only a missing name yields `Ok(None)`. Every other failure (factory
    /// error, type mismatch, cycle) is returned to the caller unchanged.
    fn resolve_optional<T: 'static + Send + Sync>(&self, name: &str) -> DiResult<Option<Arc<T>>> {
        match self.resolve_required::<T>(name) {
            Ok(value) => Ok(Some(value)),
            Err(DiError::NotFound(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Resolves a service, panicking on failure.
    ///
    /// Meant for wiring code where a missing service is a configuration bug.
    fn get_required<T: 'static + Send + Sync>(&self, name: &str) -> Arc<T> {
        self.resolve_required::<T>(name)
            .unwrap_or_else(|e| panic!("Failed to resolve {} as {}: {}", name, std::any::type_name::<T>(), e))
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
