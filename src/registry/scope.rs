//! Scope creation and scoped service resolution.
//!
//! A scope is an ordinary [`ServiceRegistry`] created from another one. It
//! starts with a snapshot of its parent's descriptor table and an empty scoped
//! cache.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::DiResult;
use crate::internal::{with_circular_catch, Frame};
use crate::observer::Observers;
use crate::registration::{AnyArc, Registration};

use super::{ParentLink, ServiceRegistry};

impl ServiceRegistry {
    /// Creates a child scope.
    ///
    /// The child receives a shallow copy of this registry's descriptor table
    /// as it is right now. Registrations made on this registry afterwards are
    /// not visible to the child; registrations made on the child never reach
    /// this registry. Singleton slots are shared with the parent, scoped caches
    /// are not.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use wa_shell::{DiError, ServiceRegistry};
    ///
    /// #[derive(Debug)]
    /// struct RequestId(u32);
    ///
    /// let root = ServiceRegistry::new();
    /// root.register_scoped("request", |_| RequestId(1));
    ///
    /// let scope1 = root.create_scope();
    /// let scope2 = root.create_scope();
    ///
    /// let a = scope1.resolve_required::<RequestId>("request").unwrap();
    /// let b = scope1.resolve_required::<RequestId>("request").unwrap();
    /// let c = scope2.resolve_required::<RequestId>("request").unwrap();
    /// assert!(Arc::ptr_eq(&a, &b)); // Same scope, same instance
    /// assert!(!Arc::ptr_eq(&a, &c)); // Different scopes, different instances
    ///
    /// // Later parent registrations stay invisible to existing scopes
    /// root.register_instance("late", 5u8);
    /// assert!(matches!(scope1.resolve_required::<u8>("late"), Err(DiError::NotFound(_))));
    /// assert_eq!(*root.create_scope().resolve_required::<u8>("late").unwrap(), 5);
    /// ```
    pub fn create_scope(&self) -> ServiceRegistry {
        let (table, horizon) = {
            let table = self.inner.table.read();
            (table.snapshot(), table.revision())
        };
        let services = table.len();

        let scope = ServiceRegistry::from_parts(
            table,
            Some(ParentLink {
                registry: self.clone(),
                horizon,
            }),
            Observers::child_of(self.inner.observers.clone()),
        );
        tracing::debug!(parent = self.inner.id, scope = scope.inner.id, services, "created scope");
        scope
    }

    /// Resolves a scoped registration in this registry's own cache.
    pub(crate) fn resolve_scoped(&self, name: &str, reg: &Arc<Registration>) -> DiResult<AnyArc> {
        let cell = {
            let mut cache = self.inner.scoped.lock();
            match cache.get(name) {
                Some(cell) => cell.clone(),
                None => {
                    let cell = Arc::new(OnceCell::new());
                    cache.insert(name.to_string(), cell.clone());
                    cell
                }
            }
        };

        // Fast path: already materialized in this scope
        if let Some(value) = cell.get() {
            return Ok(value.clone());
        }

        let frame = Frame {
            registration: Arc::as_ptr(reg) as usize,
            cache_owner: self.inner.id,
        };
        with_circular_catch(frame, name, || {
            cell.get_or_try_init(|| self.invoke(name, reg)).cloned()
        })
    }
}
