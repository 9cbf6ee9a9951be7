//! Diagnostic observers for service resolution.
//!
//! Observers are notified around every factory invocation; cached hits are
//! silent. An observer attached to a registry also sees factories run by its
//! scopes, while observers attached to a scope stay local to that scope.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::DiError;
use crate::lifetime::Lifetime;

/// Observer trait for resolution events.
///
/// All hooks default to no-ops so implementors only override what they need.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use wa_shell::{DiObserver, Lifetime, ServiceRegistry};
///
/// #[derive(Default)]
/// struct Counting(AtomicUsize);
///
/// impl DiObserver for Counting {
///     fn resolved(&self, _name: &str, _lifetime: Lifetime, _elapsed: std::time::Duration) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let observer = Arc::new(Counting::default());
/// let registry = ServiceRegistry::new();
/// registry.add_observer(observer.clone());
/// registry.register_transient("n", |_| 1u8);
///
/// registry.resolve_required::<u8>("n").unwrap();
/// registry.resolve_required::<u8>("n").unwrap();
/// assert_eq!(observer.0.load(Ordering::SeqCst), 2);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a factory runs.
    fn resolving(&self, _name: &str, _lifetime: Lifetime) {}

    /// Called after a factory produced a value.
    fn resolved(&self, _name: &str, _lifetime: Lifetime, _elapsed: Duration) {}

    /// Called when materialization failed.
    fn factory_failed(&self, _name: &str, _error: &DiError) {}
}

/// Observer that reports resolution through `tracing`.
///
/// Successful materializations are logged at `debug`, failures at `warn`.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: &'static str,
}

impl TracingObserver {
    /// Creates an observer that logs under the `wa_shell::di` label.
    pub fn new() -> Self {
        Self { label: "wa_shell::di" }
    }

    /// Creates an observer with a custom label, recorded as the `source` field.
    pub fn with_label(label: &'static str) -> Self {
        Self { label }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, name: &str, lifetime: Lifetime) {
        tracing::trace!(source = self.label, service = name, %lifetime, "resolving");
    }

    fn resolved(&self, name: &str, lifetime: Lifetime, elapsed: Duration) {
        tracing::debug!(source = self.label, service = name, %lifetime, ?elapsed, "resolved");
    }

    fn factory_failed(&self, name: &str, error: &DiError) {
        tracing::warn!(source = self.label, service = name, %error, "resolution failed");
    }
}

/// Observers of one registry, chained to those of its parent.
///
/// A scope consults its ancestors' lists but only ever writes its own, so
/// observers added to a scope are dropped together with it.
#[derive(Default)]
pub(crate) struct Observers {
    own: RwLock<Vec<Arc<dyn DiObserver>>>,
    parent: Option<Arc<Observers>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn child_of(parent: Arc<Observers>) -> Self {
        Self {
            own: RwLock::new(Vec::new()),
            parent: Some(parent),
        }
    }

    pub(crate) fn add(&self, observer: Arc<dyn DiObserver>) {
        self.own.write().push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.own.read().is_empty() || self.parent.as_ref().map_or(false, |p| p.has_observers())
    }

    // Ancestors first. Observers are cloned out so no lock is held while they run.
    fn snapshot(&self) -> Vec<Arc<dyn DiObserver>> {
        let mut all = match &self.parent {
            Some(parent) => parent.snapshot(),
            None => Vec::new(),
        };
        all.extend(self.own.read().iter().cloned());
        all
    }

    pub(crate) fn resolving(&self, name: &str, lifetime: Lifetime) {
        for observer in self.snapshot() {
            observer.resolving(name, lifetime);
        }
    }

    pub(crate) fn resolved(&self, name: &str, lifetime: Lifetime, elapsed: Duration) {
        for observer in self.snapshot() {
            observer.resolved(name, lifetime, elapsed);
        }
    }

    pub(crate) fn factory_failed(&self, name: &str, error: &DiError) {
        for observer in self.snapshot() {
            observer.factory_failed(name, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<String>>,
    }

    impl DiObserver for Recording {
        fn resolving(&self, name: &str, lifetime: Lifetime) {
            self.events.lock().push(format!("resolving {} {}", name, lifetime));
        }

        fn factory_failed(&self, name: &str, _error: &DiError) {
            self.events.lock().push(format!("failed {}", name));
        }
    }

    #[test]
    fn child_sees_parent_observers_but_not_the_reverse() {
        let parent = Arc::new(Observers::new());
        let child = Observers::child_of(parent.clone());
        assert!(!child.has_observers());

        let on_parent = Arc::new(Recording::default());
        parent.add(on_parent.clone());
        assert!(child.has_observers());

        let on_child = Arc::new(Recording::default());
        child.add(on_child.clone());

        child.resolving("socket", Lifetime::Singleton);
        parent.factory_failed("app", &DiError::NotFound("socket".into()));

        assert_eq!(
            *on_parent.events.lock(),
            vec!["resolving socket singleton".to_string(), "failed app".to_string()]
        );
        assert_eq!(*on_child.events.lock(), vec!["resolving socket singleton".to_string()]);
    }

    #[test]
    fn tracing_observer_carries_its_label() {
        assert_eq!(format!("{:?}", TracingObserver::new()), r#"TracingObserver { label: "wa_shell::di" }"#);
        let observer = TracingObserver::with_label("shell");
        assert_eq!(format!("{:?}", observer), r#"TracingObserver { label: "shell" }"#);
        observer.factory_failed("socket", &DiError::NotFound("client".into()));
    }
}
