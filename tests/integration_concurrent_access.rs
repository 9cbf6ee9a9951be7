//! Concurrent access integration tests
//!
//! These tests verify that the registry behaves correctly when shared across
//! threads: singleton consistency, scope isolation and registration racing
//! resolution.
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use parking_lot::Mutex;
use wa_shell::{DiObserver, Lifetime, ServiceRegistry};

// ===== Test Services =====

#[derive(Debug)]
pub struct CounterService {
    count: AtomicU32,
}

impl CounterService {
    pub fn new() -> Self {
        Self { count: AtomicU32::new(0) }
    }

    pub fn increment(&self) -> u32 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get_count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct SessionService {
    id: u32,
}

impl SessionService {
    pub fn new(counter: &AtomicU32) -> Self {
        Self {
            id: counter.fetch_add(1, Ordering::SeqCst),
        }
    }
}

// ===== Integration Tests =====

#[test]
fn test_singleton_thread_safety() {
    let registry = ServiceRegistry::new();
    registry.register_instance("counter", CounterService::new());

    let thread_count = 8;
    let operations_per_thread = 100;
    let barrier = Arc::new(Barrier::new(thread_count));

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let registry = registry.clone();
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait(); // Synchronize start
                let counter = registry.resolve_required::<CounterService>("counter").unwrap();
                for _ in 0..operations_per_thread {
                    counter.increment();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let counter = registry.resolve_required::<CounterService>("counter").unwrap();
    assert_eq!(counter.get_count(), (thread_count * operations_per_thread) as u32);
}

#[test]
fn test_lazy_singleton_built_once_under_contention() {
    let builds = Arc::new(AtomicU32::new(0));
    let b = builds.clone();

    let registry = ServiceRegistry::new();
    registry.register_singleton_factory("counter", move |_| {
        b.fetch_add(1, Ordering::SeqCst);
        thread::sleep(std::time::Duration::from_millis(5));
        CounterService::new()
    });

    let thread_count = 16;
    let barrier = Arc::new(Barrier::new(thread_count));
    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let registry = registry.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.resolve_required::<CounterService>("counter").unwrap()
            })
        })
        .collect();

    let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn test_scoped_service_isolation() {
    let ids = Arc::new(AtomicU32::new(0));
    let i = ids.clone();

    let registry = ServiceRegistry::new();
    registry.register_instance("counter", CounterService::new());
    registry.register_scoped("session", move |_| SessionService::new(&i));

    let thread_count = 10;
    let barrier = Arc::new(Barrier::new(thread_count));

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let registry = registry.clone();
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();

                let scope = registry.create_scope();
                let counter = scope.resolve_required::<CounterService>("counter").unwrap();
                let session1 = scope.resolve_required::<SessionService>("session").unwrap();
                let session2 = scope.resolve_required::<SessionService>("session").unwrap();

                // Singleton is shared with the root
                let root_counter = registry.resolve_required::<CounterService>("counter").unwrap();
                assert!(Arc::ptr_eq(&counter, &root_counter));

                // Scoped services are the same within a scope
                assert!(Arc::ptr_eq(&session1, &session2));
                session1.id
            })
        })
        .collect();

    let mut seen: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), thread_count); // All IDs should be unique
}

#[test]
fn test_registration_while_resolving() {
    let registry = ServiceRegistry::new();
    registry.register_instance("stable", 1u32);

    let errors = Arc::new(Mutex::new(Vec::new()));
    let writer = {
        let registry = registry.clone();
        thread::spawn(move || {
            for i in 0..200u32 {
                registry.register_instance(format!("svc{}", i), i);
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            let errors = errors.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    if let Err(e) = registry.resolve_required::<u32>("stable") {
                        errors.lock().push(e.to_string());
                    }
                    let _ = registry.create_scope();
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert!(errors.lock().is_empty());
    assert_eq!(registry.len(), 201);
}

#[derive(Default)]
struct CountingObserver {
    resolving: AtomicU32,
    resolved: AtomicU32,
}

impl DiObserver for CountingObserver {
    fn resolving(&self, _name: &str, _lifetime: Lifetime) {
        self.resolving.fetch_add(1, Ordering::SeqCst);
    }

    fn resolved(&self, _name: &str, _lifetime: Lifetime, _elapsed: std::time::Duration) {
        self.resolved.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_observer_sees_factory_runs_from_every_thread() {
    let observer = Arc::new(CountingObserver::default());
    let registry = ServiceRegistry::new();
    registry
        .add_observer(observer.clone())
        .register_transient("job", |_| CounterService::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let scope = registry.create_scope();
            thread::spawn(move || {
                for _ in 0..50 {
                    scope.resolve_required::<CounterService>("job").unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(observer.resolving.load(Ordering::SeqCst), 200);
    assert_eq!(observer.resolved.load(Ordering::SeqCst), 200);
}
