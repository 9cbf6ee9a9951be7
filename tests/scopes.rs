use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use wa_shell::{ApplicationBuilder, DiError, DiObserver, Lifetime, ServiceRegistry};

#[derive(Debug)]
struct RequestId(usize);

fn counting_scoped(registry: &ServiceRegistry) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    registry.register_scoped("request", move |_| RequestId(counter.fetch_add(1, Ordering::SeqCst)));
    calls
}

#[test]
fn test_scoped_is_per_scope() {
    let root = ServiceRegistry::new();
    let calls = counting_scoped(&root);

    let scope1 = root.create_scope();
    let scope2 = root.create_scope();

    let a1 = scope1.resolve_required::<RequestId>("request").unwrap();
    let a2 = scope1.resolve_required::<RequestId>("request").unwrap();
    let b1 = scope2.resolve_required::<RequestId>("request").unwrap();

    assert!(Arc::ptr_eq(&a1, &a2));
    assert!(!Arc::ptr_eq(&a1, &b1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_nested_scope_builds_its_own_scoped_instance() {
    let root = ServiceRegistry::new();
    let calls = counting_scoped(&root);

    let outer = root.create_scope();
    let inner = outer.create_scope();

    let a = outer.resolve_required::<RequestId>("request").unwrap();
    let b = inner.resolve_required::<RequestId>("request").unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(inner.depth(), 2);
}

#[test]
fn test_singleton_shared_between_parent_and_scopes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let root = ServiceRegistry::new();
    root.register_singleton_factory("socket", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        "socket".to_string()
    });

    let scope1 = root.create_scope();
    let scope2 = root.create_scope();

    // Materialize through a scope first
    let from_scope1 = scope1.resolve_required::<String>("socket").unwrap();
    let from_root = root.resolve_required::<String>("socket").unwrap();
    let from_scope2 = scope2.resolve_required::<String>("socket").unwrap();

    assert!(Arc::ptr_eq(&from_scope1, &from_root));
    assert!(Arc::ptr_eq(&from_root, &from_scope2));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_scope_override_is_local() {
    let root = ServiceRegistry::new();
    root.register_instance("greeting", "hi".to_string());

    let scope = root.create_scope();
    scope.register_instance("greeting", "yo".to_string());

    assert_eq!(*scope.resolve_required::<String>("greeting").unwrap(), "yo");
    assert_eq!(*root.resolve_required::<String>("greeting").unwrap(), "hi");

    // Siblings created before or after are unaffected
    assert_eq!(*root.create_scope().resolve_required::<String>("greeting").unwrap(), "hi");
}

#[test]
fn test_scope_registrations_never_reach_parent() {
    let root = ServiceRegistry::new();
    let scope = root.create_scope();
    scope.register_instance("local", 1u8);

    assert!(scope.contains("local"));
    assert!(!root.contains("local"));
    assert!(matches!(root.resolve_required::<u8>("local"), Err(DiError::NotFound(_))));
}

#[test]
fn test_snapshot_hides_later_parent_registrations() {
    let root = ServiceRegistry::new();
    root.register_instance("early", 1u8);
    let scope = root.create_scope();

    root.register_instance("late", 2u8);
    root.register_instance("early", 3u8);

    assert!(scope.resolve_optional::<u8>("late").unwrap().is_none());
    assert!(!scope.contains("late"));
    // The overwrite on the parent is invisible too
    assert_eq!(*scope.resolve_required::<u8>("early").unwrap(), 1);

    let fresh = root.create_scope();
    assert_eq!(*fresh.resolve_required::<u8>("late").unwrap(), 2);
    assert_eq!(*fresh.resolve_required::<u8>("early").unwrap(), 3);
}

#[test]
fn test_descriptors_mark_inherited_entries() {
    let root = ServiceRegistry::new();
    root.register_instance("greeting", "hi".to_string());
    root.register_transient("clock", |_| 0u64);

    let scope = root.create_scope();
    scope.register_instance("greeting", "yo".to_string());

    let descriptors = scope.descriptors();
    let clock = descriptors.iter().find(|d| d.name == "clock").unwrap();
    let greeting = descriptors.iter().find(|d| d.name == "greeting").unwrap();
    assert!(clock.inherited);
    assert!(!greeting.inherited);
}

#[test]
fn test_parent_and_depth() {
    let root = ServiceRegistry::new();
    let child = root.create_scope();
    let grandchild = child.create_scope();

    assert!(root.parent().is_none());
    assert!(ServiceRegistry::ptr_eq(grandchild.parent().unwrap(), &child));
    assert_eq!(root.depth(), 0);
    assert_eq!(grandchild.depth(), 2);
}

#[test]
fn test_scope_outlives_dropped_parent_handle() {
    let scope = {
        let root = ServiceRegistry::new();
        root.register_instance("value", 7u32);
        root.create_scope()
    };
    assert_eq!(*scope.resolve_required::<u32>("value").unwrap(), 7);
    assert!(scope.parent().is_some());
}

#[test]
fn test_scoped_factory_resolves_scope_local_dependency() {
    #[derive(Debug)]
    struct Session {
        user: Arc<String>,
    }

    let root = ServiceRegistry::new();
    root.register_instance("user", "anonymous".to_string());
    root.try_register_scoped("session", |ctx| {
        Ok::<_, DiError>(Session {
            user: ctx.registry().resolve_required::<String>("user")?,
        })
    });

    let scope = root.create_scope();
    scope.register_instance("user", "ana".to_string());

    assert_eq!(*scope.resolve_required::<Session>("session").unwrap().user, "ana");
    assert_eq!(*root.resolve_required::<Session>("session").unwrap().user, "anonymous");
}

#[derive(Default)]
struct CountingObserver {
    resolutions: AtomicUsize,
}

impl DiObserver for CountingObserver {
    fn resolving(&self, _name: &str, _lifetime: Lifetime) {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_scope_observer_stays_local_and_is_released() {
    let root = ServiceRegistry::new();
    root.register_transient("tick", |_| 1u8);
    let on_root = Arc::new(CountingObserver::default());
    root.add_observer(on_root.clone());

    let on_scope = Arc::new(CountingObserver::default());
    {
        let scope = root.create_scope();
        scope.add_observer(on_scope.clone());
        scope.resolve_required::<u8>("tick").unwrap();
        assert_eq!(Arc::strong_count(&on_scope), 2);
    }
    assert_eq!(on_scope.resolutions.load(Ordering::SeqCst), 1);
    assert_eq!(Arc::strong_count(&on_scope), 1);

    root.resolve_required::<u8>("tick").unwrap();
    root.create_scope().resolve_required::<u8>("tick").unwrap();

    assert_eq!(on_scope.resolutions.load(Ordering::SeqCst), 1);
    // Root observers see their own factories and those of every scope
    assert_eq!(on_root.resolutions.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_greeting_end_to_end() {
    struct Greeter {
        greeting: Arc<String>,
    }

    let mut builder = ApplicationBuilder::new();
    builder.configure(|registry| {
        registry.register_instance("greeting", "Hello".to_string());
    });
    builder
        .configure_async(|registry| async move {
            tokio::task::yield_now().await;
            registry.try_register_transient("greeter", |ctx| {
                Ok::<_, DiError>(Greeter {
                    greeting: ctx.registry().resolve_required::<String>("greeting")?,
                })
            });
            Ok::<_, DiError>(())
        })
        .await
        .unwrap();

    let root = builder.build();
    let scope = root.create_scope();
    scope.register_instance("greeting", "Howdy".to_string());

    let from_root = root.resolve_required::<Greeter>("greeter").unwrap();
    let from_scope = scope.resolve_required::<Greeter>("greeter").unwrap();
    assert_eq!(format!("{}, Ana!", from_root.greeting), "Hello, Ana!");
    assert_eq!(format!("{}, Ana!", from_scope.greeting), "Howdy, Ana!");
}
