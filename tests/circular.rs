use std::sync::Arc;

use wa_shell::{DiError, Resolver, ServiceRegistry};

fn assert_circular<T: std::fmt::Debug>(result: Result<T, DiError>, expected_path: &[&str]) {
    match result {
        Err(DiError::Circular(path)) => assert_eq!(path, expected_path, "wrong circular path"),
        other => panic!("Expected Circular error, got {:?}", other),
    }
}

#[test]
fn test_self_circular_dependency() {
    #[derive(Debug)]
    struct SelfReferencing;

    let registry = ServiceRegistry::new();
    registry.try_register_transient("self", |r| {
        r.resolve_required::<SelfReferencing>("self")?;
        Ok::<_, DiError>(SelfReferencing)
    });

    assert_circular(registry.resolve_required::<SelfReferencing>("self"), &["self", "self"]);
}

#[test]
fn test_two_level_circular() {
    #[derive(Debug)]
    struct A(Arc<B>);
    #[derive(Debug)]
    struct B(Arc<A>);

    let registry = ServiceRegistry::new();
    registry.try_register_singleton_factory("a", |r| Ok::<_, DiError>(A(r.resolve_required::<B>("b")?)));
    registry.try_register_singleton_factory("b", |r| Ok::<_, DiError>(B(r.resolve_required::<A>("a")?)));

    assert_circular(registry.resolve_required::<A>("a"), &["a", "b", "a"]);
    assert_circular(registry.resolve_required::<B>("b"), &["b", "a", "b"]);
}

#[test]
fn test_three_level_circular_through_scoped_and_transient() {
    let registry = ServiceRegistry::new();
    registry.try_register_scoped("a", |r| r.resolve_required::<u8>("b").map(|v| *v));
    registry.try_register_transient("b", |r| r.resolve_required::<u8>("c").map(|v| *v));
    registry.try_register_singleton_factory("c", |r| r.resolve_required::<u8>("a").map(|v| *v));

    let scope = registry.create_scope();
    assert_circular(scope.resolve_required::<u8>("a"), &["a", "b", "c", "a"]);
}

#[test]
fn test_cycle_reported_even_when_factory_swallows_error() {
    let registry = ServiceRegistry::new();
    registry.register_transient("a", |r| {
        // The factory discards the error; the cycle still surfaces at "a"
        r.resolve_optional::<u8>("b").ok().flatten().map_or(0u8, |v| *v)
    });
    registry.register_transient("b", |r| r.resolve_optional::<u8>("a").ok().flatten().map_or(1u8, |v| *v));

    assert_circular(registry.resolve_required::<u8>("a"), &["a", "b", "a"]);
}

#[test]
fn test_registry_usable_after_cycle() {
    let registry = ServiceRegistry::new();
    registry.try_register_singleton_factory("a", |r| r.resolve_required::<u8>("a").map(|v| *v));
    registry.register_instance("ok", 5u8);

    assert!(registry.resolve_required::<u8>("a").is_err());
    // The failed singleton is not cached and the stack is clean
    assert!(registry.resolve_required::<u8>("a").is_err());
    assert_eq!(*registry.resolve_required::<u8>("ok").unwrap(), 5);

    registry.register_instance("a", 1u8);
    assert_eq!(*registry.resolve_required::<u8>("a").unwrap(), 1);
}

#[test]
fn test_diamond_is_not_a_cycle() {
    let registry = ServiceRegistry::new();
    registry.register_instance("base", 1u32);
    registry.register_transient("left", |r| *r.get_required::<u32>("base") + 1);
    registry.register_transient("right", |r| *r.get_required::<u32>("base") + 2);
    registry.register_transient("top", |r| *r.get_required::<u32>("left") + *r.get_required::<u32>("right"));

    assert_eq!(*registry.resolve_required::<u32>("top").unwrap(), 5);
}

#[test]
fn test_same_scoped_name_in_parent_and_child_is_not_a_cycle() {
    // The child's "value" resolves the parent's "value": two different caches
    let root = ServiceRegistry::new();
    root.register_scoped("value", |_| 1u32);

    let scope = root.create_scope();
    let parent = root.clone();
    scope.try_register_scoped("value", move |_| parent.resolve_required::<u32>("value").map(|v| *v + 1));

    assert_eq!(*scope.resolve_required::<u32>("value").unwrap(), 2);
}

#[test]
fn test_depth_exceeded() {
    const CHAIN: usize = 1100;

    let handle = std::thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(|| {
            let registry = ServiceRegistry::new();
            for i in 0..CHAIN {
                let next = format!("svc{}", i + 1);
                registry.try_register_transient(format!("svc{}", i), move |r| {
                    r.resolve_required::<usize>(&next).map(|v| *v)
                });
            }
            registry.register_instance(format!("svc{}", CHAIN), 0usize);
            registry.resolve_required::<usize>("svc0")
        })
        .unwrap();

    match handle.join().unwrap() {
        Err(DiError::DepthExceeded(depth)) => assert_eq!(depth, 1024),
        other => panic!("Expected DepthExceeded, got {:?}", other),
    }
}
