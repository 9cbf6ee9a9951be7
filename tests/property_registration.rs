/// Property-based tests for service registration
///
/// Random registration sequences against the same names must always leave
/// the last registration in effect.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use wa_shell::{Lifetime, ServiceRegistry};

#[derive(Debug, Clone)]
enum Op {
    Instance(u32),
    Transient(u32),
    Scoped(u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u32>().prop_map(Op::Instance),
        any::<u32>().prop_map(Op::Transient),
        any::<u32>().prop_map(Op::Scoped),
    ]
}

proptest! {
    #[test]
    fn last_registration_wins(ops in prop::collection::vec(("[a-d]", op()), 1..30)) {
        let registry = ServiceRegistry::new();
        let mut expected = HashMap::new();

        for (name, op) in &ops {
            let value = match op.clone() {
                Op::Instance(v) => {
                    registry.register_instance(name.clone(), v);
                    (v, Lifetime::Singleton)
                }
                Op::Transient(v) => {
                    registry.register_transient(name.clone(), move |_| v);
                    (v, Lifetime::Transient)
                }
                Op::Scoped(v) => {
                    registry.register_scoped(name.clone(), move |_| v);
                    (v, Lifetime::Scoped)
                }
            };
            // Resolve eagerly so overwrites also have to drop cached values
            prop_assert_eq!(*registry.resolve_required::<u32>(name).unwrap(), value.0);
            expected.insert(name.clone(), value);
        }

        prop_assert_eq!(registry.len(), expected.len());
        for descriptor in registry.descriptors() {
            let (value, lifetime) = expected[&descriptor.name];
            prop_assert_eq!(descriptor.lifetime, lifetime);
            prop_assert_eq!(*registry.resolve_required::<u32>(&descriptor.name).unwrap(), value);
        }
    }
}

proptest! {
    #[test]
    fn contains_tracks_scope_view(
        root_names in prop::collection::hash_set("[a-f]{1,3}", 0..6),
        scope_names in prop::collection::hash_set("[g-m]{1,3}", 0..6),
    ) {
        let root = ServiceRegistry::new();
        for name in &root_names {
            root.register_instance(name.clone(), 1u8);
        }
        let scope = root.create_scope();
        for name in &scope_names {
            scope.register_instance(name.clone(), 2u8);
        }

        let all: HashSet<_> = root_names.union(&scope_names).cloned().collect();
        for name in &all {
            prop_assert!(scope.contains(name));
            prop_assert_eq!(root.contains(name), root_names.contains(name));
        }
        prop_assert_eq!(scope.len(), all.len());
    }
}
