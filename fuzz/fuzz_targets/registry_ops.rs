#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;
use wa_shell::ServiceRegistry;

// Drives a root registry and a chain of scopes with byte-coded operations and
// checks every resolution against a plain map model of each scope's view.
fuzz_target!(|data: &[u8]| {
    let mut registries = vec![ServiceRegistry::new()];
    let mut models: Vec<HashMap<u8, u32>> = vec![HashMap::new()];

    for chunk in data.chunks(3) {
        let [op, target, value] = match chunk {
            [a, b, c] => [*a, *b, *c],
            _ => return,
        };
        let index = target as usize % registries.len();
        let name_id = value % 16;
        let name = format!("svc{}", name_id);

        match op % 4 {
            0 => {
                registries[index].register_instance(name, u32::from(value));
                models[index].insert(name_id, u32::from(value));
            }
            1 => {
                let produced = u32::from(value) + 1000;
                registries[index].register_transient(name, move |_| produced);
                models[index].insert(name_id, produced);
            }
            2 => {
                if registries.len() < 8 {
                    registries.push(registries[index].create_scope());
                    models.push(models[index].clone());
                }
            }
            _ => {
                let resolved = registries[index].resolve_optional::<u32>(&name).unwrap().map(|v| *v);
                assert_eq!(resolved, models[index].get(&name_id).copied());
            }
        }
    }
});
