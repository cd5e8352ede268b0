#![no_main]

//! Fuzz target for dependency graphs
//!
//! Builds arbitrary graphs of instance records, cycles included, and checks
//! that a tracked container always terminates with a value or a typed error.

use arbitrary::Arbitrary;
use dependency_registry::{
    Container, DiError, InstanceRecord, RecordStore, Resolver, TrackedContainer,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Graph {
    // Node count (clamped to 1-16)
    nodes: u8,
    // Edges as (from, to) pairs, taken modulo nodes + 1 so some targets are missing
    edges: Vec<(u8, u8)>,
    // Roots to resolve
    roots: Vec<u8>,
}

fuzz_target!(|graph: Graph| {
    let nodes = (graph.nodes % 16).max(1) as usize;
    let mut dependencies = vec![Vec::new(); nodes];
    for (from, to) in graph.edges.into_iter().take(64) {
        let from = from as usize % nodes;
        let to = to as usize % (nodes + 1);
        dependencies[from].push(format!("n{to}"));
    }

    let store = RecordStore::new();
    for (index, deps) in dependencies.into_iter().enumerate() {
        store
            .add(format!("n{index}"), InstanceRecord::new(deps, |args| Ok(args.len())))
            .unwrap();
    }

    let container = TrackedContainer::new(Container::new(store));
    for root in graph.roots.into_iter().take(16) {
        let id = format!("n{}", root as usize % nodes);
        match container.get(&id) {
            Ok(_) => {}
            Err(DiError::CircularReference { path, .. }) => {
                let ids = path.ids();
                let (last, earlier) = ids.split_last().unwrap();
                assert!(earlier.contains(last));
            }
            Err(err) => assert!(err.is_not_found(), "unexpected error: {err}"),
        }
    }
});
