#![no_main]

//! Fuzz target for identifier handling
//!
//! Resolves arbitrary ids through a composite container with a nested
//! sub-container and checks that lookups never panic.

use dependency_registry::{
    CompositeContainer, Container, RecordStore, Resolver, SharedResolver, ValueRecord, identifier,
};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|id: &str| {
    let sub = RecordStore::new();
    sub.add("url", ValueRecord::new("postgres://localhost")).unwrap();
    let sub: SharedResolver = Arc::new(Container::new(sub));

    let store = RecordStore::new();
    store.add("name", ValueRecord::new("app")).unwrap();
    let container = CompositeContainer::new(store, [("db", sub)], '.').unwrap();

    let valid = identifier::validate(id).is_ok();
    let has = container.has(id);
    let get = container.get(id);

    if !valid {
        assert!(has.is_err());
    }
    match has {
        Ok(true) => assert!(get.is_ok()),
        Ok(false) => assert!(get.unwrap_err().is_not_found()),
        Err(_) => assert!(get.is_err()),
    }
});
