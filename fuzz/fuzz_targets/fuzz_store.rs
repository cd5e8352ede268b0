#![no_main]

//! Fuzz target for record store operations
//!
//! Tests registration, replacement, aliasing and removal with arbitrary ids.

use arbitrary::Arbitrary;
use dependency_registry::{
    CallbackRecord, Container, RecordStore, Resolver, ValueRecord, identifier,
};
use libfuzzer_sys::fuzz_target;

/// Operations to perform on the store
#[derive(Debug, Arbitrary)]
enum StoreOp {
    AddValue(String, u32),
    AddCallback(String, u32),
    Replace(String, u32),
    Move(String),
    Remove(String),
    Get(String),
    Has(String),
    Len,
}

fuzz_target!(|ops: Vec<StoreOp>| {
    let container = Container::new(RecordStore::new());
    let store = container.store();

    for op in ops.into_iter().take(256) {
        match op {
            StoreOp::AddValue(id, value) => {
                let accepted = identifier::validate(&id).is_ok() && !store.has(&id);
                let result = store.add(id.as_str(), ValueRecord::new(value));
                // Adding never overwrites
                assert_eq!(result.is_ok(), accepted);
            }
            StoreOp::AddCallback(id, value) => {
                let _ = store.add(id, CallbackRecord::new(move |_| Ok(value)));
            }
            StoreOp::Replace(id, value) => {
                if store.replace(id.as_str(), ValueRecord::new(value)).is_ok() {
                    assert!(store.has(&id));
                }
            }
            StoreOp::Move(id) => {
                let len = store.len();
                match store.move_record(&id) {
                    Ok(alias) => {
                        assert!(!store.has(&id));
                        assert!(store.has(&alias));
                        assert_eq!(store.len(), len);
                    }
                    Err(err) => assert!(err.is_not_found()),
                }
            }
            StoreOp::Remove(id) => {
                let _ = store.remove(&id);
                assert!(!store.has(&id));
            }
            StoreOp::Get(id) => {
                let stored = identifier::validate(&id).is_ok() && store.has(&id);
                // Values and callbacks here never fail
                assert_eq!(container.get(&id).is_ok(), stored);
            }
            StoreOp::Has(id) => {
                let _ = container.has(&id);
            }
            StoreOp::Len => {
                assert_eq!(store.len(), store.ids().len());
            }
        }
    }
});
