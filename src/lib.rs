//! # Dependency Registry - String-Keyed Dependency Injection for Rust
//!
//! A container mapping string identifiers to lazily or eagerly produced
//! values, composed from smaller containers through prefix namespacing.
//!
//! ## Features
//!
//! - 🧩 **Records** - Plain values, memoized callbacks, instances built from
//!   dependency ids, factory products, and decorator chains
//! - 🏭 **Lazy and memoized** - Each record computes its value at most once,
//!   including `false`, `0` and empty results
//! - 🔁 **Cycle detection** - `TrackedContainer` reports circular references
//!   with the full resolution path (`foo->bar->foo`)
//! - 🗂️ **Composition** - `db.url` resolves `url` in the sub-container
//!   mounted as `db`
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use dependency_registry::{CallbackRecord, Container, RecordStore, ResolverExt, ValueRecord};
//!
//! let store = RecordStore::new();
//! store.add("test", ValueRecord::new("Hello")).unwrap();
//! store.add("lazy", CallbackRecord::new(|_| Ok("World"))).unwrap();
//!
//! let container = Container::new(store);
//! assert_eq!(*container.get_as::<&str>("test").unwrap(), "Hello");
//! assert_eq!(*container.get_as::<&str>("lazy").unwrap(), "World");
//! ```
//!
//! ## Dependencies Between Records
//!
//! ```rust
//! use dependency_registry::{ContainerBuilder, InstanceRecord, ResolverExt};
//!
//! struct Database { url: String }
//! struct UserRepository { db: std::sync::Arc<Database> }
//!
//! let mut builder = ContainerBuilder::new();
//! builder
//!     .value("db.url", String::from("postgres://localhost"))?
//!     .add("database", InstanceRecord::new(["db.url"], |args| {
//!         Ok(Database { url: (*args.arg::<String>(0)?).clone() })
//!     }))?
//!     .add("users", InstanceRecord::new(["database"], |args| {
//!         Ok(UserRepository { db: args.arg::<Database>(0)? })
//!     }))?;
//!
//! let container = builder.build_tracked()?;
//! let users = container.get_as::<UserRepository>("users")?;
//! assert_eq!(users.db.url, "postgres://localhost");
//! # Ok::<(), dependency_registry::DiError>(())
//! ```
//!
//! ## Composition
//!
//! ```rust
//! use dependency_registry::{Container, ContainerBuilder, RecordStore, ResolverExt, ValueRecord};
//! use std::sync::Arc;
//!
//! let cache = RecordStore::new();
//! cache.add("ttl", ValueRecord::new(60u32)).unwrap();
//!
//! let mut builder = ContainerBuilder::new();
//! builder.mount("cache", Arc::new(Container::new(cache)))?;
//!
//! let app = builder.build()?;
//! assert_eq!(*app.get_as::<u32>("cache.ttl")?, 60);
//! # Ok::<(), dependency_registry::DiError>(())
//! ```
//!
//! ## Threading
//!
//! Resolution is synchronous and happens on the caller's stack. Containers
//! are `Send + Sync`, and a tracked container keeps its call stack per
//! top-level call, so it can be shared. Two threads racing on the *first*
//! access of the same memoized record may both run its callback; the first
//! stored value is kept and returned to everyone afterwards.

mod builder;
mod container;
mod error;
pub mod identifier;
#[cfg(feature = "logging")]
pub mod logging;
mod record;
mod storage;
mod tracked;
mod value;

pub use builder::*;
pub use container::*;
pub use error::*;
pub use record::*;
pub use storage::*;
pub use tracked::*;
pub use value::*;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CallbackRecord, ComposedInstanceRecord, CompositeContainer, Container, ContainerBuilder,
        ContainerConfig, Dependency, DiError, InstanceRecord, ProductRecord, Record, RecordStore,
        Resolver, ResolverExt, Result, SharedResolver, TrackedContainer, Value, ValueRecord,
    };
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_end_to_end_scenario() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let store = RecordStore::new();
        store.add("test", ValueRecord::new("Hello")).unwrap();
        store
            .add(
                "lazy",
                CallbackRecord::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok("World")
                }),
            )
            .unwrap();

        let container = Container::new(store);
        assert_eq!(*container.get_as::<&str>("test").unwrap(), "Hello");
        assert_eq!(*container.get_as::<&str>("lazy").unwrap(), "World");
        assert_eq!(*container.get_as::<&str>("lazy").unwrap(), "World");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_add_then_get_round_trip() {
        let record: SharedRecord = Arc::new(ValueRecord::new(42u64));
        let store = RecordStore::new();
        store.add_shared("answer", Arc::clone(&record)).unwrap();
        let container = Container::new(store);

        let via_container = container.get("answer").unwrap();
        let via_record = record.value(&container).unwrap();
        assert!(Arc::ptr_eq(&via_container, &via_record));
    }

    #[test]
    fn test_callback_shared_between_containers() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let record: SharedRecord = Arc::new(CallbackRecord::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(0u8)
        }));

        let first = RecordStore::new();
        first.add_shared("zero", Arc::clone(&record)).unwrap();
        let second = RecordStore::new();
        second.add_shared("zero", Arc::clone(&record)).unwrap();

        let a = Container::new(first).get("zero").unwrap();
        let b = TrackedContainer::new(Container::new(second))
            .get("zero")
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_has_never_resolves() {
        let store = RecordStore::new();
        store.add("callback", CallbackRecord::new(|_| Ok(1u8))).unwrap();
        store
            .add("instance", InstanceRecord::new(["callback"], |_| Ok(2u8)))
            .unwrap();
        store
            .add(
                "product",
                ProductRecord::new("instance", "make", Vec::<String>::new(), |_: &u8, _| Ok(3u8)),
            )
            .unwrap();
        let wrapped: SharedRecord = Arc::new(CallbackRecord::new(|_| Ok(4u8)));
        store
            .add(
                "composed",
                ComposedInstanceRecord::new(
                    Arc::clone(&wrapped),
                    [Dependency::Wrapped, Dependency::from("callback")],
                    |_| Ok(5u8),
                ),
            )
            .unwrap();

        let container = TrackedContainer::new(
            CompositeContainer::new(store, Vec::<(String, SharedResolver)>::new(), '.').unwrap(),
        );
        let ids = ["callback", "instance", "product", "composed"];
        for id in ids {
            assert!(container.has(id).unwrap());
        }

        let store = container.inner().store();
        for id in ids {
            assert!(!store.record(id).unwrap().is_resolved(), "{id} was resolved by has");
        }
        assert!(!wrapped.is_resolved());
    }

    #[test]
    fn test_decorator_flow() {
        let mut builder = ContainerBuilder::new();
        builder.value("x", String::from("original")).unwrap();
        builder
            .decorate("x", |alias| {
                InstanceRecord::new([alias], |args| {
                    Ok(format!("decorated({})", args.arg::<String>(0)?))
                })
            })
            .unwrap();

        let container = builder.build_tracked().unwrap();
        assert_eq!(
            *container.get_as::<String>("x").unwrap(),
            "decorated(original)"
        );

        let alias = format!("x{ALIAS_MARKER}");
        assert_eq!(*container.get_as::<String>(&alias).unwrap(), "original");
    }

    #[test]
    fn test_prefix_wins_over_record() {
        let sub: SharedResolver = Arc::new(Container::new(RecordStore::new()));
        let store = RecordStore::new();
        store.add("foo", ValueRecord::new("V1")).unwrap();

        let container = CompositeContainer::new(store, [("foo", Arc::clone(&sub))], '.').unwrap();
        let resolved = container.get_as::<SharedResolver>("foo").unwrap();
        assert!(Arc::ptr_eq(&*resolved, &sub));
    }

    #[test]
    fn test_tracked_not_found_chain() {
        let mut builder = ContainerBuilder::new();
        builder
            .add("foo", InstanceRecord::new(["bar"], |_| Ok(())))
            .unwrap()
            .add("bar", InstanceRecord::new(["undefined"], |_| Ok(())))
            .unwrap();

        let container = builder.build_tracked().unwrap();
        let err = container.get("foo").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("foo->bar->undefined"));
    }
}
