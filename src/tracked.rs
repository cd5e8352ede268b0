//! Call-stack tracking
//!
//! [`TrackedContainer`] decorates any [`Lookup`] with circular-reference
//! detection and resolution-path diagnostics.
//!
//! Every top-level `get` opens a fresh [`Resolution`] session that owns the
//! call stack and acts as the resolver records receive. Nested lookups go
//! through the session, so they are observed, while independent top-level
//! calls (including calls from other threads) never share a stack.

use crate::container::{Lookup, Resolver};
use crate::error::ResolutionPath;
use crate::value::Value;
use crate::{DiError, Result};
use indexmap::IndexSet;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Unique identifier of one top-level resolution.
///
/// Only used to correlate log events of one resolution tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Generate a new unique session ID.
    #[inline]
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "resolution-{}", self.0)
    }
}

/// Container decorator detecting circular references.
///
/// # Examples
///
/// ```rust
/// use dependency_registry::{
///     CallbackRecord, Container, DiError, RecordStore, Resolver, TrackedContainer,
/// };
///
/// let store = RecordStore::new();
/// store.add("foo", CallbackRecord::from_fn(|c| c.get("bar"))).unwrap();
/// store.add("bar", CallbackRecord::from_fn(|c| c.get("foo"))).unwrap();
///
/// let container = TrackedContainer::new(Container::new(store));
/// let err = container.get("foo").unwrap_err();
///
/// assert!(matches!(err, DiError::CircularReference { .. }));
/// assert!(err.to_string().contains("foo->bar->foo"));
/// ```
#[derive(Clone, Debug)]
pub struct TrackedContainer<L> {
    inner: L,
}

impl<L: Lookup> TrackedContainer<L> {
    /// Wrap `inner` with call-stack tracking
    #[inline]
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    /// The wrapped container
    #[inline]
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Unwrap the decorated container
    #[inline]
    pub fn into_inner(self) -> L {
        self.inner
    }

    /// Open a resolution session with an empty call stack.
    ///
    /// Lookups made through the same session share its stack; `get` opens
    /// a new session for every call.
    pub fn session(&self) -> Resolution<'_, L> {
        Resolution {
            id: SessionId::next(),
            inner: &self.inner,
            stack: RefCell::new(IndexSet::new()),
        }
    }
}

impl<L: Lookup> Resolver for TrackedContainer<L> {
    #[inline]
    fn get(&self, id: &str) -> Result<Value> {
        self.session().get(id)
    }

    #[inline]
    fn has(&self, id: &str) -> Result<bool> {
        self.inner.contains(id)
    }
}

impl<L: Lookup> Lookup for TrackedContainer<L> {
    /// Resolves through a fresh session; `outer` is replaced by the session.
    #[inline]
    fn lookup(&self, id: &str, _outer: &dyn Resolver) -> Result<Value> {
        self.get(id)
    }

    #[inline]
    fn contains(&self, id: &str) -> Result<bool> {
        self.inner.contains(id)
    }
}

/// One top-level resolution tree.
///
/// Holds the ordered set of identifiers currently being resolved. An entry
/// is pushed when a lookup starts and popped when it returns a value. When
/// a lookup fails, the stack as it stood at the failure is copied into the
/// error before the session unwinds.
pub struct Resolution<'a, L> {
    id: SessionId,
    inner: &'a L,
    stack: RefCell<IndexSet<String>>,
}

impl<L> Resolution<'_, L> {
    /// Session identifier
    #[inline]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Identifiers currently being resolved, outermost first
    pub fn call_stack(&self) -> Vec<String> {
        self.stack.borrow().iter().cloned().collect()
    }

    fn snapshot(&self) -> ResolutionPath {
        ResolutionPath::new(self.stack.borrow().iter().cloned())
    }
}

impl<L: Lookup> Resolver for Resolution<'_, L> {
    fn get(&self, id: &str) -> Result<Value> {
        let depth = {
            let mut stack = self.stack.borrow_mut();
            if stack.contains(id) {
                let path = ResolutionPath::new(
                    stack.iter().map(String::as_str).chain(std::iter::once(id)),
                );

                #[cfg(feature = "logging")]
                debug!(
                    target: "dependency_registry",
                    session = self.id.id(),
                    id = id,
                    path = %path,
                    "Circular reference detected"
                );

                return Err(DiError::circular(id, path));
            }
            stack.insert(id.to_owned());
            stack.len() - 1
        };

        #[cfg(feature = "logging")]
        trace!(
            target: "dependency_registry",
            session = self.id.id(),
            id = id,
            depth = depth,
            "Entering resolution"
        );

        let result = self
            .inner
            .lookup(id, self)
            .map_err(|err| err.with_path(|| self.snapshot()));

        // A record may recover from a failed lookup and continue, so unwind
        // to this frame on both paths.
        self.stack.borrow_mut().truncate(depth);
        result
    }

    #[inline]
    fn has(&self, id: &str) -> Result<bool> {
        self.inner.contains(id)
    }
}

impl<L> std::fmt::Debug for Resolution<'_, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("id", &self.id)
            .field("stack", &self.stack.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{CompositeContainer, Container, ResolverExt, SharedResolver};
    use crate::record::{CallbackRecord, InstanceRecord, ValueRecord};
    use crate::storage::RecordStore;
    use std::sync::Arc;

    fn forward(to: &'static str) -> CallbackRecord {
        CallbackRecord::from_fn(move |c| c.get(to))
    }

    #[test]
    fn test_resolves_like_inner() {
        let store = RecordStore::new();
        store.add("name", ValueRecord::new("demo")).unwrap();
        store.add("alias", forward("name")).unwrap();

        let container = TrackedContainer::new(Container::new(store));
        assert_eq!(*container.get_as::<&str>("alias").unwrap(), "demo");
        assert!(container.has("alias").unwrap());
        assert!(!container.has("missing").unwrap());
    }

    #[test]
    fn test_circular_reference_path() {
        let store = RecordStore::new();
        store.add("foo", forward("bar")).unwrap();
        store.add("bar", forward("foo")).unwrap();

        let container = TrackedContainer::new(Container::new(store));
        let err = container.get("foo").unwrap_err();

        match &err {
            DiError::CircularReference { id, path } => {
                assert_eq!(id, "foo");
                assert_eq!(path.ids(), ["foo", "bar", "foo"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("foo->bar->foo"));
    }

    #[test]
    fn test_self_reference() {
        let store = RecordStore::new();
        store
            .add("me", InstanceRecord::new(["me"], |_| Ok(())))
            .unwrap();

        let container = TrackedContainer::new(Container::new(store));
        let err = container.get("me").unwrap_err();
        assert!(err.to_string().contains("me->me"));
    }

    #[test]
    fn test_not_found_path() {
        let store = RecordStore::new();
        store.add("foo", forward("bar")).unwrap();
        store.add("bar", forward("undefined")).unwrap();

        let container = TrackedContainer::new(Container::new(store));
        let err = container.get("foo").unwrap_err();

        assert!(matches!(err, DiError::NotFound { ref id, .. } if id == "undefined"));
        assert!(err.to_string().contains("foo->bar->undefined"));
    }

    #[test]
    fn test_top_level_not_found_path() {
        let container = TrackedContainer::new(Container::new(RecordStore::new()));
        let err = container.get("missing").unwrap_err();
        assert_eq!(err.path().unwrap().ids(), ["missing"]);
    }

    #[test]
    fn test_independent_calls_do_not_share_stack() {
        let store = RecordStore::new();
        store.add("a", forward("b")).unwrap();
        store.add("b", ValueRecord::new(1u8)).unwrap();

        let container = TrackedContainer::new(Container::new(store));
        assert!(container.get("a").is_ok());
        // A second root call for the same id is not a cycle
        assert!(container.get("a").is_ok());
        assert!(container.get("b").is_ok());
    }

    #[test]
    fn test_diamond_is_not_circular() {
        let store = RecordStore::new();
        store.add("base", ValueRecord::new(1u32)).unwrap();
        store.add("left", forward("base")).unwrap();
        store.add("right", forward("base")).unwrap();
        store
            .add(
                "top",
                InstanceRecord::new(["left", "right"], |args| {
                    Ok(*args.arg::<u32>(0)? + *args.arg::<u32>(1)?)
                }),
            )
            .unwrap();

        let container = TrackedContainer::new(Container::new(store));
        assert_eq!(*container.get_as::<u32>("top").unwrap(), 2);
    }

    #[test]
    fn test_recovered_failure_unwinds_stack() {
        let store = RecordStore::new();
        store.add("fallback", ValueRecord::new("default")).unwrap();
        store
            .add(
                "setting",
                CallbackRecord::from_fn(|c| match c.try_get("optional")? {
                    Some(value) => Ok(value),
                    None => c.get("fallback"),
                }),
            )
            .unwrap();

        let container = TrackedContainer::new(Container::new(store));
        assert_eq!(*container.get_as::<&str>("setting").unwrap(), "default");
    }

    #[test]
    fn test_session_stack_during_resolution() {
        let store = RecordStore::new();
        store.add("leaf", ValueRecord::new(0u8)).unwrap();
        let container = TrackedContainer::new(Container::new(store));

        let session = container.session();
        assert!(session.call_stack().is_empty());
        session.get("leaf").unwrap();
        assert!(session.call_stack().is_empty());
        assert_ne!(session.id(), container.session().id());
    }

    #[test]
    fn test_tracked_composite_sub_container_path() {
        let sub = RecordStore::new();
        sub.add("url", ValueRecord::new("postgres://localhost")).unwrap();

        let store = RecordStore::new();
        store.add("service", forward("db.missing")).unwrap();

        let composite = CompositeContainer::new(
            store,
            [("db", Arc::new(Container::new(sub)) as SharedResolver)],
            '.',
        )
        .unwrap();
        let container = TrackedContainer::new(composite);

        let err = container.get("service").unwrap_err();
        assert!(matches!(err, DiError::NotFoundInSubContainer { .. }));
        assert!(err.to_string().contains("service->db.missing"));
    }

    #[test]
    fn test_shared_across_threads() {
        let store = RecordStore::new();
        store.add("a", forward("b")).unwrap();
        store.add("b", ValueRecord::new(7u64)).unwrap();
        let container = Arc::new(TrackedContainer::new(Container::new(store)));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let container = Arc::clone(&container);
                std::thread::spawn(move || *container.get_as::<u64>("a").unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 7);
        }
    }
}
