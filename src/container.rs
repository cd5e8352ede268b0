//! Identifier-keyed containers
//!
//! A container resolves identifiers against a [`RecordStore`]. Every record
//! receives the *outermost* resolver of the current lookup, so dependencies
//! of dependencies are resolved (and, under a [`TrackedContainer`], observed)
//! through the same object the caller talks to.
//!
//! [`TrackedContainer`]: crate::TrackedContainer

use crate::identifier::{self, DEFAULT_SEPARATOR};
use crate::storage::RecordStore;
use crate::value::{self, Injectable, Value};
use crate::{DiError, Result};
use ahash::RandomState;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

// =============================================================================
// Contracts
// =============================================================================

/// Read-only resolver mapping identifiers to values.
///
/// This is the contract records depend on and the contract sub-containers
/// must implement to be mounted in a [`CompositeContainer`].
pub trait Resolver {
    /// Resolve `id` to a value.
    ///
    /// Fails with `NotFound` if nothing claims the identifier.
    fn get(&self, id: &str) -> Result<Value>;

    /// Check if `id` can be resolved. Never evaluates a record.
    ///
    /// Returns `Ok(false)` for missing identifiers and fails only for
    /// identifiers that are structurally invalid.
    fn has(&self, id: &str) -> Result<bool>;
}

/// A resolver that can be shared and mounted as a sub-container
pub type SharedResolver = Arc<dyn Resolver + Send + Sync>;

/// Typed helpers available on every resolver
pub trait ResolverExt: Resolver {
    /// Resolve `id` and downcast the value to `T`.
    ///
    /// Fails with `InvalidType` if the value is not a `T`.
    fn get_as<T: Injectable>(&self, id: &str) -> Result<Arc<T>> {
        value::downcast(id, self.get(id)?)
    }

    /// Resolve `id`, returning `None` if it is not defined.
    ///
    /// Errors other than not-found still propagate.
    fn try_get(&self, id: &str) -> Result<Option<Value>> {
        match self.get(id) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl<R: Resolver + ?Sized> ResolverExt for R {}

/// Resolution against an explicit outermost resolver.
///
/// Containers implement this so decorators such as
/// [`TrackedContainer`](crate::TrackedContainer) can substitute themselves
/// as the resolver records receive.
pub trait Lookup: Send + Sync {
    /// Resolve `id`, passing `outer` to the record that produces it
    fn lookup(&self, id: &str, outer: &dyn Resolver) -> Result<Value>;

    /// Check if `id` can be resolved without evaluating anything
    fn contains(&self, id: &str) -> Result<bool>;
}

// =============================================================================
// Container
// =============================================================================

/// Container over a single record store.
///
/// # Examples
///
/// ```rust
/// use dependency_registry::{CallbackRecord, Container, RecordStore, ResolverExt, ValueRecord};
///
/// let store = RecordStore::new();
/// store.add("test", ValueRecord::new("Hello")).unwrap();
/// store.add("lazy", CallbackRecord::new(|_| Ok("World"))).unwrap();
///
/// let container = Container::new(store);
/// assert_eq!(*container.get_as::<&str>("test").unwrap(), "Hello");
/// assert_eq!(*container.get_as::<&str>("lazy").unwrap(), "World");
/// ```
#[derive(Clone)]
pub struct Container {
    store: Arc<RecordStore>,
}

impl Container {
    /// Create a container over `store`
    #[inline]
    pub fn new(store: RecordStore) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Create a container over a shared store
    #[inline]
    pub fn from_shared(store: Arc<RecordStore>) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_registry",
            record_count = store.len(),
            "Creating container"
        );

        Self { store }
    }

    /// The underlying store
    #[inline]
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }
}

impl Lookup for Container {
    fn lookup(&self, id: &str, outer: &dyn Resolver) -> Result<Value> {
        identifier::validate(id)?;
        self.store.get(id, outer)
    }

    fn contains(&self, id: &str) -> Result<bool> {
        identifier::validate(id)?;
        Ok(self.store.has(id))
    }
}

impl Resolver for Container {
    #[inline]
    fn get(&self, id: &str) -> Result<Value> {
        self.lookup(id, self)
    }

    #[inline]
    fn has(&self, id: &str) -> Result<bool> {
        self.contains(id)
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("records", &self.store.len())
            .finish()
    }
}

// =============================================================================
// Composite Container
// =============================================================================

/// Container delegating prefixed identifiers to mounted sub-containers.
///
/// `get("db.connection")` asks the sub-container mounted as `db` for
/// `connection`; `get("db")` returns the sub-container itself as a
/// [`SharedResolver`] value. Identifiers whose head segment is not a mounted
/// prefix are resolved, unsplit, against the local store. Mounted prefixes
/// shadow local records with the same name.
///
/// # Examples
///
/// ```rust
/// use dependency_registry::{
///     CompositeContainer, Container, RecordStore, Resolver, ResolverExt, ValueRecord,
/// };
/// use std::sync::Arc;
///
/// let db = RecordStore::new();
/// db.add("url", ValueRecord::new("postgres://localhost")).unwrap();
///
/// let app = CompositeContainer::builder(RecordStore::new())
///     .mount("db", Arc::new(Container::new(db)))
///     .unwrap()
///     .build();
///
/// assert_eq!(*app.get_as::<&str>("db.url").unwrap(), "postgres://localhost");
/// assert!(app.has("db").unwrap());
/// assert!(!app.has("db.missing").unwrap());
/// ```
#[derive(Clone)]
pub struct CompositeContainer {
    store: Arc<RecordStore>,
    containers: Arc<HashMap<String, SharedResolver, RandomState>>,
    separator: char,
}

impl CompositeContainer {
    /// Create a composite container.
    ///
    /// Fails with `InvalidIdentifier` if a sub-container id is invalid or
    /// contains `separator`.
    pub fn new<I, S>(store: RecordStore, containers: I, separator: char) -> Result<Self>
    where
        I: IntoIterator<Item = (S, SharedResolver)>,
        S: Into<String>,
    {
        let mut builder = CompositeBuilder {
            store,
            containers: HashMap::default(),
            separator,
        };
        for (id, container) in containers {
            builder = builder.mount(id, container)?;
        }
        Ok(builder.build())
    }

    /// Start building a composite container with the default separator
    #[inline]
    pub fn builder(store: RecordStore) -> CompositeBuilder {
        CompositeBuilder {
            store,
            containers: HashMap::default(),
            separator: DEFAULT_SEPARATOR,
        }
    }

    /// The sub-container mounted as `id`
    #[inline]
    pub fn container(&self, id: &str) -> Option<&SharedResolver> {
        self.containers.get(id)
    }

    /// Identifiers of all mounted sub-containers (unordered)
    pub fn containers(&self) -> Vec<&str> {
        self.containers.keys().map(String::as_str).collect()
    }

    /// Separator between a prefix and the rest of an identifier
    #[inline]
    pub fn separator(&self) -> char {
        self.separator
    }

    /// The local record store
    #[inline]
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Resolve `rest` in the sub-container mounted as `prefix`.
    fn delegate(&self, prefix: &str, sub: &SharedResolver, rest: &str) -> Result<Value> {
        #[cfg(feature = "logging")]
        trace!(
            target: "dependency_registry",
            container = prefix,
            id = rest,
            "Delegating to sub-container"
        );

        sub.get(rest).map_err(|err| {
            if err.is_not_found() {
                #[cfg(feature = "logging")]
                debug!(
                    target: "dependency_registry",
                    container = prefix,
                    id = rest,
                    "Identifier not found in sub-container"
                );
                DiError::not_found_in(prefix, rest, err)
            } else {
                err
            }
        })
    }
}

impl Lookup for CompositeContainer {
    fn lookup(&self, id: &str, outer: &dyn Resolver) -> Result<Value> {
        identifier::validate(id)?;

        let (head, rest) = identifier::split(id, self.separator);
        if let Some(sub) = self.containers.get(head) {
            return match rest {
                None => Ok(Arc::new(Arc::clone(sub)) as Value),
                Some(rest) => self.delegate(head, sub, rest),
            };
        }

        self.store.get(id, outer)
    }

    fn contains(&self, id: &str) -> Result<bool> {
        identifier::validate(id)?;

        let (head, rest) = identifier::split(id, self.separator);
        if let Some(sub) = self.containers.get(head) {
            return match rest {
                None => Ok(true),
                Some(rest) => sub.has(rest),
            };
        }

        Ok(self.store.has(id))
    }
}

impl Resolver for CompositeContainer {
    #[inline]
    fn get(&self, id: &str) -> Result<Value> {
        self.lookup(id, self)
    }

    #[inline]
    fn has(&self, id: &str) -> Result<bool> {
        self.contains(id)
    }
}

impl std::fmt::Debug for CompositeContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeContainer")
            .field("records", &self.store.len())
            .field("containers", &self.containers())
            .field("separator", &self.separator)
            .finish()
    }
}

/// Builder mounting sub-containers onto a [`CompositeContainer`]
pub struct CompositeBuilder {
    store: RecordStore,
    containers: HashMap<String, SharedResolver, RandomState>,
    separator: char,
}

impl CompositeBuilder {
    /// Use a different separator
    #[inline]
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Mount a sub-container under `id`.
    ///
    /// The separator is checked here, so set it first.
    pub fn mount(mut self, id: impl Into<String>, container: SharedResolver) -> Result<Self> {
        let id = id.into();
        identifier::validate_prefix(&id, self.separator)?;
        if self.containers.contains_key(&id) {
            return Err(DiError::already_defined(id));
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_registry",
            container = %id,
            "Mounting sub-container"
        );

        self.containers.insert(id, container);
        Ok(self)
    }

    /// Finish building
    pub fn build(self) -> CompositeContainer {
        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_registry",
            record_count = self.store.len(),
            container_count = self.containers.len(),
            separator = %self.separator,
            "Creating composite container"
        );

        CompositeContainer {
            store: Arc::new(self.store),
            containers: Arc::new(self.containers),
            separator: self.separator,
        }
    }
}

impl std::fmt::Debug for CompositeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut containers: Vec<&str> = self.containers.keys().map(String::as_str).collect();
        containers.sort_unstable();

        f.debug_struct("CompositeBuilder")
            .field("records", &self.store.len())
            .field("containers", &containers)
            .field("separator", &self.separator)
            .finish()
    }
}
