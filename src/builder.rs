//! Container setup
//!
//! [`ContainerBuilder`] assembles a record store and its sub-containers and
//! turns them into a [`CompositeContainer`]. All mutation goes through
//! `&mut self`, so the two steps of a decoration (moving the original record
//! to an alias, registering the decorator) can never be observed half done.

use crate::container::{CompositeContainer, Resolver, SharedResolver};
use crate::identifier::{self, DEFAULT_SEPARATOR};
use crate::record::{CallbackRecord, Record, SharedRecord, ValueRecord};
use crate::storage::RecordStore;
use crate::tracked::TrackedContainer;
use crate::value::Injectable;
use crate::{DiError, Result};
use ahash::RandomState;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

/// Options for building a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Separator between a sub-container prefix and the rest of an identifier
    pub separator: char,
    /// Reject identifiers claimed by both a record and a sub-container
    pub strict: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            strict: true,
        }
    }
}

/// Builder for record stores and composite containers.
///
/// # Examples
///
/// ```rust
/// use dependency_registry::{ContainerBuilder, InstanceRecord, ResolverExt};
///
/// let mut builder = ContainerBuilder::new();
/// builder
///     .value("greeting", String::from("Hello"))?
///     .lazy("name", |_| Ok(String::from("World")))?;
///
/// // Decorate "greeting" with a record that depends on the original
/// builder.decorate("greeting", |previous| {
///     InstanceRecord::new([previous, "name"], |args| {
///         Ok(format!("{}, {}!", args.arg::<String>(0)?, args.arg::<String>(1)?))
///     })
/// })?;
///
/// let container = builder.build()?;
/// assert_eq!(*container.get_as::<String>("greeting")?, "Hello, World!");
/// # Ok::<(), dependency_registry::DiError>(())
/// ```
pub struct ContainerBuilder {
    store: RecordStore,
    containers: HashMap<String, SharedResolver, RandomState>,
    config: ContainerConfig,
}

impl ContainerBuilder {
    /// Create a builder with the default configuration
    #[inline]
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Create a builder with an explicit configuration
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            store: RecordStore::new(),
            containers: HashMap::default(),
            config,
        }
    }

    /// The active configuration
    #[inline]
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Check if a record or sub-container is registered under `id`
    pub fn contains(&self, id: &str) -> bool {
        self.store.has(id) || self.containers.contains_key(id)
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Register a record, failing if `id` is taken.
    pub fn add(
        &mut self,
        id: impl Into<String>,
        record: impl Record + 'static,
    ) -> Result<&mut Self> {
        self.add_shared(id, Arc::new(record))
    }

    /// Register a shared record, failing if `id` is taken.
    pub fn add_shared(
        &mut self,
        id: impl Into<String>,
        record: SharedRecord,
    ) -> Result<&mut Self> {
        let id = id.into();
        self.check_record_slot(&id)?;
        self.store.add_shared(id, record)?;
        Ok(self)
    }

    /// Register a record, replacing whatever was under `id`.
    pub fn replace(
        &mut self,
        id: impl Into<String>,
        record: impl Record + 'static,
    ) -> Result<&mut Self> {
        let id = id.into();
        self.check_record_slot(&id)?;
        self.store.replace(id, record)?;
        Ok(self)
    }

    /// Register a plain value
    pub fn value<T: Injectable>(&mut self, id: impl Into<String>, value: T) -> Result<&mut Self> {
        self.add(id, ValueRecord::new(value))
    }

    /// Register a callback evaluated once, on first access
    pub fn lazy<T: Injectable, F>(
        &mut self,
        id: impl Into<String>,
        callback: F,
    ) -> Result<&mut Self>
    where
        F: Fn(&dyn Resolver) -> Result<T> + Send + Sync + 'static,
    {
        self.add(id, CallbackRecord::new(callback))
    }

    /// Replace the record under `id` with one that depends on it.
    ///
    /// The existing record moves to a fresh alias, which is handed to
    /// `decorator`; the returned record takes over `id`. Fails with
    /// `NotFound` if nothing is registered under `id`.
    pub fn decorate<R, F>(&mut self, id: &str, decorator: F) -> Result<&mut Self>
    where
        R: Record + 'static,
        F: FnOnce(&str) -> R,
    {
        if !self.store.has(id) {
            return Err(DiError::not_found(id));
        }

        let alias = self.store.move_record(id)?;
        let record = decorator(&alias);
        if let Err(err) = self.store.add(id, record) {
            // Put the original back under its own id
            if let Some(original) = self.store.remove(&alias) {
                self.store.replace_shared(id, original)?;
            }
            return Err(err);
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_registry",
            id = id,
            alias = %alias,
            "Decorated record"
        );

        Ok(self)
    }

    /// Replace the record under `id` with one embedding it.
    ///
    /// Unlike [`decorate`](Self::decorate) the original record gets no
    /// alias; `wrapper` receives it directly, typically to build a
    /// [`ComposedInstanceRecord`](crate::ComposedInstanceRecord).
    pub fn wrap<R, F>(&mut self, id: &str, wrapper: F) -> Result<&mut Self>
    where
        R: Record + 'static,
        F: FnOnce(SharedRecord) -> R,
    {
        let previous = self.store.record(id).ok_or_else(|| DiError::not_found(id))?;
        self.store.replace(id, wrapper(previous))?;

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_registry",
            id = id,
            "Wrapped record"
        );

        Ok(self)
    }

    // =========================================================================
    // Sub-containers
    // =========================================================================

    /// Mount a sub-container under `id`.
    ///
    /// Identifiers starting with `id` and the separator are delegated to it.
    pub fn mount(&mut self, id: impl Into<String>, container: SharedResolver) -> Result<&mut Self> {
        let id = id.into();
        identifier::validate_prefix(&id, self.config.separator)?;
        if self.containers.contains_key(&id) {
            return Err(DiError::already_defined(id));
        }
        if self.config.strict && self.store.has(&id) {
            return Err(DiError::already_defined(id));
        }

        self.containers.insert(id, container);
        Ok(self)
    }

    /// Mount several sub-containers
    pub fn mount_all<I, S>(&mut self, containers: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (S, SharedResolver)>,
        S: Into<String>,
    {
        for (id, container) in containers {
            self.mount(id, container)?;
        }
        Ok(self)
    }

    // =========================================================================
    // Finishing
    // =========================================================================

    /// Build a composite container
    pub fn build(self) -> Result<CompositeContainer> {
        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_registry",
            record_count = self.store.len(),
            container_count = self.containers.len(),
            strict = self.config.strict,
            "Building container"
        );

        CompositeContainer::new(self.store, self.containers, self.config.separator)
    }

    /// Build a composite container with circular-reference detection
    pub fn build_tracked(self) -> Result<TrackedContainer<CompositeContainer>> {
        self.build().map(TrackedContainer::new)
    }

    /// Give up on containers and return the bare record store
    pub fn into_store(self) -> RecordStore {
        self.store
    }

    /// In strict mode a record may not take an id claimed by a sub-container.
    fn check_record_slot(&self, id: &str) -> Result<()> {
        if self.config.strict && self.containers.contains_key(id) {
            return Err(DiError::already_defined(id));
        }
        Ok(())
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("records", &self.store.len())
            .field("containers", &self.containers.len())
            .field("config", &self.config)
            .finish()
    }
}
