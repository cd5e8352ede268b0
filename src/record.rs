//! Record types producing container values
//!
//! A record is the strategy behind one identifier. The container asks the
//! record for its value and hands over itself, so the record can resolve
//! its own dependencies through the same (possibly tracked) container.
//!
//! Memoizing records keep their result in a `OnceCell`. Presence of a
//! value, not its content, decides whether the record is resolved, so a
//! cached `false`, `0` or empty string is never recomputed.

use crate::container::Resolver;
use crate::value::{Arguments, Injectable, Value, erase};
use crate::{DiError, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Strategy producing the value for a single identifier
pub trait Record: Send + Sync {
    /// Produce the value, resolving dependencies through `container`
    fn value(&self, container: &dyn Resolver) -> Result<Value>;

    /// Check if a memoizing record already holds its value
    fn is_resolved(&self) -> bool {
        true
    }
}

/// Shared handle to a record
pub type SharedRecord = Arc<dyn Record>;

/// Return the cached value or compute and cache it.
///
/// The computation runs outside the cell, so re-entering the same record
/// never blocks on the cell; cycles are left to `TrackedContainer` to
/// report. If two computations race, the first stored value wins.
#[inline]
fn memoize<F>(cell: &OnceCell<Value>, type_name: &'static str, compute: F) -> Result<Value>
where
    F: FnOnce() -> Result<Value>,
{
    if let Some(value) = cell.get() {
        #[cfg(feature = "logging")]
        trace!(
            target: "dependency_registry",
            record = type_name,
            "Record already resolved, returning cached value"
        );
        return Ok(Arc::clone(value));
    }

    #[cfg(feature = "logging")]
    debug!(
        target: "dependency_registry",
        record = type_name,
        "Resolving record on first access"
    );
    #[cfg(not(feature = "logging"))]
    let _ = type_name;

    let value = compute()?;
    Ok(Arc::clone(cell.get_or_init(|| value)))
}

/// Resolve each identifier through `container`.
fn resolve_all(container: &dyn Resolver, ids: &[String]) -> Result<Arguments> {
    let mut args = Arguments::with_capacity(ids.len());
    for id in ids {
        args.push(id.as_str(), container.get(id)?);
    }
    Ok(args)
}

fn collect_ids<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter().map(Into::into).collect()
}

// =============================================================================
// Value Record
// =============================================================================

/// Record holding a pre-built value, returned unchanged on every call.
pub struct ValueRecord {
    value: Value,
}

impl ValueRecord {
    /// Create from a concrete value
    #[inline]
    pub fn new<T: Injectable>(value: T) -> Self {
        Self {
            value: erase(value),
        }
    }

    /// Create from an already erased value
    #[inline]
    pub fn from_value(value: Value) -> Self {
        Self { value }
    }
}

impl Record for ValueRecord {
    #[inline]
    fn value(&self, _container: &dyn Resolver) -> Result<Value> {
        Ok(Arc::clone(&self.value))
    }
}

// =============================================================================
// Callback Record
// =============================================================================

/// Type-erased callback
type CallbackFn = Box<dyn Fn(&dyn Resolver) -> Result<Value> + Send + Sync>;

/// Record invoking a callback once and caching its result.
///
/// # Examples
///
/// ```rust
/// use dependency_registry::{CallbackRecord, Container, RecordStore, ResolverExt, ValueRecord};
///
/// let store = RecordStore::new();
/// store.add("port", ValueRecord::new(8080u16)).unwrap();
/// store.add("url", CallbackRecord::new(|c| {
///     let port = c.get_as::<u16>("port")?;
///     Ok(format!("http://localhost:{port}"))
/// })).unwrap();
///
/// let container = Container::new(store);
/// assert_eq!(*container.get_as::<String>("url").unwrap(), "http://localhost:8080");
/// ```
pub struct CallbackRecord {
    callback: CallbackFn,
    cache: OnceCell<Value>,
    type_name: &'static str,
}

impl CallbackRecord {
    /// Create from a callback producing a concrete value
    pub fn new<T: Injectable, F>(callback: F) -> Self
    where
        F: Fn(&dyn Resolver) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(move |container| callback(container).map(erase)),
            cache: OnceCell::new(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Create from a callback producing an erased value.
    ///
    /// Use this when the callback forwards another record's value, so the
    /// result is not wrapped a second time.
    pub fn from_fn<F>(callback: F) -> Self
    where
        F: Fn(&dyn Resolver) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
            cache: OnceCell::new(),
            type_name: "callback",
        }
    }
}

impl Record for CallbackRecord {
    fn value(&self, container: &dyn Resolver) -> Result<Value> {
        memoize(&self.cache, self.type_name, || (self.callback)(container))
    }

    fn is_resolved(&self) -> bool {
        self.cache.get().is_some()
    }
}

// =============================================================================
// Instance Record
// =============================================================================

/// Factory building an instance from resolved arguments
type BuildFn = Arc<dyn Fn(&Arguments) -> Result<Value> + Send + Sync>;

fn build_fn<T: Injectable, F>(build: F) -> BuildFn
where
    F: Fn(&Arguments) -> Result<T> + Send + Sync + 'static,
{
    Arc::new(move |args| build(args).map(erase))
}

/// Record constructing an instance from dependency identifiers.
///
/// The dependencies are resolved in order and passed to the registered
/// factory function. The instance is cached after the first build.
pub struct InstanceRecord {
    dependencies: Vec<String>,
    build: BuildFn,
    instance: OnceCell<Value>,
    type_name: &'static str,
}

impl InstanceRecord {
    /// Create a record building a `T` from the given dependencies
    pub fn new<T: Injectable, I, S, F>(dependencies: I, build: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Arguments) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            dependencies: collect_ids(dependencies),
            build: build_fn(build),
            instance: OnceCell::new(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Dependency identifiers in argument order
    #[inline]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

impl Record for InstanceRecord {
    fn value(&self, container: &dyn Resolver) -> Result<Value> {
        memoize(&self.instance, self.type_name, || {
            let args = resolve_all(container, &self.dependencies)?;
            (self.build)(&args)
        })
    }

    fn is_resolved(&self) -> bool {
        self.instance.get().is_some()
    }
}

// =============================================================================
// Product Record
// =============================================================================

/// Method invoked on a resolved factory object
type InvokeFn = Box<dyn Fn(&str, Value, &Arguments) -> Result<Value> + Send + Sync>;

/// Record calling a method on a factory object held by the container.
///
/// The factory is resolved by identifier and downcast to its registered
/// type before the method closure runs.
///
/// # Examples
///
/// ```rust
/// use dependency_registry::{Container, ProductRecord, RecordStore, ResolverExt, ValueRecord};
///
/// struct Pool { size: usize }
/// impl Pool {
///     fn connection(&self, name: &str) -> String {
///         format!("{name}/{}", self.size)
///     }
/// }
///
/// let store = RecordStore::new();
/// store.add("pool", ValueRecord::new(Pool { size: 4 })).unwrap();
/// store.add("name", ValueRecord::new(String::from("primary"))).unwrap();
/// store.add("conn", ProductRecord::new("pool", "connection", ["name"], |pool: &Pool, args| {
///     Ok(pool.connection(&args.arg::<String>(0)?))
/// })).unwrap();
///
/// let container = Container::new(store);
/// assert_eq!(*container.get_as::<String>("conn").unwrap(), "primary/4");
/// ```
pub struct ProductRecord {
    factory: String,
    method: String,
    arguments: Vec<String>,
    invoke: InvokeFn,
    product: OnceCell<Value>,
    type_name: &'static str,
}

impl ProductRecord {
    /// Create a record invoking `method` on the `F` stored under `factory`
    pub fn new<F, T, I, S, M>(
        factory: impl Into<String>,
        method: impl Into<String>,
        arguments: I,
        invoke: M,
    ) -> Self
    where
        F: Injectable,
        T: Injectable,
        I: IntoIterator<Item = S>,
        S: Into<String>,
        M: Fn(&F, &Arguments) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            factory: factory.into(),
            method: method.into(),
            arguments: collect_ids(arguments),
            invoke: Box::new(move |factory_id, factory, args| {
                let factory = crate::value::downcast::<F>(factory_id, factory)?;
                invoke(&factory, args).map(erase)
            }),
            product: OnceCell::new(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Identifier of the factory object
    #[inline]
    pub fn factory(&self) -> &str {
        &self.factory
    }

    /// Name of the invoked method
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl Record for ProductRecord {
    fn value(&self, container: &dyn Resolver) -> Result<Value> {
        memoize(&self.product, self.type_name, || {
            let factory = container.get(&self.factory)?;
            let args = resolve_all(container, &self.arguments)?;

            #[cfg(feature = "logging")]
            trace!(
                target: "dependency_registry",
                factory = %self.factory,
                method = %self.method,
                "Invoking factory method"
            );

            (self.invoke)(&self.factory, factory, &args)
        })
    }

    fn is_resolved(&self) -> bool {
        self.product.get().is_some()
    }
}

// =============================================================================
// Composed Instance Record
// =============================================================================

/// One argument slot of a [`ComposedInstanceRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// Resolve this identifier through the container
    Id(String),
    /// Fill with the wrapped record's own value
    Wrapped,
}

impl From<&str> for Dependency {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

impl From<String> for Dependency {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

/// Label used for the wrapped slot in argument diagnostics
const WRAPPED_LABEL: &str = "<wrapped>";

/// Record building an instance around another record's value.
///
/// Enables decorator chains: the record previously registered under an
/// identifier is embedded here, and its value fills the
/// [`Dependency::Wrapped`] slot instead of a container lookup.
pub struct ComposedInstanceRecord {
    wrapped: SharedRecord,
    dependencies: Vec<Dependency>,
    build: BuildFn,
    instance: OnceCell<Value>,
    type_name: &'static str,
}

impl ComposedInstanceRecord {
    /// Create a record building a `T` around `wrapped`
    pub fn new<T: Injectable, I, D, F>(wrapped: SharedRecord, dependencies: I, build: F) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Dependency>,
        F: Fn(&Arguments) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            wrapped,
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            build: build_fn(build),
            instance: OnceCell::new(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The embedded record
    #[inline]
    pub fn wrapped(&self) -> &SharedRecord {
        &self.wrapped
    }
}

impl Record for ComposedInstanceRecord {
    fn value(&self, container: &dyn Resolver) -> Result<Value> {
        memoize(&self.instance, self.type_name, || {
            let mut args = Arguments::with_capacity(self.dependencies.len());
            for dependency in &self.dependencies {
                match dependency {
                    Dependency::Id(id) => args.push(id.as_str(), container.get(id)?),
                    Dependency::Wrapped => {
                        args.push(WRAPPED_LABEL, self.wrapped.value(container)?)
                    }
                }
            }
            (self.build)(&args)
        })
    }

    fn is_resolved(&self) -> bool {
        self.instance.get().is_some()
    }
}

impl std::fmt::Debug for dyn Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Fail a build with a message naming the produced type.
///
/// Convenience for factory closures that validate their arguments.
#[inline]
pub fn build_error<T: Injectable>(reason: impl Into<String>) -> DiError {
    DiError::creation_failed::<T>(reason)
}
