//! Type-erased container values
//!
//! Records produce [`Value`]s: shared, type-erased handles that callers
//! downcast back to concrete types.

use crate::{DiError, Result};
use std::any::Any;
use std::sync::Arc;

/// A resolved container value.
///
/// Cloning a `Value` clones the `Arc`, never the underlying data, so two
/// resolutions of a memoized record compare equal with [`Arc::ptr_eq`].
pub type Value = Arc<dyn Any + Send + Sync>;

/// Marker trait for types that can be stored in a container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// Erase a concrete value into a [`Value`].
#[inline]
pub fn erase<T: Injectable>(value: T) -> Value {
    Arc::new(value) as Value
}

/// Downcast a [`Value`] resolved for `id` to `Arc<T>`.
///
/// Fails with `InvalidType` when the value holds something else.
#[inline]
pub fn downcast<T: Injectable>(id: &str, value: Value) -> Result<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| DiError::invalid_type::<T>(id))
}

/// Resolved dependency values handed to a factory function.
///
/// Each value remembers the identifier it was resolved from so type
/// mismatches can name the offending dependency.
#[derive(Clone, Default)]
pub struct Arguments {
    labels: Vec<String>,
    values: Vec<Value>,
}

impl Arguments {
    /// Create an empty argument list
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with room for `capacity` arguments
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            labels: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Append a value resolved from `label`
    #[inline]
    pub fn push(&mut self, label: impl Into<String>, value: Value) {
        self.labels.push(label.into());
        self.values.push(value);
    }

    /// Number of arguments
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no arguments
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value at `index`
    #[inline]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Identifier the value at `index` was resolved from
    #[inline]
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Typed value at `index`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dependency_registry::{Arguments, erase};
    ///
    /// let mut args = Arguments::new();
    /// args.push("port", erase(8080u16));
    ///
    /// assert_eq!(*args.arg::<u16>(0).unwrap(), 8080);
    /// assert!(args.arg::<String>(0).is_err());
    /// assert!(args.arg::<u16>(1).is_err());
    /// ```
    pub fn arg<T: Injectable>(&self, index: usize) -> Result<Arc<T>> {
        let value = self.values.get(index).ok_or_else(|| {
            DiError::creation_failed::<T>(format!(
                "missing argument {index} (only {} supplied)",
                self.values.len()
            ))
        })?;
        downcast(&self.labels[index], Arc::clone(value))
    }

    /// Iterate over the raw values
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

impl std::fmt::Debug for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arguments")
            .field("labels", &self.labels)
            .finish()
    }
}
