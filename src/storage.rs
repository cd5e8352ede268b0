//! Record storage
//!
//! Maps identifiers to records. Uses `DashMap` so containers can share a
//! store across threads without an outer lock.

use crate::container::Resolver;
use crate::identifier;
use crate::record::{Record, SharedRecord};
use crate::value::Value;
use crate::{DiError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Marker appended to an identifier to build the alias of a moved record.
pub const ALIAS_MARKER: &str = "#previous";

/// Flat mapping from identifier to record.
///
/// Records are stored behind `Arc` so a resolution never holds a map guard
/// while the record evaluates (and recursively looks up other records).
pub struct RecordStore {
    records: DashMap<String, SharedRecord, RandomState>,
}

impl RecordStore {
    /// Create new empty storage.
    ///
    /// Uses 8 shards: record stores are small and mostly read.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with pre-allocated capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        let shard_amount = if capacity <= 64 { 8 } else { 16 };
        Self {
            records: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount,
            ),
        }
    }

    /// Create from an initial mapping.
    ///
    /// Fails on the first invalid or duplicated identifier.
    pub fn from_records<I, S>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, SharedRecord)>,
        S: Into<String>,
    {
        let store = Self::new();
        for (id, record) in records {
            store.add_shared(id, record)?;
        }
        Ok(store)
    }

    /// Check if a record exists. Never evaluates the record.
    #[inline]
    pub fn has(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Add a record, failing if the identifier is taken.
    pub fn add(&self, id: impl Into<String>, record: impl Record + 'static) -> Result<()> {
        self.add_shared(id, Arc::new(record))
    }

    /// Add a shared record, failing if the identifier is taken.
    pub fn add_shared(&self, id: impl Into<String>, record: SharedRecord) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        let id = id.into();
        identifier::validate(&id)?;

        match self.records.entry(id) {
            Entry::Occupied(entry) => Err(DiError::already_defined(entry.key().as_str())),
            Entry::Vacant(entry) => {
                #[cfg(feature = "logging")]
                debug!(
                    target: "dependency_registry",
                    id = %entry.key(),
                    "Registering record"
                );
                entry.insert(record);
                Ok(())
            }
        }
    }

    /// Insert a record, overwriting any previous one.
    ///
    /// Returns the record that was replaced.
    pub fn replace(
        &self,
        id: impl Into<String>,
        record: impl Record + 'static,
    ) -> Result<Option<SharedRecord>> {
        self.replace_shared(id, Arc::new(record))
    }

    /// Insert a shared record, overwriting any previous one.
    pub fn replace_shared(
        &self,
        id: impl Into<String>,
        record: SharedRecord,
    ) -> Result<Option<SharedRecord>> {
        let id = id.into();
        identifier::validate(&id)?;

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_registry",
            id = %id,
            replaced = self.records.contains_key(&id),
            "Replacing record"
        );

        Ok(self.records.insert(id, record))
    }

    /// Resolve the record under `id`, handing it `container` for its dependencies.
    pub fn get(&self, id: &str, container: &dyn Resolver) -> Result<Value> {
        // Clone the handle out so the shard guard is released before evaluation.
        let record = self.record(id).ok_or_else(|| {
            #[cfg(feature = "logging")]
            debug!(
                target: "dependency_registry",
                id = id,
                "Record not found"
            );
            DiError::not_found(id)
        })?;

        #[cfg(feature = "logging")]
        trace!(
            target: "dependency_registry",
            id = id,
            resolved = record.is_resolved(),
            "Resolving record"
        );

        record.value(container)
    }

    /// Shared handle to the record under `id`
    #[inline]
    pub fn record(&self, id: &str) -> Option<SharedRecord> {
        self.records.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Move the record under `id` to a fresh alias and return the alias.
    ///
    /// The alias is `id` followed by [`ALIAS_MARKER`], repeated until no
    /// record holds it. Fails with `NotFound` if `id` is absent.
    pub fn move_record(&self, id: &str) -> Result<String> {
        let mut alias = format!("{id}{ALIAS_MARKER}");
        while self.records.contains_key(&alias) {
            alias.push_str(ALIAS_MARKER);
        }

        let (_, record) = self
            .records
            .remove(id)
            .ok_or_else(|| DiError::not_found(id))?;
        self.records.insert(alias.clone(), record);

        #[cfg(feature = "logging")]
        debug!(
            target: "dependency_registry",
            id = id,
            alias = %alias,
            "Moved record to alias"
        );

        Ok(alias)
    }

    /// Remove a record, returning it
    #[inline]
    pub fn remove(&self, id: &str) -> Option<SharedRecord> {
        self.records.remove(id).map(|(_, record)| record)
    }

    /// Get all registered identifiers (unordered)
    pub fn ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.key().clone()).collect()
    }

    /// Get number of registered records
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;
    use crate::record::{CallbackRecord, ValueRecord};

    #[test]
    fn test_store_add_and_get() {
        let store = RecordStore::new();
        store.add("answer", ValueRecord::new(42i32)).unwrap();

        let container = Container::new(RecordStore::new());
        let value = store.get("answer", &container).unwrap();
        assert_eq!(*value.downcast::<i32>().unwrap(), 42);
    }

    #[test]
    fn test_store_add_rejects_duplicate() {
        let store = RecordStore::new();
        store.add("answer", ValueRecord::new(42i32)).unwrap();

        let err = store.add("answer", ValueRecord::new(0i32)).unwrap_err();
        assert!(matches!(err, DiError::AlreadyDefined { ref id } if id == "answer"));

        // State unchanged after the failed add
        let container = Container::new(RecordStore::new());
        let value = store.get("answer", &container).unwrap();
        assert_eq!(*value.downcast::<i32>().unwrap(), 42);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_add_validates_identifier() {
        let store = RecordStore::new();
        assert!(matches!(
            store.add("", ValueRecord::new(1u8)),
            Err(DiError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            store.add("12", ValueRecord::new(1u8)),
            Err(DiError::InvalidIdentifier { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_get_missing() {
        let store = RecordStore::new();
        let container = Container::new(RecordStore::new());
        let err = store.get("missing", &container).unwrap_err();
        assert!(matches!(err, DiError::NotFound { ref id, .. } if id == "missing"));
    }

    #[test]
    fn test_store_has_does_not_evaluate() {
        let store = RecordStore::new();
        store
            .add("lazy", CallbackRecord::new(|_| Ok(String::from("World"))))
            .unwrap();

        assert!(store.has("lazy"));
        assert!(!store.has("other"));
        assert!(!store.record("lazy").unwrap().is_resolved());
    }

    #[test]
    fn test_store_replace() {
        let store = RecordStore::new();
        assert!(store.replace("x", ValueRecord::new(1u8)).unwrap().is_none());
        assert!(store.replace("x", ValueRecord::new(2u8)).unwrap().is_some());

        let container = Container::new(RecordStore::new());
        let value = store.get("x", &container).unwrap();
        assert_eq!(*value.downcast::<u8>().unwrap(), 2);
    }

    #[test]
    fn test_store_move() {
        let store = RecordStore::new();
        store.add("x", ValueRecord::new(1u8)).unwrap();

        let alias = store.move_record("x").unwrap();
        assert_eq!(alias, "x#previous");
        assert!(!store.has("x"));
        assert!(store.has(&alias));
    }

    #[test]
    fn test_store_move_skips_taken_alias() {
        let store = RecordStore::new();
        store.add("x", ValueRecord::new(1u8)).unwrap();
        store.add("x#previous", ValueRecord::new(2u8)).unwrap();

        let alias = store.move_record("x").unwrap();
        assert_eq!(alias, "x#previous#previous");
        assert_eq!(store.len(), 2);

        let container = Container::new(RecordStore::new());
        let moved = store.get(&alias, &container).unwrap();
        assert_eq!(*moved.downcast::<u8>().unwrap(), 1);
    }

    #[test]
    fn test_store_move_missing() {
        let store = RecordStore::new();
        assert!(store.move_record("x").unwrap_err().is_not_found());
    }

    #[test]
    fn test_store_from_records() {
        let store = RecordStore::from_records([
            ("a", Arc::new(ValueRecord::new(1u8)) as SharedRecord),
            ("b", Arc::new(ValueRecord::new(2u8)) as SharedRecord),
        ])
        .unwrap();

        let mut ids = store.ids();
        ids.sort();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_store_remove() {
        let store = RecordStore::new();
        store.add("a", ValueRecord::new(1u8)).unwrap();
        store.add("b", ValueRecord::new(2u8)).unwrap();

        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.ids(), ["b"]);

        // The id is free again
        store.add("a", ValueRecord::new(3u8)).unwrap();
        assert_eq!(store.len(), 2);
    }
}
