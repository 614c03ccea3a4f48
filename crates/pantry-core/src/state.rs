//! Household-partitioned state management.
//!
//! Provides [`HouseholdStore`], a thread-safe concurrent store that
//! partitions records by owning household and keys them by identifier.

use std::sync::Arc;

use dashmap::DashMap;

/// Thread-safe, household-partitioned record store.
///
/// Each household gets its own map of `id -> Arc<T>`. Uses `DashMap` for
/// lock-free concurrent access, so a single instance can be shared across
/// every request-handling task.
///
/// # Examples
///
/// ```
/// use pantry_core::HouseholdStore;
///
/// let store = HouseholdStore::<String>::new();
/// store.insert("household", "id", "value".to_owned());
/// assert_eq!(store.get("household", "id").as_deref(), Some(&"value".to_owned()));
/// ```
#[derive(Debug)]
pub struct HouseholdStore<T: Send + Sync> {
    inner: DashMap<String, DashMap<String, Arc<T>>>,
}

impl<T: Send + Sync> HouseholdStore<T> {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Insert or replace a record.
    pub fn insert(&self, household_id: &str, id: &str, value: T) {
        self.inner
            .entry(household_id.to_owned())
            .or_default()
            .insert(id.to_owned(), Arc::new(value));
    }

    /// Get a record, if it exists.
    #[must_use]
    pub fn get(&self, household_id: &str, id: &str) -> Option<Arc<T>> {
        let partition = self.inner.get(household_id)?;
        let value = partition.get(id).map(|v| Arc::clone(v.value()));
        value
    }

    /// All records belonging to a household, in no particular order.
    #[must_use]
    pub fn values(&self, household_id: &str) -> Vec<Arc<T>> {
        let Some(partition) = self.inner.get(household_id) else {
            return Vec::new();
        };
        let values = partition.iter().map(|e| Arc::clone(e.value())).collect();
        values
    }
}

impl<T: Send + Sync> Default for HouseholdStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
