//! Latest-record-per-location store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::record::LocationRecord;

/// Holds exactly one record per location name.
///
/// Cloning shares the same underlying map. Records are stored behind `Arc`
/// so a write is a single pointer replacement: readers see either the old
/// or the new record, never a mix.
#[derive(Debug, Clone, Default)]
pub struct LocationStore {
    records: Arc<RwLock<HashMap<String, Arc<LocationRecord>>>>,
}

impl LocationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any prior record for the same location name and returns it.
    pub fn upsert(&self, record: Arc<LocationRecord>) -> Option<Arc<LocationRecord>> {
        let mut map = self.records.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(record.location.name.clone(), record)
    }

    /// Exact-name lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<LocationRecord>> {
        let map = self.records.read().unwrap_or_else(PoisonError::into_inner);
        map.get(name).cloned()
    }

    /// Current records, sorted by location name.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<LocationRecord>> {
        let map = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut records: Vec<_> = map.values().cloned().collect();
        records.sort_by(|a, b| a.location.name.cmp(&b.location.name));
        records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every record.
    pub fn clear(&self) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
