// crates/storefront-core/src/runtime/store.rs
// ============================================================================
// Module: Storefront In-Memory Store
// Description: Simple in-memory record store for tests and local demos.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`RecordStore`] for
//! tests, local demos and the mesh services' default backend. Scans return
//! records in key order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::Record;
use crate::interfaces::CatalogStores;
use crate::interfaces::RecordStore;
use crate::interfaces::ScanQuery;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory record store.
#[derive(Debug, Clone)]
pub struct InMemoryRecordStore<R> {
    /// Records keyed by primary key, protected by a mutex.
    records: Arc<Mutex<BTreeMap<String, R>>>,
}

impl<R> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl<R: Record> InMemoryRecordStore<R> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        let map = records.into_iter().map(|record| (record.key().to_string(), record)).collect();
        Self {
            records: Arc::new(Mutex::new(map)),
        }
    }

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    /// Returns true when the store holds no records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    /// Locks the record map.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, R>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Store(format!("{} store mutex poisoned", R::KIND.as_str())))
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for InMemoryRecordStore<R> {
    async fn get(&self, key: &str) -> Result<Option<R>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn scan(&self, query: ScanQuery) -> Result<Vec<R>, StoreError> {
        let guard = self.lock()?;
        let matching = guard.values().filter(|record| query.accepts(*record)).cloned();
        let records = match query.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        };
        drop(guard);
        Ok(records)
    }

    async fn put(&self, record: R) -> Result<(), StoreError> {
        self.lock()?.insert(record.key().to_string(), record);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ============================================================================
// SECTION: Catalog Builders
// ============================================================================

impl CatalogStores {
    /// Builds a catalog backed entirely by empty in-memory stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            products: Arc::new(InMemoryRecordStore::new()),
            prices: Arc::new(InMemoryRecordStore::new()),
            inventory: Arc::new(InMemoryRecordStore::new()),
            reviews: Arc::new(InMemoryRecordStore::new()),
            categories: Arc::new(InMemoryRecordStore::new()),
        }
    }
}
