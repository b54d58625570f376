// crates/storefront-core/src/interfaces/mod.rs
// ============================================================================
// Module: Storefront Interfaces
// Description: Backend-agnostic store and service-mesh interfaces.
// Purpose: Define the collaborator contracts consumed by the aggregators.
// Dependencies: crate::core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how aggregators reach their data without embedding
//! backend-specific details. [`RecordStore`] is the per-kind store contract
//! used by the embedded variant; [`MeshClient`] is the set of per-service
//! calls used by the service-mesh variant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::Attribute;
use crate::core::Category;
use crate::core::InventoryRecord;
use crate::core::PriceRecord;
use crate::core::Product;
use crate::core::Record;
use crate::core::ReviewRecord;
use crate::core::SeedDataset;

// ============================================================================
// SECTION: Record Store
// ============================================================================

/// Attribute equality filter for scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFilter {
    /// Attribute to match.
    pub attribute: Attribute,
    /// Required attribute value.
    pub value: String,
}

/// Scan parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanQuery {
    /// Optional attribute filter.
    pub filter: Option<ScanFilter>,
    /// Optional cap on returned records; the scan stops early once reached.
    pub limit: Option<usize>,
}

impl ScanQuery {
    /// Scans every record.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            filter: None,
            limit: None,
        }
    }

    /// Scans records whose attribute equals `value`.
    #[must_use]
    pub fn matching(attribute: Attribute, value: impl Into<String>) -> Self {
        Self {
            filter: Some(ScanFilter {
                attribute,
                value: value.into(),
            }),
            limit: None,
        }
    }

    /// Caps the scan at `limit` records.
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Returns true when `record` passes the filter.
    #[must_use]
    pub fn accepts<R: Record>(&self, record: &R) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| record.attribute(filter.attribute) == Some(filter.value.as_str()))
    }
}

/// Record store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Store I/O error.
    #[error("record store io error: {0}")]
    Io(String),
    /// Store data is invalid.
    #[error("record store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("record store error: {0}")]
    Store(String),
}

/// Per-kind record store.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Loads a record by key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    async fn get(&self, key: &str) -> Result<Option<R>, StoreError>;

    /// Returns records matching the query in store order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the scan fails.
    async fn scan(&self, query: ScanQuery) -> Result<Vec<R>, StoreError>;

    /// Inserts or replaces a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn put(&self, record: R) -> Result<(), StoreError>;

    /// Deletes a record by key; deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Inserts or replaces a batch of records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on the first failed write.
    async fn put_many(&self, records: Vec<R>) -> Result<(), StoreError> {
        for record in records {
            self.put(record).await?;
        }
        Ok(())
    }
}

/// Shared handle to a record store.
pub type SharedStore<R> = Arc<dyn RecordStore<R>>;

/// The five logical stores backing the embedded variant.
#[derive(Clone)]
pub struct CatalogStores {
    /// Product store.
    pub products: SharedStore<Product>,
    /// Price store.
    pub prices: SharedStore<PriceRecord>,
    /// Inventory store.
    pub inventory: SharedStore<InventoryRecord>,
    /// Review store.
    pub reviews: SharedStore<ReviewRecord>,
    /// Category store.
    pub categories: SharedStore<Category>,
}

// ============================================================================
// SECTION: Service Mesh
// ============================================================================

/// Services reachable through the mesh.
///
/// # Invariants
/// - Variants are stable for log labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependency {
    /// Catalog service (products and categories).
    Catalog,
    /// Inventory service.
    Inventory,
    /// Pricing service.
    Pricing,
    /// Reviews service.
    Reviews,
}

impl Dependency {
    /// All mesh services.
    pub const ALL: [Self; 4] = [Self::Catalog, Self::Inventory, Self::Pricing, Self::Reviews];

    /// Returns a stable label for the dependency.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Inventory => "inventory",
            Self::Pricing => "pricing",
            Self::Reviews => "reviews",
        }
    }
}

/// Mesh call errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MeshError {
    /// The request could not be sent or no response arrived.
    #[error("mesh transport error: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("mesh status error: {0}")]
    Status(String),
    /// The response body could not be decoded.
    #[error("mesh decode error: {0}")]
    Decode(String),
}

/// Calls into the catalog, inventory, pricing and reviews services.
#[async_trait]
pub trait MeshClient: Send + Sync {
    /// Fetches a product from the catalog service.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError`] when the call fails.
    async fn product(&self, id: &str) -> Result<Option<Product>, MeshError>;

    /// Lists products from the catalog service, optionally by category.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError`] when the call fails.
    async fn products(&self, category_id: Option<&str>) -> Result<Vec<Product>, MeshError>;

    /// Fetches a category from the catalog service.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError`] when the call fails.
    async fn category(&self, id: &str) -> Result<Option<Category>, MeshError>;

    /// Fetches a product's price from the pricing service.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError`] when the call fails.
    async fn price(&self, product_id: &str) -> Result<Option<PriceRecord>, MeshError>;

    /// Fetches a product's stock level from the inventory service.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError`] when the call fails.
    async fn inventory(&self, product_id: &str) -> Result<Option<InventoryRecord>, MeshError>;

    /// Fetches a product's reviews from the reviews service.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError`] when the call fails.
    async fn reviews(&self, product_id: &str) -> Result<Vec<ReviewRecord>, MeshError>;

    /// Replaces a service's contents with its share of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError`] when the call fails.
    async fn seed(&self, dependency: Dependency, dataset: &SeedDataset) -> Result<(), MeshError>;
}
