// crates/storefront-core/src/runtime/aggregator.rs
// ============================================================================
// Module: Aggregator Interface
// Description: Shared contract for the embedded and service-mesh aggregators.
// Purpose: Let the HTTP layer pick an aggregation strategy at construction.
// Dependencies: crate::core, crate::interfaces, async-trait, thiserror
// ============================================================================

//! ## Overview
//! An [`Aggregator`] resolves lookups into merged product views and reseeds
//! its backing data. The two implementations differ in failure policy:
//! [`crate::EmbeddedAggregator`] fails a lookup on any store error, while
//! [`crate::MeshAggregator`] replaces failed secondary calls with defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::core::Lookup;
use crate::core::Resolution;
use crate::interfaces::MeshError;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Aggregator variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatorKind {
    /// Direct joins over local stores.
    Embedded,
    /// HTTP fan-out over mesh services.
    Mesh,
}

/// Outcome of a reseed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Number of products generated.
    pub products: usize,
    /// Number of records of every kind generated.
    pub records: usize,
    /// Number of wipe failures that were logged and skipped.
    pub wipe_failures: usize,
}

/// Aggregation errors.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// A store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A required mesh call failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
    /// Seeding failed after the wipe completed.
    #[error("seed failed: {0}")]
    Seed(String),
    /// A spawned fan-out task did not complete.
    #[error("aggregation task failed: {0}")]
    Task(String),
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Resolves lookups into merged product views.
#[async_trait]
pub trait Aggregator: Send + Sync {
    /// Returns the aggregator variant.
    fn kind(&self) -> AggregatorKind;

    /// Resolves a lookup.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] when a required fetch fails.
    async fn resolve(&self, lookup: &Lookup) -> Result<Resolution, AggregateError>;

    /// Wipes all data, invalidates cached results and inserts a fresh
    /// generated dataset.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] when inserting the new dataset fails.
    async fn reseed(&self) -> Result<SeedReport, AggregateError>;
}
