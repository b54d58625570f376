// crates/storefront-core/src/lib.rs
// ============================================================================
// Module: Storefront Core
// Description: Product-detail aggregation over stores and service meshes.
// Purpose: Provide the record model, collaborator interfaces and aggregators.
// Dependencies: async-trait, rand, serde, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! Storefront core resolves a product key or a listing filter into merged
//! product views by fanning out to independent record sources and joining
//! the results by product id. Two [`Aggregator`] implementations share the
//! contract:
//! - [`EmbeddedAggregator`] joins locally owned [`RecordStore`]s and fails a
//!   lookup on any store error. Unscoped listings are cached until reseed.
//! - [`MeshAggregator`] calls the catalog, inventory, pricing and reviews
//!   services through a [`MeshClient`] and replaces failed secondary calls
//!   with per-dependency defaults.
//!
//! Invariants:
//! - Not-found is a value, never an error.
//! - Secondary records whose product id matches no product are never
//!   surfaced.
//! - Point and list lookups build views through one merge routine.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod events;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::Attribute;
pub use crate::core::Category;
pub use crate::core::InventoryRecord;
pub use crate::core::ListQuery;
pub use crate::core::Lookup;
pub use crate::core::LookupError;
pub use crate::core::MergedView;
pub use crate::core::PriceRecord;
pub use crate::core::Product;
pub use crate::core::Record;
pub use crate::core::RecordKind;
pub use crate::core::Resolution;
pub use crate::core::ReviewRecord;
pub use crate::core::SeedDataset;
pub use crate::core::first_or_none;
pub use crate::core::merge_view;
pub use events::AggregatorEvent;
pub use events::EventDetail;
pub use events::EventSink;
pub use events::MemoryEventSink;
pub use events::NoopEventSink;
pub use events::StderrEventSink;
pub use interfaces::CatalogStores;
pub use interfaces::Dependency;
pub use interfaces::MeshClient;
pub use interfaces::MeshError;
pub use interfaces::RecordStore;
pub use interfaces::ScanFilter;
pub use interfaces::ScanQuery;
pub use interfaces::SharedStore;
pub use interfaces::StoreError;
pub use runtime::AggregateError;
pub use runtime::Aggregator;
pub use runtime::AggregatorKind;
pub use runtime::EmbeddedAggregator;
pub use runtime::Fallback;
pub use runtime::InMemoryRecordStore;
pub use runtime::MeshAggregator;
pub use runtime::SeedConfig;
pub use runtime::SeedReport;
pub use runtime::SnapshotCache;
pub use runtime::generate_dataset;
pub use runtime::product_id;
pub use runtime::replace_records;
pub use runtime::wipe_store;
