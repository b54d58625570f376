// crates/storefront-core/src/runtime/mod.rs
// ============================================================================
// Module: Storefront Runtime
// Description: Aggregators, stores, cache, and seed generation.
// Purpose: Group the executable parts of the storefront core.
// Dependencies: crate::core, crate::interfaces, crate::events
// ============================================================================

//! ## Overview
//! Runtime components implement the lookup and reseed behavior on top of the
//! core data model and collaborator interfaces.

pub mod aggregator;
pub mod cache;
pub mod embedded;
pub mod mesh;
pub mod seed;
pub mod store;

pub use aggregator::AggregateError;
pub use aggregator::Aggregator;
pub use aggregator::AggregatorKind;
pub use aggregator::SeedReport;
pub use cache::Snapshot;
pub use cache::SnapshotCache;
pub use embedded::EmbeddedAggregator;
pub use embedded::replace_records;
pub use embedded::wipe_store;
pub use mesh::Fallback;
pub use mesh::MeshAggregator;
pub use seed::DEFAULT_ITEMS_PER_CATEGORY;
pub use seed::DEFAULT_REVIEW_RATIO;
pub use seed::SeedConfig;
pub use seed::generate_dataset;
pub use seed::product_id;
pub use store::InMemoryRecordStore;
