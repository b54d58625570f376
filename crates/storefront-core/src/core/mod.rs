// crates/storefront-core/src/core/mod.rs
// ============================================================================
// Module: Storefront Core Types
// Description: Records, lookups, and merged views.
// Purpose: Group the data model shared by both aggregator variants.
// Dependencies: crate::core::{dataset, lookup, records, view}
// ============================================================================

//! ## Overview
//! Core types are plain data: records as stored, lookups as requested, and
//! merged views as returned.

pub mod dataset;
pub mod lookup;
pub mod records;
pub mod view;

pub use dataset::SeedDataset;
pub use lookup::ListQuery;
pub use lookup::Lookup;
pub use lookup::LookupError;
pub use lookup::Resolution;
pub use records::Attribute;
pub use records::Category;
pub use records::InventoryRecord;
pub use records::PriceRecord;
pub use records::Product;
pub use records::Record;
pub use records::RecordKind;
pub use records::ReviewRecord;
pub use view::MergedView;
pub use view::first_or_none;
pub use view::index_by_key;
pub use view::index_first_by;
pub use view::merge_view;
