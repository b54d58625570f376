// crates/storefront-store-sqlite/src/lib.rs
// ============================================================================
// Module: Storefront SQLite Store
// Description: SQLite-backed record stores for the embedded aggregator.
// Purpose: Provide the embedded database behind Variant A.
// Dependencies: storefront-core, rusqlite, serde_json, tokio
// ============================================================================

//! ## Overview
//! This crate implements [`storefront_core::RecordStore`] for every record
//! kind on top of a single `SQLite` database file. [`open_catalog`] opens the
//! database once and returns the five stores sharing its connection.
//! Invariants:
//! - Each record kind lives in its own table keyed by record key.
//! - Scans return records in key order.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteDatabase;
pub use store::SqliteRecordStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::open_catalog;
