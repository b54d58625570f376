// crates/storefront-core/src/core/dataset.rs
// ============================================================================
// Module: Seed Dataset
// Description: A complete set of records for every store kind.
// Purpose: Carry generated data from the generator to the stores or services.
// Dependencies: crate::core::records, serde
// ============================================================================

//! ## Overview
//! [`SeedDataset`] bundles one generated batch of every record kind. The
//! embedded aggregator inserts it into its stores; the mesh aggregator splits
//! it per service.

use serde::Deserialize;
use serde::Serialize;

use crate::core::records::Category;
use crate::core::records::InventoryRecord;
use crate::core::records::PriceRecord;
use crate::core::records::Product;
use crate::core::records::ReviewRecord;

/// Records for every store kind, ready to be inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedDataset {
    /// Category records.
    pub categories: Vec<Category>,
    /// Product records.
    pub products: Vec<Product>,
    /// Price records.
    pub prices: Vec<PriceRecord>,
    /// Inventory records.
    pub inventory: Vec<InventoryRecord>,
    /// Review records.
    pub reviews: Vec<ReviewRecord>,
}

impl SeedDataset {
    /// Returns the total number of records across all kinds.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.categories.len()
            + self.products.len()
            + self.prices.len()
            + self.inventory.len()
            + self.reviews.len()
    }
}
