// crates/storefront-core/src/core/view.rs
// ============================================================================
// Module: Merged Product View
// Description: Denormalized product view and the join helpers that build it.
// Purpose: Keep one merge routine shared by every lookup path.
// Dependencies: crate::core::records, serde
// ============================================================================

//! ## Overview
//! [`MergedView`] is the output shape of every lookup: the product's fields
//! flattened, plus its price, inventory, reviews and category. Point and list
//! lookups both build views through [`merge_view`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::records::Attribute;
use crate::core::records::Category;
use crate::core::records::InventoryRecord;
use crate::core::records::PriceRecord;
use crate::core::records::Product;
use crate::core::records::Record;
use crate::core::records::ReviewRecord;

// ============================================================================
// SECTION: Merged View
// ============================================================================

/// Denormalized product view returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedView {
    /// Product fields, flattened into the view.
    #[serde(flatten)]
    pub product: Product,
    /// Price for the product, if any.
    pub price: Option<PriceRecord>,
    /// Inventory for the product, if any.
    pub inventory: Option<InventoryRecord>,
    /// Reviews for the product.
    pub reviews: Vec<ReviewRecord>,
    /// Category the product belongs to, if resolvable.
    pub category: Option<Category>,
}

impl MergedView {
    /// Returns the product identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.product.id
    }
}

/// Joins a product with its associated records.
#[must_use]
pub const fn merge_view(
    product: Product,
    price: Option<PriceRecord>,
    inventory: Option<InventoryRecord>,
    reviews: Vec<ReviewRecord>,
    category: Option<Category>,
) -> MergedView {
    MergedView {
        product,
        price,
        inventory,
        reviews,
        category,
    }
}

// ============================================================================
// SECTION: Join Helpers
// ============================================================================

/// Returns the first record of a scan, or `None` when the scan was empty.
#[must_use]
pub fn first_or_none<R>(records: Vec<R>) -> Option<R> {
    records.into_iter().next()
}

/// Indexes records by a foreign-key attribute, keeping the first occurrence.
#[must_use]
pub fn index_first_by<R: Record>(records: Vec<R>, attribute: Attribute) -> HashMap<String, R> {
    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        let Some(key) = record.attribute(attribute).map(str::to_string) else {
            continue;
        };
        index.entry(key).or_insert(record);
    }
    index
}

/// Indexes records by primary key, keeping the first occurrence.
#[must_use]
pub fn index_by_key<R: Record>(records: Vec<R>) -> HashMap<String, R> {
    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        index.entry(record.key().to_string()).or_insert(record);
    }
    index
}
