// crates/storefront-core/src/core/records.rs
// ============================================================================
// Module: Storefront Records
// Description: Typed records for products and their associated data.
// Purpose: Give every store kind an explicit, optional-typed record shape.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Records are the unit of storage for every store kind. Each record exposes
//! its primary key and the attributes a filtered scan may match on, so stores
//! can stay generic over the record type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

// ============================================================================
// SECTION: Record Kinds
// ============================================================================

/// Logical store kinds.
///
/// # Invariants
/// - Variants are stable for table names and log labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Product (primary entity) records.
    Product,
    /// Price records keyed by product.
    Price,
    /// Inventory records keyed by product.
    Inventory,
    /// Review records keyed by product.
    Review,
    /// Category records referenced by products.
    Category,
}

impl RecordKind {
    /// All record kinds in wipe order.
    pub const ALL: [Self; 5] =
        [Self::Product, Self::Price, Self::Inventory, Self::Review, Self::Category];

    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Price => "price",
            Self::Inventory => "inventory",
            Self::Review => "review",
            Self::Category => "category",
        }
    }
}

/// Attributes a scan filter may match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Foreign key to a product.
    ProductId,
    /// Foreign key to a category.
    CategoryId,
}

impl Attribute {
    /// Returns the attribute's column/field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductId => "product_id",
            Self::CategoryId => "category_id",
        }
    }
}

/// A storable record.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Store kind holding this record type.
    const KIND: RecordKind;

    /// Returns the record's unique key.
    fn key(&self) -> &str;

    /// Returns the value of a filterable attribute, if the record carries it.
    fn attribute(&self, attribute: Attribute) -> Option<&str>;
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Product (the primary entity every view is built around).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Emoji display tag.
    pub emoji: String,
    /// Optional owning category.
    #[serde(default)]
    pub category_id: Option<String>,
}

impl Record for Product {
    const KIND: RecordKind = RecordKind::Product;

    fn key(&self) -> &str {
        &self.id
    }

    fn attribute(&self, attribute: Attribute) -> Option<&str> {
        match attribute {
            Attribute::ProductId => Some(&self.id),
            Attribute::CategoryId => self.category_id.as_deref(),
        }
    }
}

/// Price for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Unique record identifier.
    pub id: String,
    /// Product this price belongs to.
    pub product_id: String,
    /// Price amount.
    pub amount: f64,
    /// ISO currency code.
    pub currency: String,
}

impl Record for PriceRecord {
    const KIND: RecordKind = RecordKind::Price;

    fn key(&self) -> &str {
        &self.id
    }

    fn attribute(&self, attribute: Attribute) -> Option<&str> {
        match attribute {
            Attribute::ProductId => Some(&self.product_id),
            Attribute::CategoryId => None,
        }
    }
}

/// Stock level for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Unique record identifier.
    pub id: String,
    /// Product this stock level belongs to.
    pub product_id: String,
    /// Units on hand.
    pub quantity: i64,
}

impl InventoryRecord {
    /// Zero-quantity record used when inventory data is unavailable.
    #[must_use]
    pub fn zero(product_id: &str) -> Self {
        Self {
            id: format!("inv_{product_id}"),
            product_id: product_id.to_string(),
            quantity: 0,
        }
    }
}

impl Record for InventoryRecord {
    const KIND: RecordKind = RecordKind::Inventory;

    fn key(&self) -> &str {
        &self.id
    }

    fn attribute(&self, attribute: Attribute) -> Option<&str> {
        match attribute {
            Attribute::ProductId => Some(&self.product_id),
            Attribute::CategoryId => None,
        }
    }
}

/// Customer review for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Unique record identifier.
    pub id: String,
    /// Product under review.
    pub product_id: String,
    /// Star rating (1-5).
    pub rating: u8,
    /// Free-form comment.
    pub comment: String,
}

impl Record for ReviewRecord {
    const KIND: RecordKind = RecordKind::Review;

    fn key(&self) -> &str {
        &self.id
    }

    fn attribute(&self, attribute: Attribute) -> Option<&str> {
        match attribute {
            Attribute::ProductId => Some(&self.product_id),
            Attribute::CategoryId => None,
        }
    }
}

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique category identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Record for Category {
    const KIND: RecordKind = RecordKind::Category;

    fn key(&self) -> &str {
        &self.id
    }

    fn attribute(&self, attribute: Attribute) -> Option<&str> {
        match attribute {
            Attribute::ProductId => None,
            Attribute::CategoryId => Some(&self.id),
        }
    }
}
