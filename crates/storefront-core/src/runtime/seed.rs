// crates/storefront-core/src/runtime/seed.rs
// ============================================================================
// Module: Seed Generator
// Description: Deterministic-shape demo dataset generator.
// Purpose: Produce categories, products and their associated records.
// Dependencies: crate::core, rand, serde
// ============================================================================

//! ## Overview
//! The generator walks a fixed category table and emits `items_per_category`
//! products per category with ids `p_<category>_<index>`. Ids, names and
//! category assignment depend only on the configuration; price amounts,
//! stock levels and review presence are drawn from the RNG, which can be
//! seeded for reproducible output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use serde::Serialize;

use crate::core::Category;
use crate::core::InventoryRecord;
use crate::core::PriceRecord;
use crate::core::Product;
use crate::core::ReviewRecord;
use crate::core::SeedDataset;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default products generated per category (1000 products overall).
pub const DEFAULT_ITEMS_PER_CATEGORY: usize = 125;
/// Default probability that a product receives a review.
pub const DEFAULT_REVIEW_RATIO: f64 = 0.5;
/// Currency used for generated prices.
pub const SEED_CURRENCY: &str = "USD";
/// Comment used for generated reviews.
pub const SEED_REVIEW_COMMENT: &str = "Generated review.";

/// Adjectives cycled through product names.
const ADJECTIVES: [&str; 12] = [
    "Vintage", "Modern", "Classic", "Deluxe", "Rustic", "Sleek", "Cozy", "Bold", "Premium",
    "Handmade", "Eco", "Compact",
];

/// Category table row.
struct CategorySpec {
    /// Category identifier.
    id: &'static str,
    /// Category display name.
    name: &'static str,
    /// Emoji tags paired with their display names.
    items: &'static [(&'static str, &'static str)],
}

/// Fixed category table.
const CATEGORIES: [CategorySpec; 8] = [
    CategorySpec {
        id: "travel",
        name: "Travel",
        items: &[
            ("✈️", "Airplane"),
            ("🚗", "Car"),
            ("🚲", "Bicycle"),
            ("🚀", "Rocket"),
            ("⛵", "Sailboat"),
            ("🚂", "Locomotive"),
            ("🧳", "Luggage"),
            ("🗺️", "World Map"),
            ("🏕️", "Camping"),
            ("🚁", "Helicopter"),
        ],
    },
    CategorySpec {
        id: "food",
        name: "Food",
        items: &[
            ("🍎", "Apple"),
            ("🍕", "Pizza"),
            ("🍔", "Burger"),
            ("🍣", "Sushi"),
            ("🍩", "Doughnut"),
            ("🥐", "Croissant"),
            ("🍜", "Noodles"),
            ("🧀", "Cheese"),
            ("🌮", "Taco"),
            ("🍫", "Chocolate"),
        ],
    },
    CategorySpec {
        id: "animals",
        name: "Animals",
        items: &[
            ("🐶", "Dog"),
            ("🐱", "Cat"),
            ("🦊", "Fox"),
            ("🐼", "Panda"),
            ("🦁", "Lion"),
            ("🐸", "Frog"),
            ("🐧", "Penguin"),
            ("🦉", "Owl"),
            ("🐢", "Turtle"),
            ("🦋", "Butterfly"),
        ],
    },
    CategorySpec {
        id: "sports",
        name: "Sports",
        items: &[
            ("⚽", "Soccer Ball"),
            ("🏀", "Basketball"),
            ("🎾", "Tennis Ball"),
            ("⚾", "Baseball"),
            ("🏈", "Football"),
            ("🏓", "Ping Pong"),
            ("🥊", "Boxing Glove"),
            ("⛳", "Golf Flag"),
            ("🎳", "Bowling"),
            ("🛹", "Skateboard"),
        ],
    },
    CategorySpec {
        id: "music",
        name: "Music",
        items: &[
            ("🎸", "Guitar"),
            ("🎹", "Piano"),
            ("🎺", "Trumpet"),
            ("🥁", "Drum"),
            ("🎻", "Violin"),
            ("🎷", "Saxophone"),
            ("🎧", "Headphones"),
            ("🎤", "Microphone"),
            ("📻", "Radio"),
            ("🪗", "Accordion"),
        ],
    },
    CategorySpec {
        id: "tech",
        name: "Tech",
        items: &[
            ("💻", "Laptop"),
            ("📱", "Mobile Phone"),
            ("⌨️", "Keyboard"),
            ("🖱️", "Computer Mouse"),
            ("🖨️", "Printer"),
            ("📷", "Camera"),
            ("🎮", "Video Game"),
            ("🔋", "Battery"),
            ("💾", "Floppy Disk"),
            ("🕹️", "Joystick"),
        ],
    },
    CategorySpec {
        id: "nature",
        name: "Nature",
        items: &[
            ("🌲", "Evergreen Tree"),
            ("🌵", "Cactus"),
            ("🌻", "Sunflower"),
            ("🍄", "Mushroom"),
            ("🌊", "Wave"),
            ("🌋", "Volcano"),
            ("🌈", "Rainbow"),
            ("🌙", "Crescent Moon"),
            ("⭐", "Star"),
            ("🍁", "Maple Leaf"),
        ],
    },
    CategorySpec {
        id: "home",
        name: "Home",
        items: &[
            ("🛋️", "Couch"),
            ("🛏️", "Bed"),
            ("🪑", "Chair"),
            ("🚪", "Door"),
            ("🕯️", "Candle"),
            ("🧸", "Teddy Bear"),
            ("🪴", "Potted Plant"),
            ("🧺", "Basket"),
            ("🖼️", "Framed Picture"),
            ("⏰", "Alarm Clock"),
        ],
    },
];

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Seed generator configuration.
///
/// # Invariants
/// - `review_ratio` is clamped into `[0, 1]` at generation time; a
///   non-finite ratio generates no reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Products generated per category.
    #[serde(default = "default_items_per_category")]
    pub items_per_category: usize,
    /// Probability that a product receives a review.
    #[serde(default = "default_review_ratio")]
    pub review_ratio: f64,
    /// Optional RNG seed for reproducible numeric fields.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            items_per_category: DEFAULT_ITEMS_PER_CATEGORY,
            review_ratio: DEFAULT_REVIEW_RATIO,
            rng_seed: None,
        }
    }
}

/// Serde default for `items_per_category`.
const fn default_items_per_category() -> usize {
    DEFAULT_ITEMS_PER_CATEGORY
}

/// Serde default for `review_ratio`.
const fn default_review_ratio() -> f64 {
    DEFAULT_REVIEW_RATIO
}

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Returns the product id for `index` within `category_id`.
#[must_use]
pub fn product_id(category_id: &str, index: usize) -> String {
    format!("p_{category_id}_{index}")
}

/// Maps a configured review ratio onto a valid probability.
fn review_probability(ratio: f64) -> f64 {
    if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 }
}

/// Generates a full dataset.
#[must_use]
pub fn generate_dataset(config: &SeedConfig) -> SeedDataset {
    let mut rng = config.rng_seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let review_ratio = review_probability(config.review_ratio);
    let mut dataset = SeedDataset::default();
    for spec in &CATEGORIES {
        dataset.categories.push(Category {
            id: spec.id.to_string(),
            name: spec.name.to_string(),
        });
        for index in 0 .. config.items_per_category {
            let (emoji, emoji_name) = spec.items[index % spec.items.len()];
            let id = product_id(spec.id, index);
            let name = format!("{} {emoji_name}", ADJECTIVES[index % ADJECTIVES.len()]);
            dataset.products.push(Product {
                id: id.clone(),
                description: format!("A beautiful {name} for your collection."),
                name,
                emoji: emoji.to_string(),
                category_id: Some(spec.id.to_string()),
            });
            let amount: f64 = rng.gen_range(10.0 .. 110.0);
            dataset.prices.push(PriceRecord {
                id: format!("price_{id}"),
                product_id: id.clone(),
                amount: (amount * 100.0).round() / 100.0,
                currency: SEED_CURRENCY.to_string(),
            });
            dataset.inventory.push(InventoryRecord {
                id: format!("inv_{id}"),
                product_id: id.clone(),
                quantity: rng.gen_range(0 .. 100),
            });
            if rng.gen_bool(review_ratio) {
                dataset.reviews.push(ReviewRecord {
                    id: format!("review_{id}"),
                    product_id: id,
                    rating: rng.gen_range(1 ..= 5),
                    comment: SEED_REVIEW_COMMENT.to_string(),
                });
            }
        }
    }
    dataset
}
