// crates/storefront-core/tests/mesh_aggregator.rs
// ============================================================================
// Module: Mesh Aggregator Tests
// Description: Tests for service-mesh fan-out with per-dependency fallbacks.
// ============================================================================
//! ## Overview
//! Drives [`MeshAggregator`] with a scripted in-process [`MeshClient`] to
//! validate fallbacks, catalog failures, listing and reseed fan-out.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use storefront_core::AggregateError;
use storefront_core::Aggregator;
use storefront_core::Category;
use storefront_core::Dependency;
use storefront_core::EventDetail;
use storefront_core::InventoryRecord;
use storefront_core::Lookup;
use storefront_core::MemoryEventSink;
use storefront_core::MeshAggregator;
use storefront_core::MeshClient;
use storefront_core::MeshError;
use storefront_core::PriceRecord;
use storefront_core::Product;
use storefront_core::ReviewRecord;
use storefront_core::SeedConfig;
use storefront_core::SeedDataset;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Scripted mesh: a fixed dataset plus a set of failing services.
#[derive(Default)]
struct ScriptedMesh {
    data: SeedDataset,
    failing: HashSet<Dependency>,
    seeded: Mutex<Vec<Dependency>>,
}

impl ScriptedMesh {
    fn check(&self, dependency: Dependency) -> Result<(), MeshError> {
        if self.failing.contains(&dependency) {
            return Err(MeshError::Transport(format!("{} unavailable", dependency.as_str())));
        }
        Ok(())
    }
}

#[async_trait]
impl MeshClient for ScriptedMesh {
    async fn product(&self, id: &str) -> Result<Option<Product>, MeshError> {
        self.check(Dependency::Catalog)?;
        Ok(self.data.products.iter().find(|product| product.id == id).cloned())
    }

    async fn products(&self, category_id: Option<&str>) -> Result<Vec<Product>, MeshError> {
        self.check(Dependency::Catalog)?;
        Ok(self
            .data
            .products
            .iter()
            .filter(|product| category_id.is_none() || product.category_id.as_deref() == category_id)
            .cloned()
            .collect())
    }

    async fn category(&self, id: &str) -> Result<Option<Category>, MeshError> {
        self.check(Dependency::Catalog)?;
        Ok(self.data.categories.iter().find(|category| category.id == id).cloned())
    }

    async fn price(&self, product_id: &str) -> Result<Option<PriceRecord>, MeshError> {
        self.check(Dependency::Pricing)?;
        Ok(self.data.prices.iter().find(|price| price.product_id == product_id).cloned())
    }

    async fn inventory(&self, product_id: &str) -> Result<Option<InventoryRecord>, MeshError> {
        self.check(Dependency::Inventory)?;
        Ok(self.data.inventory.iter().find(|stock| stock.product_id == product_id).cloned())
    }

    async fn reviews(&self, product_id: &str) -> Result<Vec<ReviewRecord>, MeshError> {
        self.check(Dependency::Reviews)?;
        Ok(self
            .data
            .reviews
            .iter()
            .filter(|review| review.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn seed(&self, dependency: Dependency, _dataset: &SeedDataset) -> Result<(), MeshError> {
        self.check(dependency)?;
        self.seeded.lock().unwrap().push(dependency);
        Ok(())
    }
}

fn dataset() -> SeedDataset {
    SeedDataset {
        categories: vec![Category {
            id: "c1".to_string(),
            name: "One".to_string(),
        }],
        products: vec![
            Product {
                id: "p1".to_string(),
                name: "First".to_string(),
                description: "first".to_string(),
                emoji: "🎸".to_string(),
                category_id: Some("c1".to_string()),
            },
            Product {
                id: "p2".to_string(),
                name: "Second".to_string(),
                description: "second".to_string(),
                emoji: "🎹".to_string(),
                category_id: Some("c1".to_string()),
            },
            Product {
                id: "p3".to_string(),
                name: "Third".to_string(),
                description: "third".to_string(),
                emoji: "🥁".to_string(),
                category_id: None,
            },
        ],
        prices: vec![PriceRecord {
            id: "price_p1".to_string(),
            product_id: "p1".to_string(),
            amount: 12.5,
            currency: "USD".to_string(),
        }],
        inventory: vec![InventoryRecord {
            id: "inv_p1".to_string(),
            product_id: "p1".to_string(),
            quantity: 8,
        }],
        reviews: vec![ReviewRecord {
            id: "review_p1".to_string(),
            product_id: "p1".to_string(),
            rating: 5,
            comment: "great".to_string(),
        }],
    }
}

fn aggregator(failing: &[Dependency]) -> (MeshAggregator, Arc<ScriptedMesh>, Arc<MemoryEventSink>) {
    let mesh = Arc::new(ScriptedMesh {
        data: dataset(),
        failing: failing.iter().copied().collect(),
        seeded: Mutex::new(Vec::new()),
    });
    let events = Arc::new(MemoryEventSink::new());
    let seed = SeedConfig {
        items_per_category: 2,
        review_ratio: 1.0,
        rng_seed: Some(3),
    };
    (MeshAggregator::new(mesh.clone(), seed, events.clone()), mesh, events)
}

fn fallbacks(events: &MemoryEventSink) -> Vec<Dependency> {
    events
        .details()
        .into_iter()
        .filter_map(|detail| match detail {
            EventDetail::DependencyFallback {
                dependency,
                ..
            } => Some(dependency),
            _ => None,
        })
        .collect()
}

// ============================================================================
// SECTION: Point Lookups
// ============================================================================

#[tokio::test]
async fn healthy_mesh_merges_every_dependency() {
    let (aggregator, _, events) = aggregator(&[]);

    let view = aggregator.resolve_point("p1").await.unwrap().expect("view");
    assert_eq!(view.price.as_ref().map(|price| price.amount), Some(12.5));
    assert_eq!(view.inventory.as_ref().map(|stock| stock.quantity), Some(8));
    assert_eq!(view.reviews.len(), 1);
    assert_eq!(view.category.as_ref().map(|category| category.name.as_str()), Some("One"));
    assert!(fallbacks(&events).is_empty());
}

#[tokio::test]
async fn inventory_outage_falls_back_to_zero_stock() {
    let (aggregator, _, events) = aggregator(&[Dependency::Inventory]);

    let view = aggregator.resolve_point("p1").await.unwrap().expect("view");
    assert_eq!(view.inventory, Some(InventoryRecord::zero("p1")));
    assert_eq!(view.price.as_ref().map(|price| price.id.as_str()), Some("price_p1"));
    assert_eq!(view.reviews.len(), 1);
    assert_eq!(fallbacks(&events), vec![Dependency::Inventory]);
}

#[tokio::test]
async fn pricing_and_reviews_outages_fall_back_to_empty_values() {
    let (aggregator, _, events) = aggregator(&[Dependency::Pricing, Dependency::Reviews]);

    let view = aggregator.resolve_point("p1").await.unwrap().expect("view");
    assert!(view.price.is_none());
    assert!(view.reviews.is_empty());
    assert_eq!(view.inventory.as_ref().map(|stock| stock.quantity), Some(8));
    let reported: HashSet<Dependency> = fallbacks(&events).into_iter().collect();
    assert_eq!(reported, HashSet::from([Dependency::Pricing, Dependency::Reviews]));
}

#[tokio::test]
async fn absent_inventory_is_reported_as_zero_stock() {
    let (aggregator, _, events) = aggregator(&[]);

    let view = aggregator.resolve_point("p2").await.unwrap().expect("view");
    assert_eq!(view.inventory, Some(InventoryRecord::zero("p2")));
    assert!(view.price.is_none());
    assert!(fallbacks(&events).is_empty());
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let (aggregator, _, _) = aggregator(&[Dependency::Pricing]);

    let resolution = aggregator.resolve(&Lookup::point("nope")).await.unwrap();
    assert!(resolution.is_not_found());
}

#[tokio::test]
async fn catalog_outage_fails_the_lookup() {
    let (aggregator, _, _) = aggregator(&[Dependency::Catalog]);

    let err = aggregator.resolve(&Lookup::point("p1")).await.unwrap_err();
    assert!(matches!(err, AggregateError::Mesh(MeshError::Transport(_))), "unexpected {err:?}");
}

// ============================================================================
// SECTION: List Lookups
// ============================================================================

#[tokio::test]
async fn listing_preserves_catalog_order_and_includes_reviews() {
    let (aggregator, _, _) = aggregator(&[]);

    let views = aggregator.resolve(&Lookup::list(None, None)).await.unwrap().into_views();
    let ids: Vec<&str> = views.iter().map(|view| view.id()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);
    assert_eq!(views[0].reviews.len(), 1);
    assert!(views[2].category.is_none());
}

#[tokio::test]
async fn listing_applies_category_then_limit() {
    let (aggregator, _, _) = aggregator(&[Dependency::Reviews]);

    let views = aggregator
        .resolve(&Lookup::list(Some("c1".to_string()), NonZeroUsize::new(1)))
        .await
        .unwrap()
        .into_views();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].id(), "p1");
    assert!(views[0].reviews.is_empty());
}

// ============================================================================
// SECTION: Reseed
// ============================================================================

#[tokio::test]
async fn reseed_pushes_to_every_service() {
    let (aggregator, mesh, _) = aggregator(&[]);

    let report = aggregator.reseed().await.unwrap();
    assert_eq!(report.products, 16);
    assert_eq!(report.wipe_failures, 0);
    let seeded: HashSet<Dependency> = mesh.seeded.lock().unwrap().iter().copied().collect();
    assert_eq!(seeded, HashSet::from(Dependency::ALL));
}

#[tokio::test]
async fn reseed_reports_failing_service() {
    let (aggregator, _, _) = aggregator(&[Dependency::Pricing]);

    let err = aggregator.reseed().await.unwrap_err();
    match err {
        AggregateError::Seed(message) => assert!(message.contains("pricing"), "{message}"),
        other => panic!("unexpected error {other:?}"),
    }
}
