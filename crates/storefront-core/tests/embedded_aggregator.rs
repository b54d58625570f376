// crates/storefront-core/tests/embedded_aggregator.rs
// ============================================================================
// Module: Embedded Aggregator Tests
// Description: Tests for store-backed point and list resolution.
// ============================================================================
//! ## Overview
//! Validates merging, not-found short-circuiting, the snapshot cache, reseed
//! behavior and all-or-nothing failure over instrumented in-memory stores.

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

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use storefront_core::AggregateError;
use storefront_core::Aggregator;
use storefront_core::CatalogStores;
use storefront_core::Category;
use storefront_core::EmbeddedAggregator;
use storefront_core::EventDetail;
use storefront_core::InMemoryRecordStore;
use storefront_core::InventoryRecord;
use storefront_core::Lookup;
use storefront_core::MemoryEventSink;
use storefront_core::PriceRecord;
use storefront_core::Product;
use storefront_core::Record;
use storefront_core::RecordKind;
use storefront_core::RecordStore;
use storefront_core::Resolution;
use storefront_core::ReviewRecord;
use storefront_core::ScanQuery;
use storefront_core::SeedConfig;
use storefront_core::StoreError;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// In-memory store that counts calls and can be told to fail.
struct CountingStore<R> {
    inner: InMemoryRecordStore<R>,
    gets: AtomicUsize,
    scans: AtomicUsize,
    fail_scans: AtomicBool,
    fail_deletes: AtomicBool,
}

impl<R: Record> CountingStore<R> {
    fn new(records: Vec<R>) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryRecordStore::with_records(records),
            gets: AtomicUsize::new(0),
            scans: AtomicUsize::new(0),
            fail_scans: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        })
    }

    fn calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst) + self.scans.load(Ordering::SeqCst)
    }

    fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for CountingStore<R> {
    async fn get(&self, key: &str) -> Result<Option<R>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn scan(&self, query: ScanQuery) -> Result<Vec<R>, StoreError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if self.fail_scans.load(Ordering::SeqCst) {
            return Err(StoreError::Io("scan unavailable".to_string()));
        }
        self.inner.scan(query).await
    }

    async fn put(&self, record: R) -> Result<(), StoreError> {
        self.inner.put(record).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Store(format!("cannot delete {key}")));
        }
        self.inner.delete(key).await
    }
}

/// Instrumented stores plus the aggregator built over them.
struct Fixture {
    products: Arc<CountingStore<Product>>,
    prices: Arc<CountingStore<PriceRecord>>,
    inventory: Arc<CountingStore<InventoryRecord>>,
    reviews: Arc<CountingStore<ReviewRecord>>,
    categories: Arc<CountingStore<Category>>,
    events: Arc<MemoryEventSink>,
    aggregator: EmbeddedAggregator,
}

impl Fixture {
    fn new(
        products: Vec<Product>,
        prices: Vec<PriceRecord>,
        inventory: Vec<InventoryRecord>,
        reviews: Vec<ReviewRecord>,
        categories: Vec<Category>,
    ) -> Self {
        Self::with_seed(products, prices, inventory, reviews, categories, SeedConfig::default())
    }

    fn with_seed(
        products: Vec<Product>,
        prices: Vec<PriceRecord>,
        inventory: Vec<InventoryRecord>,
        reviews: Vec<ReviewRecord>,
        categories: Vec<Category>,
        seed: SeedConfig,
    ) -> Self {
        let products = CountingStore::new(products);
        let prices = CountingStore::new(prices);
        let inventory = CountingStore::new(inventory);
        let reviews = CountingStore::new(reviews);
        let categories = CountingStore::new(categories);
        let events = Arc::new(MemoryEventSink::new());
        let stores = CatalogStores {
            products: products.clone(),
            prices: prices.clone(),
            inventory: inventory.clone(),
            reviews: reviews.clone(),
            categories: categories.clone(),
        };
        let aggregator = EmbeddedAggregator::new(stores, seed, events.clone());
        Self {
            products,
            prices,
            inventory,
            reviews,
            categories,
            events,
            aggregator,
        }
    }

    fn secondary_calls(&self) -> usize {
        self.prices.calls() + self.inventory.calls() + self.reviews.calls() + self.categories.calls()
    }

    fn total_scans(&self) -> usize {
        self.products.scans()
            + self.prices.scans()
            + self.inventory.scans()
            + self.reviews.scans()
            + self.categories.scans()
    }
}

fn product(id: &str, category_id: Option<&str>) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        description: "demo".to_string(),
        emoji: "📦".to_string(),
        category_id: category_id.map(str::to_string),
    }
}

fn price(id: &str, product_id: &str, amount: f64) -> PriceRecord {
    PriceRecord {
        id: id.to_string(),
        product_id: product_id.to_string(),
        amount,
        currency: "USD".to_string(),
    }
}

fn stock(id: &str, product_id: &str, quantity: i64) -> InventoryRecord {
    InventoryRecord {
        id: id.to_string(),
        product_id: product_id.to_string(),
        quantity,
    }
}

fn review(id: &str, product_id: &str) -> ReviewRecord {
    ReviewRecord {
        id: id.to_string(),
        product_id: product_id.to_string(),
        rating: 4,
        comment: "ok".to_string(),
    }
}

fn category(id: &str) -> Category {
    Category {
        id: id.to_string(),
        name: format!("Category {id}"),
    }
}

fn limit(value: usize) -> Option<NonZeroUsize> {
    NonZeroUsize::new(value)
}

fn small_seed() -> SeedConfig {
    SeedConfig {
        items_per_category: 4,
        review_ratio: 0.5,
        rng_seed: None,
    }
}

// ============================================================================
// SECTION: Point Lookups
// ============================================================================

#[tokio::test]
async fn point_lookup_merges_price_and_category_with_null_inventory() {
    let fixture = Fixture::new(
        vec![product("p1", Some("c1"))],
        vec![price("price1", "p1", 9.99)],
        Vec::new(),
        Vec::new(),
        vec![category("c1")],
    );

    let view = fixture.aggregator.resolve_point("p1").await.unwrap().expect("view");
    assert_eq!(view.id(), "p1");
    assert_eq!(view.price.as_ref().map(|price| price.amount), Some(9.99));
    assert!(view.inventory.is_none());
    assert!(view.reviews.is_empty());
    assert_eq!(view.category, Some(category("c1")));
}

#[tokio::test]
async fn point_lookup_without_secondary_records_yields_empty_fields() {
    let fixture =
        Fixture::new(vec![product("p1", None)], Vec::new(), Vec::new(), Vec::new(), Vec::new());

    let view = fixture.aggregator.resolve_point("p1").await.unwrap().expect("view");
    assert!(view.price.is_none());
    assert!(view.inventory.is_none());
    assert!(view.reviews.is_empty());
    assert!(view.category.is_none());
    assert_eq!(fixture.categories.calls(), 0, "no category fetch without category_id");
}

#[tokio::test]
async fn point_lookup_on_missing_id_skips_secondary_fetches() {
    let fixture = Fixture::new(
        vec![product("p1", Some("c1"))],
        vec![price("price1", "p1", 1.0)],
        vec![stock("inv1", "p1", 3)],
        vec![review("r1", "p1")],
        vec![category("c1")],
    );

    let resolution = fixture.aggregator.resolve(&Lookup::point("missing")).await.unwrap();
    assert!(resolution.is_not_found());
    assert_eq!(fixture.products.calls(), 1);
    assert_eq!(fixture.secondary_calls(), 0);
}

#[tokio::test]
async fn point_lookup_takes_first_price_and_all_reviews() {
    let fixture = Fixture::new(
        vec![product("p1", None)],
        vec![price("a", "p1", 1.0), price("b", "p1", 2.0), price("c", "p2", 3.0)],
        vec![stock("inv1", "p1", 7)],
        vec![review("r1", "p1"), review("r2", "p1"), review("r3", "p9")],
        Vec::new(),
    );

    let view = fixture.aggregator.resolve_point("p1").await.unwrap().expect("view");
    assert_eq!(view.price.map(|price| price.id), Some("a".to_string()));
    assert_eq!(view.inventory.map(|stock| stock.quantity), Some(7));
    let ids: Vec<String> = view.reviews.into_iter().map(|review| review.id).collect();
    assert_eq!(ids, vec!["r1".to_string(), "r2".to_string()]);
}

#[tokio::test]
async fn point_lookup_fails_when_any_fetch_fails() {
    let fixture = Fixture::new(
        vec![product("p1", None)],
        vec![price("price1", "p1", 1.0)],
        Vec::new(),
        Vec::new(),
        Vec::new(),
    );
    fixture.reviews.fail_scans.store(true, Ordering::SeqCst);

    let err = fixture.aggregator.resolve_point("p1").await.unwrap_err();
    assert!(matches!(err, AggregateError::Store(StoreError::Io(_))), "unexpected {err:?}");
}

// ============================================================================
// SECTION: List Lookups
// ============================================================================

#[tokio::test]
async fn list_lookup_joins_by_product_and_hides_orphans() {
    let fixture = Fixture::new(
        vec![product("p1", Some("c1")), product("p2", Some("c2"))],
        vec![price("x", "p1", 5.0), price("orphan", "p404", 1.0)],
        vec![stock("inv2", "p2", 4), stock("inv-orphan", "p404", 9)],
        vec![review("r1", "p1")],
        vec![category("c1"), category("c2")],
    );

    let views = fixture.aggregator.resolve_list(&Default::default()).await.unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].id(), "p1");
    assert_eq!(views[0].price.as_ref().map(|price| price.id.as_str()), Some("x"));
    assert!(views[0].inventory.is_none());
    assert!(views[0].reviews.is_empty(), "list views carry no reviews");
    assert_eq!(views[1].inventory.as_ref().map(|stock| stock.quantity), Some(4));
    assert_eq!(views[1].category.as_ref().map(|category| category.id.as_str()), Some("c2"));
    assert_eq!(fixture.reviews.calls(), 0);
}

#[tokio::test]
async fn list_lookup_with_category_and_limit_truncates_after_filtering() {
    let fixture = Fixture::new(
        vec![product("p1", Some("c1")), product("p2", Some("c1")), product("p3", Some("c2"))],
        Vec::new(),
        Vec::new(),
        Vec::new(),
        vec![category("c1"), category("c2")],
    );

    let resolution =
        fixture.aggregator.resolve(&Lookup::list(Some("c1".to_string()), limit(1))).await.unwrap();
    let Resolution::List(views) = resolution else {
        panic!("expected list resolution");
    };
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].product.category_id.as_deref(), Some("c1"));
}

#[tokio::test]
async fn list_lookup_with_only_limit_caps_results() {
    let fixture = Fixture::new(
        vec![product("p1", None), product("p2", None), product("p3", None)],
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
    );

    let views = fixture.aggregator.resolve(&Lookup::list(None, limit(2))).await.unwrap();
    assert_eq!(views.into_views().len(), 2);
}

#[tokio::test]
async fn list_lookup_fails_when_any_scan_fails() {
    let fixture =
        Fixture::new(vec![product("p1", None)], Vec::new(), Vec::new(), Vec::new(), Vec::new());
    fixture.categories.fail_scans.store(true, Ordering::SeqCst);

    let result = fixture.aggregator.resolve(&Lookup::list(None, None)).await;
    assert!(result.is_err());
    assert!(fixture.aggregator.cache().get().is_none());
}

// ============================================================================
// SECTION: Snapshot Cache
// ============================================================================

#[tokio::test]
async fn unscoped_listing_is_cached_and_served_without_scans() {
    let fixture = Fixture::new(
        vec![product("p1", None), product("p2", None)],
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
    );

    let first = fixture.aggregator.resolve(&Lookup::list(None, None)).await.unwrap();
    let scans_after_first = fixture.total_scans();
    assert_eq!(scans_after_first, 4);

    let second = fixture.aggregator.resolve(&Lookup::list(None, None)).await.unwrap();
    let limited = fixture.aggregator.resolve(&Lookup::list(None, limit(1))).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(limited.into_views().len(), 1);
    assert_eq!(fixture.total_scans(), scans_after_first, "cache hits must not scan");

    let scoped =
        fixture.aggregator.resolve(&Lookup::list(Some("c9".to_string()), None)).await.unwrap();
    assert!(scoped.into_views().is_empty());
    assert!(fixture.total_scans() > scans_after_first, "category lookups bypass the cache");
}

#[tokio::test]
async fn limited_listing_does_not_populate_cache() {
    let fixture =
        Fixture::new(vec![product("p1", None)], Vec::new(), Vec::new(), Vec::new(), Vec::new());

    fixture.aggregator.resolve(&Lookup::list(None, limit(1))).await.unwrap();
    assert!(fixture.aggregator.cache().get().is_none());
}

#[tokio::test]
async fn reseed_forces_recomputation() {
    let fixture = Fixture::with_seed(
        vec![product("old", None)],
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        small_seed(),
    );

    let before = fixture.aggregator.resolve(&Lookup::list(None, None)).await.unwrap();
    assert_eq!(before.into_views().len(), 1);

    fixture.aggregator.reseed().await.unwrap();
    assert!(fixture.aggregator.cache().get().is_none());
    let scans = fixture.total_scans();

    let after = fixture.aggregator.resolve(&Lookup::list(None, None)).await.unwrap().into_views();
    assert!(fixture.total_scans() > scans);
    assert_eq!(after.len(), 32);
    assert!(after.iter().all(|view| view.id() != "old"));
    assert!(after.iter().all(|view| view.price.is_some() && view.inventory.is_some()));
}

// ============================================================================
// SECTION: Reseed
// ============================================================================

#[tokio::test]
async fn reseed_twice_yields_same_ids_and_categories() {
    let fixture =
        Fixture::with_seed(Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new(), small_seed());

    fixture.aggregator.reseed().await.unwrap();
    let first = fixture.products.inner.scan(ScanQuery::all()).await.unwrap();
    fixture.aggregator.reseed().await.unwrap();
    let second = fixture.products.inner.scan(ScanQuery::all()).await.unwrap();

    let shape = |products: Vec<Product>| -> Vec<(String, Option<String>)> {
        products.into_iter().map(|product| (product.id, product.category_id)).collect()
    };
    assert_eq!(shape(first), shape(second));
    assert!(fixture.products.inner.get("p_travel_0").await.unwrap().is_some());
}

#[tokio::test]
async fn reseed_logs_delete_failures_and_continues() {
    let fixture = Fixture::with_seed(
        vec![product("p1", None)],
        vec![price("stale", "p1", 1.0)],
        Vec::new(),
        Vec::new(),
        Vec::new(),
        small_seed(),
    );
    fixture.prices.fail_deletes.store(true, Ordering::SeqCst);

    let report = fixture.aggregator.reseed().await.unwrap();
    assert_eq!(report.wipe_failures, 1);
    assert_eq!(report.products, 32);

    let failures: Vec<EventDetail> = fixture
        .events
        .details()
        .into_iter()
        .filter(|detail| matches!(detail, EventDetail::WipeFailed { .. }))
        .collect();
    assert_eq!(failures.len(), 1);
    match &failures[0] {
        EventDetail::WipeFailed {
            store,
            key,
            ..
        } => {
            assert_eq!(*store, RecordKind::Price);
            assert_eq!(key.as_deref(), Some("stale"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(fixture.prices.inner.get("stale").await.unwrap().is_some());
    assert!(fixture.products.inner.get("p1").await.unwrap().is_none());
    assert!(fixture.products.inner.get("p_home_3").await.unwrap().is_some());
}

#[tokio::test]
async fn reseed_invalidates_before_inserting() {
    let fixture =
        Fixture::with_seed(Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new(), small_seed());

    fixture.aggregator.reseed().await.unwrap();
    let details = fixture.events.details();
    let invalidated = details
        .iter()
        .position(|detail| matches!(detail, EventDetail::CacheInvalidated { .. }))
        .expect("invalidation event");
    let seeded = details
        .iter()
        .position(|detail| matches!(detail, EventDetail::Seeded { .. }))
        .expect("seeded event");
    let last_wipe = details
        .iter()
        .rposition(|detail| matches!(detail, EventDetail::StoreWiped { .. }))
        .expect("wipe events");
    assert!(last_wipe < invalidated);
    assert!(invalidated < seeded);
}
