// crates/storefront-core/src/runtime/embedded.rs
// ============================================================================
// Module: Embedded Aggregator
// Description: Aggregator joining records from locally owned stores.
// Purpose: Resolve lookups with all-or-nothing fan-out and a snapshot cache.
// Dependencies: crate::core, crate::interfaces, crate::runtime, tokio
// ============================================================================

//! ## Overview
//! The embedded aggregator owns all five stores. Point lookups fetch the
//! product, then join its price, inventory, reviews and category with one
//! concurrent fan-out. List lookups scan products alongside full scans of
//! prices, inventory and categories and join them in memory, so the cost is
//! four scans regardless of result size. Any store failure fails the lookup.
//!
//! An unscoped listing (no category, no limit) is memoized in a
//! [`SnapshotCache`] and reused by later listings without a category filter
//! until the next reseed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::Attribute;
use crate::core::ListQuery;
use crate::core::Lookup;
use crate::core::MergedView;
use crate::core::Record;
use crate::core::Resolution;
use crate::core::SeedDataset;
use crate::core::first_or_none;
use crate::core::index_by_key;
use crate::core::index_first_by;
use crate::core::merge_view;
use crate::events::AggregatorEvent;
use crate::events::EventDetail;
use crate::events::EventSink;
use crate::interfaces::CatalogStores;
use crate::interfaces::ScanQuery;
use crate::interfaces::SharedStore;
use crate::interfaces::StoreError;
use crate::runtime::aggregator::AggregateError;
use crate::runtime::aggregator::Aggregator;
use crate::runtime::aggregator::AggregatorKind;
use crate::runtime::aggregator::SeedReport;
use crate::runtime::cache::SnapshotCache;
use crate::runtime::seed::SeedConfig;
use crate::runtime::seed::generate_dataset;

// ============================================================================
// SECTION: Embedded Aggregator
// ============================================================================

/// Aggregator over locally owned stores.
pub struct EmbeddedAggregator {
    /// Backing stores.
    stores: CatalogStores,
    /// Unscoped listing cache.
    cache: SnapshotCache,
    /// Seed generator configuration.
    seed: SeedConfig,
    /// Event sink for swallowed failures and cache changes.
    events: Arc<dyn EventSink>,
}

impl EmbeddedAggregator {
    /// Creates an aggregator over `stores`.
    #[must_use]
    pub fn new(stores: CatalogStores, seed: SeedConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            stores,
            cache: SnapshotCache::new(),
            seed,
            events,
        }
    }

    /// Returns the backing stores.
    #[must_use]
    pub const fn stores(&self) -> &CatalogStores {
        &self.stores
    }

    /// Returns the snapshot cache.
    #[must_use]
    pub const fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Resolves a point lookup.
    ///
    /// Returns `Ok(None)` without touching secondary stores when the product
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Store`] when any fetch fails.
    pub async fn resolve_point(&self, id: &str) -> Result<Option<MergedView>, AggregateError> {
        let Some(product) = self.stores.products.get(id).await? else {
            return Ok(None);
        };
        let category_fetch = async {
            match product.category_id.as_deref() {
                Some(category_id) => self.stores.categories.get(category_id).await,
                None => Ok(None),
            }
        };
        let (prices, inventory, reviews, category) = tokio::try_join!(
            self.stores.prices.scan(ScanQuery::matching(Attribute::ProductId, id)),
            self.stores.inventory.scan(ScanQuery::matching(Attribute::ProductId, id)),
            self.stores.reviews.scan(ScanQuery::matching(Attribute::ProductId, id)),
            category_fetch,
        )?;
        Ok(Some(merge_view(
            product,
            first_or_none(prices),
            first_or_none(inventory),
            reviews,
            category,
        )))
    }

    /// Resolves a list lookup.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Store`] when any scan fails.
    pub async fn resolve_list(&self, query: &ListQuery) -> Result<Vec<MergedView>, AggregateError> {
        let limit = query.limit.map(NonZeroUsize::get);
        if query.category_id.is_none()
            && let Some(snapshot) = self.cache.get()
        {
            return Ok(snapshot.truncated(limit));
        }

        let generation = self.cache.generation();
        let product_scan = match &query.category_id {
            Some(category_id) => ScanQuery::matching(Attribute::CategoryId, category_id.clone()),
            None => ScanQuery::all().with_limit(limit),
        };
        let (products, prices, inventory, categories) = tokio::try_join!(
            self.stores.products.scan(product_scan),
            self.stores.prices.scan(ScanQuery::all()),
            self.stores.inventory.scan(ScanQuery::all()),
            self.stores.categories.scan(ScanQuery::all()),
        )?;

        let mut prices = index_first_by(prices, Attribute::ProductId);
        let mut inventory = index_first_by(inventory, Attribute::ProductId);
        let categories = index_by_key(categories);
        let mut views: Vec<MergedView> = products
            .into_iter()
            .map(|product| {
                let price = prices.remove(&product.id);
                let stock = inventory.remove(&product.id);
                let category =
                    product.category_id.as_ref().and_then(|id| categories.get(id)).cloned();
                merge_view(product, price, stock, Vec::new(), category)
            })
            .collect();

        if query.category_id.is_some()
            && let Some(limit) = limit
        {
            views.truncate(limit);
        }
        if query.is_unscoped() && self.cache.store(generation, views.clone()) {
            self.emit(EventDetail::CachePopulated {
                generation,
                items: views.len(),
            });
        }
        Ok(views)
    }

    /// Deletes every record from every store, logging and skipping failures.
    ///
    /// Returns the number of failures.
    async fn wipe(&self) -> usize {
        let events = self.events.as_ref();
        let (products, prices, inventory, reviews, categories) = tokio::join!(
            wipe_store(&self.stores.products, events),
            wipe_store(&self.stores.prices, events),
            wipe_store(&self.stores.inventory, events),
            wipe_store(&self.stores.reviews, events),
            wipe_store(&self.stores.categories, events),
        );
        products + prices + inventory + reviews + categories
    }

    /// Inserts a dataset into the stores.
    async fn insert(&self, dataset: SeedDataset) -> Result<(), StoreError> {
        let SeedDataset {
            categories,
            products,
            prices,
            inventory,
            reviews,
        } = dataset;
        tokio::try_join!(
            self.stores.categories.put_many(categories),
            self.stores.products.put_many(products),
            self.stores.prices.put_many(prices),
            self.stores.inventory.put_many(inventory),
            self.stores.reviews.put_many(reviews),
        )?;
        Ok(())
    }

    /// Records an event.
    fn emit(&self, detail: EventDetail) {
        self.events.record(&AggregatorEvent::new(detail));
    }
}

#[async_trait]
impl Aggregator for EmbeddedAggregator {
    fn kind(&self) -> AggregatorKind {
        AggregatorKind::Embedded
    }

    async fn resolve(&self, lookup: &Lookup) -> Result<Resolution, AggregateError> {
        match lookup {
            Lookup::Point {
                id,
            } => self.resolve_point(id).await.map(Resolution::item),
            Lookup::List(query) => self.resolve_list(query).await.map(Resolution::List),
        }
    }

    async fn reseed(&self) -> Result<SeedReport, AggregateError> {
        let wipe_failures = self.wipe().await;
        let generation = self.cache.invalidate();
        self.emit(EventDetail::CacheInvalidated {
            generation,
        });

        let dataset = generate_dataset(&self.seed);
        let report = SeedReport {
            products: dataset.products.len(),
            records: dataset.total_records(),
            wipe_failures,
        };
        self.insert(dataset).await.map_err(|err| AggregateError::Seed(err.to_string()))?;
        // Listings computed while the insert was in flight saw partial data.
        let generation = self.cache.invalidate();
        self.emit(EventDetail::CacheInvalidated {
            generation,
        });
        self.emit(EventDetail::Seeded {
            records: report.records,
        });
        Ok(report)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Scans a store and deletes every record, one key at a time.
///
/// Returns the number of failures, each reported to `events`. Failures
/// never abort the wipe.
pub async fn wipe_store<R: Record>(store: &SharedStore<R>, events: &dyn EventSink) -> usize {
    let records = match store.scan(ScanQuery::all()).await {
        Ok(records) => records,
        Err(err) => {
            events.record(&AggregatorEvent::new(EventDetail::WipeFailed {
                store: R::KIND,
                key: None,
                message: err.to_string(),
            }));
            return 1;
        }
    };
    let mut failures = 0;
    let mut deleted = 0;
    for record in records {
        match store.delete(record.key()).await {
            Ok(()) => deleted += 1,
            Err(err) => {
                failures += 1;
                events.record(&AggregatorEvent::new(EventDetail::WipeFailed {
                    store: R::KIND,
                    key: Some(record.key().to_string()),
                    message: err.to_string(),
                }));
            }
        }
    }
    events.record(&AggregatorEvent::new(EventDetail::StoreWiped {
        store: R::KIND,
        deleted,
    }));
    failures
}

/// Wipes a store and inserts `records` in its place.
///
/// Returns the number of wipe failures, as for [`wipe_store`].
///
/// # Errors
///
/// Returns [`StoreError`] when inserting the new records fails.
pub async fn replace_records<R: Record>(
    store: &SharedStore<R>,
    records: Vec<R>,
    events: &dyn EventSink,
) -> Result<usize, StoreError> {
    let failures = wipe_store(store, events).await;
    store.put_many(records).await?;
    Ok(failures)
}
