// crates/storefront-core/src/runtime/mesh.rs
// ============================================================================
// Module: Mesh Aggregator
// Description: Aggregator fanning out to the catalog, inventory, pricing and
//              reviews services.
// Purpose: Resolve lookups with per-dependency fallbacks.
// Dependencies: crate::core, crate::interfaces, crate::events, tokio
// ============================================================================

//! ## Overview
//! The mesh aggregator treats the catalog service as the primary source: a
//! catalog failure fails the lookup. Every other call for a product runs
//! concurrently and settles into a [`Fallback`], so an outage of pricing,
//! inventory or reviews degrades the view instead of failing it:
//!
//! | Dependency | Fallback |
//! |---|---|
//! | pricing | `price: null` |
//! | inventory | zero-quantity record |
//! | reviews | `[]` |
//! | catalog (category) | `category: null` |
//!
//! List lookups resolve each listed product with the same fan-out on its own
//! task. There is no listing cache.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::core::InventoryRecord;
use crate::core::ListQuery;
use crate::core::Lookup;
use crate::core::MergedView;
use crate::core::Product;
use crate::core::Resolution;
use crate::core::merge_view;
use crate::events::AggregatorEvent;
use crate::events::EventDetail;
use crate::events::EventSink;
use crate::interfaces::Dependency;
use crate::interfaces::MeshClient;
use crate::interfaces::MeshError;
use crate::runtime::aggregator::AggregateError;
use crate::runtime::aggregator::Aggregator;
use crate::runtime::aggregator::AggregatorKind;
use crate::runtime::aggregator::SeedReport;
use crate::runtime::seed::SeedConfig;
use crate::runtime::seed::generate_dataset;

// ============================================================================
// SECTION: Fallback
// ============================================================================

/// Outcome of a dependency call that may be replaced by a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback<T> {
    /// The dependency answered.
    Fetched(T),
    /// The dependency failed and the default was substituted.
    Defaulted(T),
}

impl<T> Fallback<T> {
    /// Settles a call result, substituting `default` on failure.
    ///
    /// Failures are reported to `events` before being discarded.
    pub fn settle(
        result: Result<T, MeshError>,
        dependency: Dependency,
        product_id: &str,
        events: &dyn EventSink,
        default: impl FnOnce() -> T,
    ) -> Self {
        match result {
            Ok(value) => Self::Fetched(value),
            Err(err) => {
                events.record(&AggregatorEvent::new(EventDetail::DependencyFallback {
                    dependency,
                    product_id: product_id.to_string(),
                    message: err.to_string(),
                }));
                Self::Defaulted(default())
            }
        }
    }

    /// Returns true when the default was substituted.
    #[must_use]
    pub const fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted(_))
    }

    /// Returns the settled value.
    pub fn into_inner(self) -> T {
        match self {
            Self::Fetched(value) | Self::Defaulted(value) => value,
        }
    }
}

// ============================================================================
// SECTION: Mesh Aggregator
// ============================================================================

/// Aggregator over the HTTP service mesh.
pub struct MeshAggregator {
    /// Client for the four services.
    client: Arc<dyn MeshClient>,
    /// Seed generator configuration.
    seed: SeedConfig,
    /// Event sink for fallbacks.
    events: Arc<dyn EventSink>,
}

impl MeshAggregator {
    /// Creates an aggregator over `client`.
    #[must_use]
    pub fn new(client: Arc<dyn MeshClient>, seed: SeedConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            client,
            seed,
            events,
        }
    }

    /// Resolves a point lookup.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Mesh`] when the catalog call fails.
    pub async fn resolve_point(&self, id: &str) -> Result<Option<MergedView>, AggregateError> {
        let Some(product) = self.client.product(id).await? else {
            return Ok(None);
        };
        let view = enrich(Arc::clone(&self.client), Arc::clone(&self.events), product).await;
        Ok(Some(view))
    }

    /// Resolves a list lookup.
    ///
    /// Products are listed by the catalog service and truncated to the limit
    /// before any secondary call is made.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Mesh`] when the catalog call fails, or
    /// [`AggregateError::Task`] when a fan-out task is lost.
    pub async fn resolve_list(&self, query: &ListQuery) -> Result<Vec<MergedView>, AggregateError> {
        let mut products = self.client.products(query.category_id.as_deref()).await?;
        if let Some(limit) = query.limit.map(NonZeroUsize::get) {
            products.truncate(limit);
        }

        let mut tasks = JoinSet::new();
        let count = products.len();
        for (index, product) in products.into_iter().enumerate() {
            let client = Arc::clone(&self.client);
            let events = Arc::clone(&self.events);
            tasks.spawn(async move { (index, enrich(client, events, product).await) });
        }
        let mut slots: Vec<Option<MergedView>> = vec![None; count];
        while let Some(joined) = tasks.join_next().await {
            let (index, view) = joined.map_err(|err| AggregateError::Task(err.to_string()))?;
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(view);
            }
        }
        Ok(slots.into_iter().flatten().collect())
    }
}

#[async_trait]
impl Aggregator for MeshAggregator {
    fn kind(&self) -> AggregatorKind {
        AggregatorKind::Mesh
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
        let dataset = generate_dataset(&self.seed);
        let seed_one = |dependency: Dependency| {
            let dataset = &dataset;
            async move {
                self.client.seed(dependency, dataset).await.map_err(|err| {
                    AggregateError::Seed(format!("{} service: {err}", dependency.as_str()))
                })
            }
        };
        tokio::try_join!(
            seed_one(Dependency::Catalog),
            seed_one(Dependency::Inventory),
            seed_one(Dependency::Pricing),
            seed_one(Dependency::Reviews),
        )?;
        let report = SeedReport {
            products: dataset.products.len(),
            records: dataset.total_records(),
            wipe_failures: 0,
        };
        self.events.record(&AggregatorEvent::new(EventDetail::Seeded {
            records: report.records,
        }));
        Ok(report)
    }
}

// ============================================================================
// SECTION: Fan-Out
// ============================================================================

/// Fetches a product's secondary records concurrently and merges them.
///
/// Never fails: each dependency settles into its fallback.
async fn enrich(
    client: Arc<dyn MeshClient>,
    events: Arc<dyn EventSink>,
    product: Product,
) -> MergedView {
    let id = product.id.as_str();
    let category_fetch = async {
        match product.category_id.as_deref() {
            Some(category_id) => client.category(category_id).await,
            None => Ok(None),
        }
    };
    let (price, inventory, reviews, category) = tokio::join!(
        client.price(id),
        client.inventory(id),
        client.reviews(id),
        category_fetch,
    );

    let events = events.as_ref();
    let price = Fallback::settle(price, Dependency::Pricing, id, events, || None).into_inner();
    let inventory = Fallback::settle(
        inventory.map(|found| found.unwrap_or_else(|| InventoryRecord::zero(id))),
        Dependency::Inventory,
        id,
        events,
        || InventoryRecord::zero(id),
    )
    .into_inner();
    let reviews = Fallback::settle(reviews, Dependency::Reviews, id, events, Vec::new).into_inner();
    let category =
        Fallback::settle(category, Dependency::Catalog, id, events, || None).into_inner();
    merge_view(product, price, Some(inventory), reviews, category)
}
