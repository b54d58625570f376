// crates/storefront-http/src/routes.rs
// ============================================================================
// Module: Storefront Routes
// Description: axum routers for the storefront app, gateway and mesh services.
// Purpose: Map HTTP requests onto aggregator lookups and per-service stores.
// Dependencies: axum, serde, storefront-core, tokio
// ============================================================================

//! ## Overview
//! Two router families live here:
//! - [`aggregator_router`] serves merged product views from any
//!   [`Aggregator`]. The embedded app answers a missing id with `200 null`;
//!   the gateway answers it with `404 {"error": "Product not found"}`.
//! - [`service_router`] serves one mesh service (catalog, inventory, pricing
//!   or reviews) from local record stores.
//!
//! Aggregator work runs on a spawned task so a client disconnect does not
//! cancel fetches that were already issued.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use storefront_core::AggregateError;
use storefront_core::Aggregator;
use storefront_core::AggregatorKind;
use storefront_core::Attribute;
use storefront_core::CatalogStores;
use storefront_core::Category;
use storefront_core::Dependency;
use storefront_core::EventSink;
use storefront_core::InventoryRecord;
use storefront_core::Lookup;
use storefront_core::PriceRecord;
use storefront_core::Product;
use storefront_core::Record;
use storefront_core::Resolution;
use storefront_core::ReviewRecord;
use storefront_core::ScanQuery;
use storefront_core::SeedReport;
use storefront_core::SharedStore;
use storefront_core::StoreError;
use storefront_core::first_or_none;
use storefront_core::replace_records;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Body accepted by a service's `POST /seed`.
///
/// A missing `data` field wipes the service without inserting anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedBody<T> {
    /// Records replacing the service's contents.
    #[serde(default)]
    pub data: Option<T>,
}

/// Catalog service seed payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    /// Category records.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Product records.
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Response body for a successful reseed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResponse {
    /// Always `success`.
    pub status: String,
    /// Human-readable summary.
    pub message: String,
    /// Counts reported by the aggregator.
    pub products: usize,
    /// Total records generated.
    pub records: usize,
}

/// Error body returned on failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error message.
    pub error: String,
}

/// Query parameters accepted by list routes.
#[derive(Debug, Default, Deserialize)]
struct LookupParams {
    /// Product id; turns the request into a point lookup.
    id: Option<String>,
    /// Category filter.
    category_id: Option<String>,
    /// Positive result limit.
    limit: Option<String>,
}

/// Query parameters accepted by the catalog service's product listing.
#[derive(Debug, Default, Deserialize)]
struct CatalogParams {
    /// Category filter.
    category_id: Option<String>,
}

// ============================================================================
// SECTION: Aggregator Routes
// ============================================================================

/// Shared state for aggregator handlers.
#[derive(Clone)]
struct AggregatorState {
    /// Aggregator resolving lookups.
    aggregator: Arc<dyn Aggregator>,
}

/// Builds the router for the embedded app or the gateway.
#[must_use]
pub fn aggregator_router(aggregator: Arc<dyn Aggregator>) -> Router {
    let state = AggregatorState {
        aggregator,
    };
    Router::new()
        .route("/catalog", get(list_products))
        .route("/products", get(list_products))
        .route("/catalog/{id}", get(get_product))
        .route("/products/{id}", get(get_product))
        .route("/seed", post(reseed))
        .route("/health", get(health))
        .with_state(state)
}

/// Handles list lookups.
async fn list_products(
    State(state): State<AggregatorState>,
    Query(params): Query<LookupParams>,
) -> Response {
    let lookup = Lookup::from_params(
        params.id.as_deref(),
        params.category_id.as_deref(),
        params.limit.as_deref(),
    );
    match lookup {
        Ok(lookup) => resolve(&state, lookup).await,
        Err(err) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
    }
}

/// Handles point lookups.
async fn get_product(State(state): State<AggregatorState>, Path(id): Path<String>) -> Response {
    resolve(&state, Lookup::point(id)).await
}

/// Resolves a lookup on a spawned task and renders the result.
async fn resolve(state: &AggregatorState, lookup: Lookup) -> Response {
    let kind = state.aggregator.kind();
    let aggregator = Arc::clone(&state.aggregator);
    let task = tokio::spawn(async move { aggregator.resolve(&lookup).await });
    match task.await {
        Ok(Ok(resolution)) => render_resolution(kind, &resolution),
        Ok(Err(err)) => aggregate_error_response(&err),
        Err(err) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("lookup task failed: {err}"))
        }
    }
}

/// Renders a resolution; the gateway maps not-found to 404.
fn render_resolution(kind: AggregatorKind, resolution: &Resolution) -> Response {
    if kind == AggregatorKind::Mesh && resolution.is_not_found() {
        return error_response(StatusCode::NOT_FOUND, "Product not found");
    }
    (StatusCode::OK, Json(resolution)).into_response()
}

/// Handles `POST /seed`.
async fn reseed(State(state): State<AggregatorState>) -> Response {
    let kind = state.aggregator.kind();
    let aggregator = Arc::clone(&state.aggregator);
    let task = tokio::spawn(async move { aggregator.reseed().await });
    match task.await {
        Ok(Ok(report)) => (StatusCode::OK, Json(seed_response(kind, &report))).into_response(),
        Ok(Err(err)) => aggregate_error_response(&err),
        Err(err) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("seed task failed: {err}"))
        }
    }
}

/// Builds the reseed response body.
fn seed_response(kind: AggregatorKind, report: &SeedReport) -> SeedResponse {
    let message = match kind {
        AggregatorKind::Embedded => "Database seeded correctly".to_string(),
        AggregatorKind::Mesh => format!("All services seeded with {} items", report.products),
    };
    SeedResponse {
        status: "success".to_string(),
        message,
        products: report.products,
        records: report.records,
    }
}

/// Maps aggregation failures to a 500 response.
fn aggregate_error_response(err: &AggregateError) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

// ============================================================================
// SECTION: Service Routes
// ============================================================================

/// Shared state for mesh service handlers.
#[derive(Clone)]
struct ServiceState {
    /// Stores backing the service.
    stores: CatalogStores,
    /// Sink for wipe events during seeding.
    events: Arc<dyn EventSink>,
}

/// Builds the router for one mesh service.
#[must_use]
pub fn service_router(
    dependency: Dependency,
    stores: CatalogStores,
    events: Arc<dyn EventSink>,
) -> Router {
    let state = ServiceState {
        stores,
        events,
    };
    let router = match dependency {
        Dependency::Catalog => Router::new()
            .route("/products", get(catalog_products))
            .route("/products/{id}", get(catalog_product))
            .route("/categories/{id}", get(catalog_category))
            .route("/seed", post(seed_catalog)),
        Dependency::Inventory => Router::new()
            .route("/inventory/{product_id}", get(inventory_for))
            .route("/seed", post(seed_inventory)),
        Dependency::Pricing => Router::new()
            .route("/prices/{product_id}", get(price_for))
            .route("/seed", post(seed_prices)),
        Dependency::Reviews => Router::new()
            .route("/reviews/{product_id}", get(reviews_for))
            .route("/seed", post(seed_reviews)),
    };
    router.route("/health", get(health)).with_state(state)
}

/// Lists catalog products, optionally by category.
async fn catalog_products(
    State(state): State<ServiceState>,
    Query(params): Query<CatalogParams>,
) -> Response {
    let query = match params.category_id.filter(|category_id| !category_id.is_empty()) {
        Some(category_id) => ScanQuery::matching(Attribute::CategoryId, category_id),
        None => ScanQuery::all(),
    };
    json_or_error(state.stores.products.scan(query).await)
}

/// Fetches one catalog product; `null` when absent.
async fn catalog_product(State(state): State<ServiceState>, Path(id): Path<String>) -> Response {
    json_or_error(state.stores.products.get(&id).await)
}

/// Fetches one category; `null` when absent.
async fn catalog_category(State(state): State<ServiceState>, Path(id): Path<String>) -> Response {
    json_or_error(state.stores.categories.get(&id).await)
}

/// Fetches the first inventory record for a product.
async fn inventory_for(
    State(state): State<ServiceState>,
    Path(product_id): Path<String>,
) -> Response {
    json_or_error(first_for_product(&state.stores.inventory, &product_id).await)
}

/// Fetches the first price record for a product.
async fn price_for(State(state): State<ServiceState>, Path(product_id): Path<String>) -> Response {
    json_or_error(first_for_product(&state.stores.prices, &product_id).await)
}

/// Fetches every review for a product.
async fn reviews_for(
    State(state): State<ServiceState>,
    Path(product_id): Path<String>,
) -> Response {
    let query = ScanQuery::matching(Attribute::ProductId, product_id);
    json_or_error(state.stores.reviews.scan(query).await)
}

/// Replaces the catalog's categories and products.
async fn seed_catalog(
    State(state): State<ServiceState>,
    Json(body): Json<SeedBody<CatalogSeed>>,
) -> Response {
    let CatalogSeed {
        categories,
        products,
    } = body.data.unwrap_or_default();
    let events = state.events.as_ref();
    let result = tokio::try_join!(
        replace_records(&state.stores.categories, categories, events),
        replace_records(&state.stores.products, products, events),
    );
    seed_reply(Dependency::Catalog, result.map(|(categories, products)| categories + products))
}

/// Replaces the inventory service's records.
async fn seed_inventory(
    State(state): State<ServiceState>,
    Json(body): Json<SeedBody<Vec<InventoryRecord>>>,
) -> Response {
    let records = body.data.unwrap_or_default();
    let result = replace_records(&state.stores.inventory, records, state.events.as_ref()).await;
    seed_reply(Dependency::Inventory, result)
}

/// Replaces the pricing service's records.
async fn seed_prices(
    State(state): State<ServiceState>,
    Json(body): Json<SeedBody<Vec<PriceRecord>>>,
) -> Response {
    let records = body.data.unwrap_or_default();
    let result = replace_records(&state.stores.prices, records, state.events.as_ref()).await;
    seed_reply(Dependency::Pricing, result)
}

/// Replaces the reviews service's records.
async fn seed_reviews(
    State(state): State<ServiceState>,
    Json(body): Json<SeedBody<Vec<ReviewRecord>>>,
) -> Response {
    let records = body.data.unwrap_or_default();
    let result = replace_records(&state.stores.reviews, records, state.events.as_ref()).await;
    seed_reply(Dependency::Reviews, result)
}

/// Renders a service seed outcome.
fn seed_reply(dependency: Dependency, result: Result<usize, StoreError>) -> Response {
    match result {
        Ok(wipe_failures) => {
            let body = json!({
                "message": format!("{} seeded", dependency.as_str()),
                "wipe_failures": wipe_failures,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// Returns the first record matching a product id, if any.
async fn first_for_product<R: Record>(
    store: &SharedStore<R>,
    product_id: &str,
) -> Result<Option<R>, StoreError> {
    let query = ScanQuery::matching(Attribute::ProductId, product_id).with_limit(Some(1));
    Ok(first_or_none(store.scan(query).await?))
}

// ============================================================================
// SECTION: Shared Handlers
// ============================================================================

/// Liveness probe.
async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Renders a store result as JSON or a 500 error.
fn json_or_error<T: Serialize>(result: Result<T, StoreError>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// Builds an `{"error": message}` response.
fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        error: message.into(),
    };
    (status, Json(body)).into_response()
}
