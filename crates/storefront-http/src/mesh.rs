// crates/storefront-http/src/mesh.rs
// ============================================================================
// Module: HTTP Mesh Client
// Description: reqwest-backed client for the catalog, inventory, pricing and
//              reviews services.
// Purpose: Implement the mesh collaborator contract over HTTP.
// Dependencies: reqwest, url, storefront-config, storefront-core
// ============================================================================

//! ## Overview
//! [`HttpMeshClient`] issues one HTTP call per mesh operation against the
//! base URLs from `[mesh]`. Path segments are percent-encoded through
//! [`url::Url`]. A request timeout applies only when configured; otherwise a
//! stalled service stalls the call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use storefront_config::MeshConfig;
use storefront_core::Category;
use storefront_core::Dependency;
use storefront_core::InventoryRecord;
use storefront_core::MeshClient;
use storefront_core::MeshError;
use storefront_core::PriceRecord;
use storefront_core::Product;
use storefront_core::ReviewRecord;
use storefront_core::SeedDataset;
use url::Url;

use crate::routes::CatalogSeed;
use crate::routes::SeedBody;

// ============================================================================
// SECTION: Client
// ============================================================================

/// Mesh client that talks to the services over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMeshClient {
    /// Shared HTTP client.
    client: Client,
    /// Catalog service base URL.
    catalog: Url,
    /// Inventory service base URL.
    inventory: Url,
    /// Pricing service base URL.
    pricing: Url,
    /// Reviews service base URL.
    reviews: Url,
}

impl HttpMeshClient {
    /// Builds a client from mesh configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Transport`] when a base URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: &MeshConfig) -> Result<Self, MeshError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|err| MeshError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            catalog: parse_base(config.url(Dependency::Catalog))?,
            inventory: parse_base(config.url(Dependency::Inventory))?,
            pricing: parse_base(config.url(Dependency::Pricing))?,
            reviews: parse_base(config.url(Dependency::Reviews))?,
        })
    }

    /// Returns the base URL for a service.
    const fn base(&self, dependency: Dependency) -> &Url {
        match dependency {
            Dependency::Catalog => &self.catalog,
            Dependency::Inventory => &self.inventory,
            Dependency::Pricing => &self.pricing,
            Dependency::Reviews => &self.reviews,
        }
    }

    /// Builds a service URL from path segments and query pairs.
    fn endpoint(
        &self,
        dependency: Dependency,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Url, MeshError> {
        let mut url = self.base(dependency).clone();
        url.path_segments_mut()
            .map_err(|()| {
                MeshError::Transport(format!("{} url cannot be a base", dependency.as_str()))
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Issues a GET and decodes the JSON response.
    async fn get_json<T: DeserializeOwned>(
        &self,
        dependency: Dependency,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, MeshError> {
        let url = self.endpoint(dependency, segments, query)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| MeshError::Transport(format!("{}: {err}", dependency.as_str())))?;
        let response = check_status(dependency, response)?;
        response
            .json::<T>()
            .await
            .map_err(|err| MeshError::Decode(format!("{}: {err}", dependency.as_str())))
    }

    /// Issues a POST with a JSON body, ignoring the response body.
    async fn post_json<B: Serialize + Sync>(
        &self,
        dependency: Dependency,
        segments: &[&str],
        body: &B,
    ) -> Result<(), MeshError> {
        let url = self.endpoint(dependency, segments, &[])?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| MeshError::Transport(format!("{}: {err}", dependency.as_str())))?;
        check_status(dependency, response)?;
        Ok(())
    }
}

#[async_trait]
impl MeshClient for HttpMeshClient {
    async fn product(&self, id: &str) -> Result<Option<Product>, MeshError> {
        self.get_json(Dependency::Catalog, &["products", id], &[]).await
    }

    async fn products(&self, category_id: Option<&str>) -> Result<Vec<Product>, MeshError> {
        match category_id {
            Some(category_id) => {
                self.get_json(Dependency::Catalog, &["products"], &[("category_id", category_id)])
                    .await
            }
            None => self.get_json(Dependency::Catalog, &["products"], &[]).await,
        }
    }

    async fn category(&self, id: &str) -> Result<Option<Category>, MeshError> {
        self.get_json(Dependency::Catalog, &["categories", id], &[]).await
    }

    async fn price(&self, product_id: &str) -> Result<Option<PriceRecord>, MeshError> {
        self.get_json(Dependency::Pricing, &["prices", product_id], &[]).await
    }

    async fn inventory(&self, product_id: &str) -> Result<Option<InventoryRecord>, MeshError> {
        self.get_json(Dependency::Inventory, &["inventory", product_id], &[]).await
    }

    async fn reviews(&self, product_id: &str) -> Result<Vec<ReviewRecord>, MeshError> {
        self.get_json(Dependency::Reviews, &["reviews", product_id], &[]).await
    }

    async fn seed(&self, dependency: Dependency, dataset: &SeedDataset) -> Result<(), MeshError> {
        match dependency {
            Dependency::Catalog => {
                let body = SeedBody {
                    data: Some(CatalogSeed {
                        categories: dataset.categories.clone(),
                        products: dataset.products.clone(),
                    }),
                };
                self.post_json(dependency, &["seed"], &body).await
            }
            Dependency::Inventory => {
                let body = SeedBody {
                    data: Some(&dataset.inventory),
                };
                self.post_json(dependency, &["seed"], &body).await
            }
            Dependency::Pricing => {
                let body = SeedBody {
                    data: Some(&dataset.prices),
                };
                self.post_json(dependency, &["seed"], &body).await
            }
            Dependency::Reviews => {
                let body = SeedBody {
                    data: Some(&dataset.reviews),
                };
                self.post_json(dependency, &["seed"], &body).await
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a configured base URL.
fn parse_base(raw: &str) -> Result<Url, MeshError> {
    Url::parse(raw).map_err(|err| MeshError::Transport(format!("invalid mesh url {raw}: {err}")))
}

/// Maps non-success responses to [`MeshError::Status`].
fn check_status(
    dependency: Dependency,
    response: reqwest::Response,
) -> Result<reqwest::Response, MeshError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(MeshError::Status(format!("{} returned {status}", dependency.as_str())))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
