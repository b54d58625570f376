// crates/storefront-http/src/lib.rs
// ============================================================================
// Module: Storefront HTTP
// Description: HTTP surfaces for the storefront app, gateway and services.
// Purpose: Serve aggregated product views and mesh services over axum.
// Dependencies: axum, reqwest, storefront-config, storefront-core
// ============================================================================

//! ## Overview
//! This crate exposes every storefront role over HTTP: the embedded app and
//! the gateway share one aggregator router, and each mesh service gets its
//! own router over local stores. [`HttpMeshClient`] is the gateway's
//! reqwest-backed view of the services.

pub mod audit;
pub mod mesh;
pub mod routes;
pub mod server;

pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::RequestAuditSink;
pub use audit::StderrAuditSink;
pub use mesh::HttpMeshClient;
pub use routes::CatalogSeed;
pub use routes::ErrorBody;
pub use routes::SeedBody;
pub use routes::SeedResponse;
pub use routes::aggregator_router;
pub use routes::service_router;
pub use server::ServerError;
pub use server::StorefrontServer;
