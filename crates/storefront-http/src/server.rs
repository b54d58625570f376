// crates/storefront-http/src/server.rs
// ============================================================================
// Module: Storefront Server
// Description: HTTP server wiring for every storefront role.
// Purpose: Build role-specific routers from config and serve them with axum.
// Dependencies: axum, tokio, storefront-config, storefront-core,
//               storefront-store-sqlite
// ============================================================================

//! ## Overview
//! [`StorefrontServer`] validates configuration, builds the stores or mesh
//! client its role needs and serves the matching router. Every request passes
//! through the audit middleware and the configured body limit. Security
//! posture: binding to a non-loopback address requires an explicit opt-in in
//! config.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::ConnectInfo;
use axum::extract::DefaultBodyLimit;
use axum::extract::Request;
use axum::extract::State;
use axum::middleware;
use axum::middleware::Next;
use axum::response::Response;
use storefront_config::ServerRole;
use storefront_config::StoreConfig;
use storefront_config::StorefrontConfig;
use storefront_core::CatalogStores;
use storefront_core::EmbeddedAggregator;
use storefront_core::EventSink;
use storefront_core::MeshAggregator;
use storefront_core::StderrEventSink;
use storefront_store_sqlite::open_catalog;
use tokio::net::TcpListener;

use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditEventParams;
use crate::audit::RequestAuditSink;
use crate::audit::audit_sink_from_config;
use crate::mesh::HttpMeshClient;
use crate::routes::aggregator_router;
use crate::routes::service_router;

// ============================================================================
// SECTION: Server
// ============================================================================

/// Storefront HTTP server.
pub struct StorefrontServer {
    /// Role being served.
    role: ServerRole,
    /// Configured bind address.
    bind: SocketAddr,
    /// Fully layered router.
    app: Router,
}

impl StorefrontServer {
    /// Builds a server from configuration, logging aggregator events to
    /// stderr.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or
    /// initialization fails.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, ServerError> {
        Self::with_event_sink(config, Arc::new(StderrEventSink))
    }

    /// Builds a server from configuration with an explicit event sink.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or
    /// initialization fails.
    pub fn with_event_sink(
        mut config: StorefrontConfig,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let role = config.server.role;
        let bind = config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let sink = audit_sink_from_config(&config.server.audit)
            .map_err(|err| ServerError::Init(format!("audit log unavailable: {err}")))?;
        let audit = AuditState {
            role: role.as_str(),
            sink,
        };
        let app = build_routes(&config, events)?
            .layer(middleware::from_fn_with_state(audit, audit_request))
            .layer(DefaultBodyLimit::max(config.server.max_body_bytes));
        Ok(Self {
            role,
            bind,
            app,
        })
    }

    /// Returns the role this server plays.
    #[must_use]
    pub const fn role(&self) -> ServerRole {
        self.role
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Serves requests on the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|err| transport_error("http bind failed", &err))?;
        self.serve_listener(listener).await
    }

    /// Serves requests on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when serving fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        axum::serve(listener, self.app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|err| transport_error("http server failed", &err))
    }
}

/// Wraps a socket error with the failing step, keeping the OS error text.
fn transport_error(context: &str, err: &std::io::Error) -> ServerError {
    ServerError::Transport(format!("{context}: {err}"))
}

// ============================================================================
// SECTION: Role Wiring
// ============================================================================

/// Builds the unlayered router for the configured role.
fn build_routes(
    config: &StorefrontConfig,
    events: Arc<dyn EventSink>,
) -> Result<Router, ServerError> {
    match config.server.role {
        ServerRole::Embedded => {
            let stores = open_stores(&config.store)?;
            let aggregator = EmbeddedAggregator::new(stores, config.seed.clone(), events);
            Ok(aggregator_router(Arc::new(aggregator)))
        }
        ServerRole::Gateway => {
            let client = HttpMeshClient::new(&config.mesh)
                .map_err(|err| ServerError::Init(err.to_string()))?;
            let aggregator = MeshAggregator::new(Arc::new(client), config.seed.clone(), events);
            Ok(aggregator_router(Arc::new(aggregator)))
        }
        role => {
            let dependency = role.dependency().ok_or_else(|| {
                ServerError::Config(format!("role {} serves no mesh service", role.as_str()))
            })?;
            let stores = open_stores(&config.store)?;
            Ok(service_router(dependency, stores, events))
        }
    }
}

/// Opens the record stores selected by `[store]`.
fn open_stores(config: &StoreConfig) -> Result<CatalogStores, ServerError> {
    match config.sqlite() {
        Some(sqlite) => open_catalog(&sqlite).map_err(|err| ServerError::Init(err.to_string())),
        None => Ok(CatalogStores::in_memory()),
    }
}

// ============================================================================
// SECTION: Audit Middleware
// ============================================================================

/// State for the audit middleware.
#[derive(Clone)]
struct AuditState {
    /// Role label recorded on each event.
    role: &'static str,
    /// Destination for events.
    sink: Arc<dyn RequestAuditSink>,
}

/// Records one audit event per request.
async fn audit_request(State(audit): State<AuditState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let peer_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(peer)| peer.ip().to_string());
    let started = Instant::now();
    let response = next.run(request).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    audit.sink.record(&RequestAuditEvent::new(RequestAuditEventParams {
        role: audit.role,
        peer_ip,
        method,
        path,
        status: response.status().as_u16(),
        latency_ms,
    }));
    response
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Storefront server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for server error mapping.
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use std::io;

    use super::*;

    #[test]
    fn transport_errors_keep_io_detail() {
        let err = io::Error::new(io::ErrorKind::ConnectionReset, "peer went away");
        let ServerError::Transport(message) = transport_error("http server failed", &err) else {
            panic!("expected transport error");
        };
        assert_eq!(message, "http server failed: peer went away");
    }
}
