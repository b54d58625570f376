// crates/storefront-http/src/audit.rs
// ============================================================================
// Module: Request Audit Logging
// Description: Structured audit events for HTTP request handling.
// Purpose: Emit one JSON line per request without hard dependencies.
// Dependencies: serde, serde_json, storefront-config
// ============================================================================

//! ## Overview
//! This module defines the per-request audit payload and the sinks it can be
//! routed to. Sinks are chosen from `[server.audit]`: disabled audit uses the
//! no-op sink, a configured path appends JSON lines to that file and the
//! default writes them to stderr.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use storefront_config::ServerAuditConfig;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Role of the server that handled the request.
    pub role: &'static str,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// HTTP method.
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    /// Response status code.
    pub status: u16,
    /// Handling latency in milliseconds.
    pub latency_ms: u64,
}

/// Inputs for [`RequestAuditEvent::new`].
pub struct RequestAuditEventParams {
    /// Role of the server that handled the request.
    pub role: &'static str,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// HTTP method.
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    /// Response status code.
    pub status: u16,
    /// Handling latency in milliseconds.
    pub latency_ms: u64,
}

impl RequestAuditEvent {
    /// Creates a new audit event stamped with the current time.
    #[must_use]
    pub fn new(params: RequestAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "http_request",
            timestamp_ms,
            role: params.role,
            peer_ip: params.peer_ip,
            method: params.method,
            path: params.path,
            status: params.status,
            latency_ms: params.latency_ms,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for request audit events.
pub trait RequestAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &RequestAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl RequestAuditSink for StderrAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl RequestAuditSink for FileAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl RequestAuditSink for NoopAuditSink {
    fn record(&self, _event: &RequestAuditEvent) {}
}

/// Builds the audit sink selected by configuration.
///
/// # Errors
///
/// Returns an error when the configured audit file cannot be opened.
pub fn audit_sink_from_config(config: &ServerAuditConfig) -> io::Result<Arc<dyn RequestAuditSink>> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &config.path {
        Some(path) => Ok(Arc::new(FileAuditSink::new(Path::new(path))?)),
        None => Ok(Arc::new(StderrAuditSink)),
    }
}
