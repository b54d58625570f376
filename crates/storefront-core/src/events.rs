// crates/storefront-core/src/events.rs
// ============================================================================
// Module: Aggregator Events
// Description: Structured events emitted by the aggregators.
// Purpose: Emit JSON-line logs without hard dependencies on a log pipeline.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Aggregators report conditions they deliberately swallow (a failed delete
//! during reseed, a mesh dependency replaced by its fallback) and cache
//! lifecycle changes through an [`EventSink`]. Deployments pick a sink; tests
//! use [`MemoryEventSink`] to assert on what was reported.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::RecordKind;
use crate::interfaces::Dependency;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDetail {
    /// A store scan or delete failed while wiping data for reseed.
    WipeFailed {
        /// Store being wiped.
        store: RecordKind,
        /// Key that failed to delete, when the scan itself succeeded.
        key: Option<String>,
        /// Error message.
        message: String,
    },
    /// A store was wiped.
    StoreWiped {
        /// Store that was wiped.
        store: RecordKind,
        /// Number of records deleted.
        deleted: usize,
    },
    /// A dataset was inserted after a wipe.
    Seeded {
        /// Number of records inserted.
        records: usize,
    },
    /// A mesh dependency failed and its fallback value was used.
    DependencyFallback {
        /// Failing dependency.
        dependency: Dependency,
        /// Product the call was made for.
        product_id: String,
        /// Error message.
        message: String,
    },
    /// The snapshot cache was invalidated.
    CacheInvalidated {
        /// Generation after invalidation.
        generation: u64,
    },
    /// The snapshot cache was populated.
    CachePopulated {
        /// Generation the snapshot belongs to.
        generation: u64,
        /// Number of cached views.
        items: usize,
    },
}

/// Aggregator event envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatorEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event payload.
    #[serde(flatten)]
    pub detail: EventDetail,
}

impl AggregatorEvent {
    /// Creates a new event with a consistent timestamp.
    #[must_use]
    pub fn new(detail: EventDetail) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "aggregator",
            timestamp_ms,
            detail,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for aggregator events.
pub trait EventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &AggregatorEvent);
}

/// Sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl EventSink for StderrEventSink {
    fn record(&self, event: &AggregatorEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// No-op sink.
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&self, _event: &AggregatorEvent) {}
}

/// Sink that keeps events in memory for inspection.
#[derive(Default)]
pub struct MemoryEventSink {
    /// Recorded event payloads.
    events: Mutex<Vec<EventDetail>>,
}

impl MemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded payloads.
    #[must_use]
    pub fn details(&self) -> Vec<EventDetail> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: &AggregatorEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.detail.clone());
        }
    }
}
