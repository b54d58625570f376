// crates/storefront-core/src/runtime/cache.rs
// ============================================================================
// Module: Snapshot Cache
// Description: Memoized unscoped catalog listing with generation tracking.
// Purpose: Serve the unfiltered product list without rescanning stores.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The cache holds at most one immutable snapshot of merged views plus a
//! generation counter. Invalidation bumps the generation and drops the
//! snapshot. A result computed under an older generation is never installed,
//! so a listing that raced a reseed cannot resurrect pre-reseed data.
//! Concurrent writers under the same generation race; the last write wins.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::core::MergedView;

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Immutable cached listing.
#[derive(Debug)]
pub struct Snapshot {
    /// Generation the snapshot was computed under.
    pub generation: u64,
    /// Cached views in product scan order.
    pub views: Vec<MergedView>,
}

impl Snapshot {
    /// Returns the first `limit` views, or all views when `limit` is `None`.
    #[must_use]
    pub fn truncated(&self, limit: Option<usize>) -> Vec<MergedView> {
        match limit {
            Some(limit) => self.views.iter().take(limit).cloned().collect(),
            None => self.views.clone(),
        }
    }
}

/// Single-slot snapshot cache owned by an aggregator.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    /// Current generation; bumped on every invalidation.
    generation: AtomicU64,
    /// Current snapshot, if any.
    slot: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotCache {
    /// Creates an empty cache at generation zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Returns the snapshot if one exists for the current generation.
    #[must_use]
    pub fn get(&self) -> Option<Arc<Snapshot>> {
        let current = self.generation();
        let guard = self.slot.read().ok()?;
        guard.as_ref().filter(|snapshot| snapshot.generation == current).cloned()
    }

    /// Installs `views` computed under `generation`.
    ///
    /// Returns false, leaving the cache untouched, when the cache has been
    /// invalidated since `generation` was read.
    pub fn store(&self, generation: u64, views: Vec<MergedView>) -> bool {
        let Ok(mut guard) = self.slot.write() else {
            return false;
        };
        if self.generation() != generation {
            return false;
        }
        *guard = Some(Arc::new(Snapshot {
            generation,
            views,
        }));
        true
    }

    /// Drops the snapshot and advances the generation.
    ///
    /// Returns the new generation.
    pub fn invalidate(&self) -> u64 {
        let next = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if let Ok(mut guard) = self.slot.write() {
            *guard = None;
        }
        next
    }
}
