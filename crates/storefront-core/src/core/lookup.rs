// crates/storefront-core/src/core/lookup.rs
// ============================================================================
// Module: Storefront Lookups
// Description: Client lookup requests and their resolved results.
// Purpose: Normalize raw request parameters into point or list lookups.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A lookup is either a point lookup by product id or a list lookup with an
//! optional category filter and result-count limit. Building a lookup from
//! raw parameters gives the id precedence over the list parameters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::num::NonZeroUsize;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::view::MergedView;

// ============================================================================
// SECTION: Lookup Types
// ============================================================================

/// List lookup parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Optional category filter.
    pub category_id: Option<String>,
    /// Optional maximum number of results.
    pub limit: Option<NonZeroUsize>,
}

impl ListQuery {
    /// Returns true when the query has neither a category filter nor a limit.
    #[must_use]
    pub const fn is_unscoped(&self) -> bool {
        self.category_id.is_none() && self.limit.is_none()
    }
}

/// Client lookup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Lookup {
    /// Fetch one product by id.
    Point {
        /// Product identifier.
        id: String,
    },
    /// Fetch a filtered or unfiltered collection.
    List(ListQuery),
}

/// Lookup construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The limit parameter is not a positive integer.
    #[error("limit must be a positive integer: {0}")]
    InvalidLimit(String),
}

impl Lookup {
    /// Builds a point lookup.
    #[must_use]
    pub fn point(id: impl Into<String>) -> Self {
        Self::Point {
            id: id.into(),
        }
    }

    /// Builds a list lookup.
    #[must_use]
    pub const fn list(category_id: Option<String>, limit: Option<NonZeroUsize>) -> Self {
        Self::List(ListQuery {
            category_id,
            limit,
        })
    }

    /// Builds a lookup from raw request parameters.
    ///
    /// Empty strings count as absent. A present `id` takes precedence over
    /// `category_id` and `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidLimit`] when `limit` is present but not a
    /// positive integer.
    pub fn from_params(
        id: Option<&str>,
        category_id: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Self, LookupError> {
        if let Some(id) = non_empty(id) {
            return Ok(Self::point(id));
        }
        let limit = match non_empty(limit) {
            None => None,
            Some(raw) => {
                let parsed = raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| LookupError::InvalidLimit(raw.to_string()))?;
                let limit = NonZeroUsize::new(parsed)
                    .ok_or_else(|| LookupError::InvalidLimit(raw.to_string()))?;
                Some(limit)
            }
        };
        Ok(Self::list(non_empty(category_id).map(str::to_string), limit))
    }
}

/// Filters out empty parameter values.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Result of resolving a lookup.
///
/// Serializes as `null` or a single view for point lookups and as an array
/// for list lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolution {
    /// Point lookup result; `None` when the product does not exist.
    Item(Option<Box<MergedView>>),
    /// List lookup result in product scan order.
    List(Vec<MergedView>),
}

impl Resolution {
    /// Wraps a point lookup result.
    #[must_use]
    pub fn item(view: Option<MergedView>) -> Self {
        Self::Item(view.map(Box::new))
    }

    /// Returns true for a point lookup that found nothing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Item(None))
    }

    /// Returns the resolved views as a slice-like vector.
    #[must_use]
    pub fn into_views(self) -> Vec<MergedView> {
        match self {
            Self::Item(view) => view.into_iter().map(|view| *view).collect(),
            Self::List(views) => views,
        }
    }
}
