// crates/storefront-config/src/lib.rs
// ============================================================================
// Module: Storefront Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for storefront.toml semantics.
// Dependencies: storefront-core, storefront-store-sqlite, serde, toml, url
// ============================================================================

//! ## Overview
//! `storefront-config` defines the configuration shared by every storefront
//! role: the embedded app, the gateway and the four mesh services. Loading
//! is strict and fail-closed; environment overrides for mesh service URLs
//! are applied before validation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
