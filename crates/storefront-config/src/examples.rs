// crates/storefront-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic example for docs and the CLI.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `storefront.toml`. The example must always load; a test
//! parses it through [`crate::StorefrontConfig::from_toml`].

/// Returns a canonical example `storefront.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
role = "embedded"
bind = "127.0.0.1:9926"
max_body_bytes = 16777216

[server.audit]
enabled = true
# path = "storefront-audit.jsonl"

[store]
type = "sqlite"
path = "storefront.db"
journal_mode = "wal"
sync_mode = "normal"
busy_timeout_ms = 5000

[mesh]
catalog_url = "http://127.0.0.1:3001"
inventory_url = "http://127.0.0.1:3002"
pricing_url = "http://127.0.0.1:3003"
reviews_url = "http://127.0.0.1:3004"
# timeout_ms = 2000

[seed]
items_per_category = 125
review_ratio = 0.5
# rng_seed = 42
"#,
    )
}
