//! Server, store, mesh and seed validation tests for storefront-config.
// crates/storefront-config/tests/server_validation.rs
// =============================================================================
// Module: Config Section Validation Tests
// Description: Validate per-section rules and mesh URL overrides.
// Purpose: Ensure invalid settings fail closed with actionable messages.
// =============================================================================

use std::collections::HashMap;
use std::time::Duration;

use storefront_config::MeshConfig;
use storefront_config::ServerRole;
use storefront_config::StorefrontConfig;
use storefront_core::Dependency;

type TestResult = Result<(), String>;

fn assert_rejected(content: &str, needle: &str) -> TestResult {
    match StorefrontConfig::from_toml(content) {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err(format!("expected rejection for:\n{content}")),
    }
}

#[test]
fn defaults_are_valid() -> TestResult {
    let config = StorefrontConfig::from_toml("").map_err(|err| err.to_string())?;
    if config.server.role != ServerRole::Embedded {
        return Err("default role should be embedded".to_string());
    }
    if config.mesh.timeout().is_some() {
        return Err("mesh timeout should be unset by default".to_string());
    }
    Ok(())
}

#[test]
fn non_loopback_bind_requires_opt_in() -> TestResult {
    assert_rejected("[server]\nbind = \"0.0.0.0:3000\"\n", "non-loopback bind disallowed")?;
    let config = StorefrontConfig::from_toml(
        "[server]\nbind = \"0.0.0.0:3000\"\nallow_non_loopback = true\n",
    )
    .map_err(|err| err.to_string())?;
    let addr = config.server.bind_addr().map_err(|err| err.to_string())?;
    if addr.port() != 3000 {
        return Err(format!("unexpected bind {addr}"));
    }
    Ok(())
}

#[test]
fn invalid_bind_is_rejected() -> TestResult {
    assert_rejected("[server]\nbind = \"not-an-address\"\n", "invalid bind address")
}

#[test]
fn zero_body_limit_is_rejected() -> TestResult {
    assert_rejected("[server]\nmax_body_bytes = 0\n", "max_body_bytes must be greater than zero")
}

#[test]
fn empty_audit_path_is_rejected() -> TestResult {
    assert_rejected("[server.audit]\npath = \"  \"\n", "audit.path must be non-empty")
}

#[test]
fn sqlite_store_requires_path() -> TestResult {
    assert_rejected("[store]\ntype = \"sqlite\"\n", "sqlite store requires path")
}

#[test]
fn memory_store_rejects_path() -> TestResult {
    assert_rejected("[store]\ntype = \"memory\"\npath = \"x.db\"\n", "memory store must not set path")
}

#[test]
fn gateway_rejects_sqlite_store() -> TestResult {
    assert_rejected(
        "[server]\nrole = \"gateway\"\n[store]\ntype = \"sqlite\"\npath = \"x.db\"\n",
        "gateway role does not use a record store",
    )
}

#[test]
fn mesh_urls_must_be_http() -> TestResult {
    assert_rejected("[mesh]\npricing_url = \"ftp://prices\"\n", "mesh.pricing_url must use http")?;
    assert_rejected("[mesh]\nreviews_url = \"not a url\"\n", "mesh.reviews_url is invalid")
}

#[test]
fn mesh_timeout_bounds() -> TestResult {
    assert_rejected("[mesh]\ntimeout_ms = 0\n", "mesh.timeout_ms must be between")?;
    let config = StorefrontConfig::from_toml("[mesh]\ntimeout_ms = 250\n")
        .map_err(|err| err.to_string())?;
    if config.mesh.timeout() != Some(Duration::from_millis(250)) {
        return Err("timeout should be 250ms".to_string());
    }
    Ok(())
}

#[test]
fn seed_settings_are_bounded() -> TestResult {
    assert_rejected("[seed]\nitems_per_category = 0\n", "seed.items_per_category")?;
    assert_rejected("[seed]\nreview_ratio = 1.5\n", "seed.review_ratio")
}

#[test]
fn env_style_overrides_replace_urls() -> TestResult {
    let overrides: HashMap<&str, &str> =
        HashMap::from([("INVENTORY_URL", "http://inventory:3002"), ("PRICING_URL", "  ")]);
    let mut mesh = MeshConfig::default();
    mesh.apply_overrides(|name| overrides.get(name).map(|value| (*value).to_string()));
    if mesh.url(Dependency::Inventory) != "http://inventory:3002" {
        return Err("inventory url not overridden".to_string());
    }
    if mesh.url(Dependency::Pricing) != "http://127.0.0.1:3003" {
        return Err("blank override must be ignored".to_string());
    }
    if MeshConfig::env_var(Dependency::Catalog) != "CATALOG_URL" {
        return Err("catalog env var name changed".to_string());
    }
    Ok(())
}
