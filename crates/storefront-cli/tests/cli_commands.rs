// crates/storefront-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests running the storefront binary.
// Purpose: Ensure config, seed and report commands succeed and fail closed.
// Dependencies: storefront binary
// ============================================================================

//! ## Overview
//! Runs the CLI binary for config validation, the example config, reseeding
//! a live server and report generation.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::sync::Arc;

use storefront_config::ServerRole;
use storefront_config::StorefrontConfig;
use storefront_core::NoopEventSink;
use storefront_http::StorefrontServer;
use tempfile::TempDir;
use tokio::net::TcpListener;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn storefront_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_storefront"))
}

fn run(args: &[&str]) -> Output {
    Command::new(storefront_bin()).args(args).output().expect("run storefront")
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

#[test]
fn config_validate_accepts_valid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storefront.toml");
    fs::write(&path, "[server]\nrole = \"gateway\"\nbind = \"127.0.0.1:0\"\n").unwrap();

    let output = run(&["config", "validate", "--config", path.to_string_lossy().as_ref()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Config valid (role: gateway)"), "unexpected stdout: {stdout}");
}

#[test]
fn config_validate_rejects_non_loopback() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storefront.toml");
    fs::write(&path, "[server]\nbind = \"0.0.0.0:8080\"\n").unwrap();

    let output = run(&["config", "validate", "--config", path.to_string_lossy().as_ref()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load config"), "unexpected stderr: {stderr}");
}

#[test]
fn config_example_is_a_valid_config() {
    let output = run(&["config", "example"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let config = StorefrontConfig::from_toml(&stdout).expect("example parses");
    assert_eq!(config.server.role, ServerRole::Embedded);
}

// ============================================================================
// SECTION: Seed and Report Commands
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn seed_reseeds_a_running_server() {
    let mut config = StorefrontConfig::default();
    config.server.audit.enabled = false;
    config.seed.items_per_category = 2;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let server = StorefrontServer::with_event_sink(config, Arc::new(NoopEventSink)).unwrap();
    tokio::spawn(server.serve_listener(listener));

    let seed_url = url.clone();
    let output = tokio::task::spawn_blocking(move || run(&["seed", "--url", &seed_url]))
        .await
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Database seeded correctly"), "unexpected stdout: {stdout}");
    let listed: serde_json::Value =
        reqwest::get(format!("{url}/catalog")).await.unwrap().json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 16);
}

#[test]
fn seed_fails_when_server_is_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let output = run(&["seed", "--url", &url, "--timeout-ms", "2000"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Seed request failed"), "unexpected stderr: {stderr}");
}

#[test]
fn report_writes_markdown_for_missing_results() {
    let dir = TempDir::new().unwrap();
    let output_path = dir.path().join("report.md");

    let output = run(&[
        "report",
        "--results-dir",
        dir.path().to_string_lossy().as_ref(),
        "--output",
        output_path.to_string_lossy().as_ref(),
        "--vus",
        "20",
    ]);

    assert!(output.status.success());
    let markdown = fs::read_to_string(&output_path).unwrap();
    assert!(markdown.contains("| Mesh | PDP | 20 | N/A | N/A | N/A | N/A |"));
    assert!(!markdown.contains("| 200 |"));
}
