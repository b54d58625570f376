// crates/storefront-cli/tests/bench_report.rs
// ============================================================================
// Module: Bench and Report Tests
// Description: Tests for the load generator and the comparison report.
// Purpose: Validate page routes, summaries, result files and report rows.
// ============================================================================

//! ## Overview
//! Exercises the load generator against an in-process embedded app and the
//! report renderer against result files in a temporary directory.

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
    clippy::float_cmp,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::time::Duration;

use storefront_cli::bench::Architecture;
use storefront_cli::bench::BenchConfig;
use storefront_cli::bench::BenchResult;
use storefront_cli::bench::Page;
use storefront_cli::bench::Sample;
use storefront_cli::bench::page_path;
use storefront_cli::bench::percentile;
use storefront_cli::bench::result_file_name;
use storefront_cli::bench::run_bench;
use storefront_cli::bench::summarize;
use storefront_cli::bench::write_result;
use storefront_cli::report::load_result;
use storefront_cli::report::render_report;
use storefront_cli::report::write_report;
use storefront_config::ServerRole;
use storefront_config::StorefrontConfig;
use storefront_core::NoopEventSink;
use storefront_core::SeedConfig;
use storefront_http::StorefrontServer;
use tempfile::TempDir;
use tokio::net::TcpListener;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn result(arch: Architecture, page: Page, vus: usize, p95_ms: f64, req_per_sec: f64) -> BenchResult {
    BenchResult {
        arch,
        page,
        vus,
        duration_ms: 30_000,
        requests: 100,
        failures: 1,
        p50_ms: p95_ms / 2.0,
        p95_ms,
        req_per_sec,
        error_rate: 0.01,
    }
}

async fn spawn_embedded() -> String {
    let mut config = StorefrontConfig::default();
    config.server.role = ServerRole::Embedded;
    config.server.audit.enabled = false;
    config.seed = SeedConfig {
        items_per_category: 4,
        review_ratio: 0.5,
        rng_seed: Some(1),
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = StorefrontServer::with_event_sink(config, Arc::new(NoopEventSink)).unwrap();
    tokio::spawn(server.serve_listener(listener));
    format!("http://{addr}")
}

// ============================================================================
// SECTION: Routes and Summaries
// ============================================================================

#[test]
fn pages_map_to_architecture_routes() {
    assert_eq!(page_path(Architecture::Embedded, Page::Home), "/catalog?limit=8");
    assert_eq!(page_path(Architecture::Embedded, Page::Plp), "/catalog");
    assert_eq!(page_path(Architecture::Mesh, Page::Plp), "/products");
    assert_eq!(page_path(Architecture::Mesh, Page::Pdp), "/products/p_travel_0");

    let mut config = BenchConfig::new(Architecture::Mesh, Page::Home);
    config.base_url = "http://localhost:3000/".to_string();
    assert_eq!(config.target_url(), "http://localhost:3000/products?limit=8");
}

#[test]
fn percentile_uses_nearest_rank() {
    let sorted: Vec<f64> = (1 ..= 20).map(f64::from).collect();
    assert_eq!(percentile(&sorted, 50), 10.0);
    assert_eq!(percentile(&sorted, 95), 19.0);
    assert_eq!(percentile(&sorted, 100), 20.0);
    assert_eq!(percentile(&[], 95), 0.0);
}

#[test]
fn summary_counts_failures_and_rate() {
    let samples = [
        Sample {
            latency_ms: 30.0,
            ok: true,
        },
        Sample {
            latency_ms: 10.0,
            ok: true,
        },
        Sample {
            latency_ms: 20.0,
            ok: false,
        },
        Sample {
            latency_ms: 40.0,
            ok: true,
        },
    ];
    let summary = summarize(Architecture::Embedded, Page::Pdp, 2, &samples, Duration::from_secs(2));
    assert_eq!(summary.requests, 4);
    assert_eq!(summary.failures, 1);
    assert_eq!(summary.error_rate, 0.25);
    assert_eq!(summary.req_per_sec, 2.0);
    assert_eq!(summary.p50_ms, 20.0);
    assert_eq!(summary.p95_ms, 40.0);
    assert_eq!(summary.duration_ms, 2_000);
}

#[test]
fn results_are_written_under_their_canonical_name() {
    let dir = TempDir::new().unwrap();
    let written = result(Architecture::Mesh, Page::Plp, 200, 80.0, 150.0);
    let path = write_result(&dir.path().join("nested"), &written).unwrap();
    assert!(path.ends_with("results_mesh_plp_200.json"));

    let loaded = load_result(&dir.path().join("nested"), Architecture::Mesh, Page::Plp, 200);
    assert_eq!(loaded, Some(written));
}

// ============================================================================
// SECTION: Load Generator
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bench_drives_a_live_server() {
    let base = spawn_embedded().await;
    reqwest::Client::new().post(format!("{base}/seed")).send().await.unwrap();

    let mut config = BenchConfig::new(Architecture::Embedded, Page::Pdp);
    config.base_url = base;
    config.vus = 3;
    config.duration = Duration::from_millis(300);
    config.think_time = Duration::from_millis(10);
    config.request_timeout = Some(Duration::from_secs(5));

    let result = run_bench(&config).await.unwrap();
    assert_eq!(result.vus, 3);
    assert!(result.requests >= 3, "too few requests: {}", result.requests);
    assert_eq!(result.failures, 0);
    assert!(result.p95_ms >= result.p50_ms);
    assert!(result.req_per_sec > 0.0);
}

#[tokio::test]
async fn bench_counts_unreachable_targets_as_errors() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = BenchConfig::new(Architecture::Mesh, Page::Home);
    config.base_url = format!("http://{addr}");
    config.vus = 1;
    config.duration = Duration::from_millis(100);
    config.think_time = Duration::from_millis(20);

    let result = run_bench(&config).await.unwrap();
    assert!(result.requests > 0);
    assert_eq!(result.error_rate, 1.0);
}

#[tokio::test]
async fn bench_rejects_zero_users() {
    let mut config = BenchConfig::new(Architecture::Embedded, Page::Home);
    config.vus = 0;
    assert!(run_bench(&config).await.is_err());
}

// ============================================================================
// SECTION: Report
// ============================================================================

#[test]
fn report_shows_delta_when_both_results_exist() {
    let markdown = render_report(&[20], |arch, page, vus| match (arch, page) {
        (Architecture::Mesh, Page::Home) => Some(result(arch, page, vus, 100.0, 50.0)),
        (Architecture::Embedded, Page::Home) => Some(result(arch, page, vus, 25.0, 200.0)),
        (Architecture::Mesh, Page::Pdp) => Some(result(arch, page, vus, 10.0, 10.0)),
        _ => None,
    });

    assert!(markdown.starts_with("# Benchmark Report\n"));
    assert!(markdown.contains("| Mesh | HOME | 20 | 50.00 | 100.00 | 50.00 | 1.00% |"));
    assert!(markdown.contains("| Embedded | HOME | 20 | 12.50 | 25.00 | 200.00 | 1.00% |"));
    assert!(markdown.contains("| **Delta** | | | | **-75.0%** | **+300.0%** | |"));
    assert!(markdown.contains("| Embedded | PDP | 20 | N/A | N/A | N/A | N/A |"));
    assert!(markdown.contains("| Mesh | PLP | 20 | N/A | N/A | N/A | N/A |"));
    assert_eq!(markdown.matches("**Delta**").count(), 1);
}

#[test]
fn report_covers_every_level_and_page() {
    let markdown = render_report(&[20, 200, 2000], |_, _, _| None);
    assert_eq!(markdown.matches("N/A | N/A | N/A | N/A").count(), 18);
    assert!(!markdown.contains("Delta"));
}

#[test]
fn report_reads_result_files_and_skips_unreadable_ones() {
    let dir = TempDir::new().unwrap();
    write_result(dir.path(), &result(Architecture::Mesh, Page::Pdp, 20, 40.0, 100.0)).unwrap();
    write_result(dir.path(), &result(Architecture::Embedded, Page::Pdp, 20, 20.0, 150.0)).unwrap();
    std::fs::write(
        dir.path().join(result_file_name(Architecture::Mesh, Page::Home, 20)),
        "not json",
    )
    .unwrap();

    let output = dir.path().join("BENCHMARK_REPORT.md");
    write_report(dir.path(), &output, &[20]).unwrap();
    let markdown = std::fs::read_to_string(&output).unwrap();
    assert!(markdown.contains("| **Delta** | | | | **-50.0%** | **+50.0%** | |"));
    assert!(markdown.contains("| Mesh | HOME | 20 | N/A | N/A | N/A | N/A |"));
}
