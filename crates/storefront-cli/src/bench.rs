// crates/storefront-cli/src/bench.rs
// ============================================================================
// Module: Load Generator
// Description: Virtual-user HTTP load generator for storefront page routes.
// Purpose: Measure latency, throughput and error rate of one page of one
//          architecture and persist the result.
// Dependencies: reqwest, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! Each virtual user loops until the run's deadline: issue one GET against the
//! page route, record its latency and outcome, then sleep the think time.
//! Only a `200` with a fully read body counts as a success. Results are
//! summarized into median and p95 latency, request rate and error rate and
//! written as `results_<arch>_<page>_<vus>.json`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::Instant;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Product fetched by the product-detail page.
pub const PDP_PRODUCT_ID: &str = "p_travel_0";
/// Number of products shown on the home page.
pub const HOME_LIMIT: usize = 8;

// ============================================================================
// SECTION: Targets
// ============================================================================

/// Architecture under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    /// Embedded-database app.
    Embedded,
    /// Gateway over the service mesh.
    Mesh,
}

impl Architecture {
    /// Both architectures, mesh first as the baseline.
    pub const ALL: [Self; 2] = [Self::Mesh, Self::Embedded];

    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Mesh => "mesh",
        }
    }

    /// Returns the display name used in reports.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Embedded => "Embedded",
            Self::Mesh => "Mesh",
        }
    }

    /// Returns the default base URL of the architecture's front door.
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::Embedded => "http://127.0.0.1:9926",
            Self::Mesh => "http://127.0.0.1:3000",
        }
    }

    /// Returns the route prefix the architecture's UI reads from.
    const fn route_prefix(self) -> &'static str {
        match self {
            Self::Embedded => "/catalog",
            Self::Mesh => "/products",
        }
    }
}

/// Page type under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    /// Home page: a short unfiltered listing.
    Home,
    /// Product listing page: the full unfiltered listing.
    Plp,
    /// Product detail page: one product.
    Pdp,
}

impl Page {
    /// All page types in report order.
    pub const ALL: [Self; 3] = [Self::Home, Self::Plp, Self::Pdp];

    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Plp => "plp",
            Self::Pdp => "pdp",
        }
    }
}

/// Returns the request path (with query) a page issues on an architecture.
#[must_use]
pub fn page_path(arch: Architecture, page: Page) -> String {
    let prefix = arch.route_prefix();
    match page {
        Page::Home => format!("{prefix}?limit={HOME_LIMIT}"),
        Page::Plp => prefix.to_string(),
        Page::Pdp => format!("{prefix}/{PDP_PRODUCT_ID}"),
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Load generator settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Architecture under test.
    pub arch: Architecture,
    /// Page under test.
    pub page: Page,
    /// Base URL of the server under test.
    pub base_url: String,
    /// Number of concurrent virtual users.
    pub vus: usize,
    /// Run duration.
    pub duration: Duration,
    /// Sleep between a user's requests.
    pub think_time: Duration,
    /// Optional per-request timeout.
    pub request_timeout: Option<Duration>,
}

impl BenchConfig {
    /// Builds settings with default target, 10 users, 30 s and 1 s think time.
    #[must_use]
    pub fn new(arch: Architecture, page: Page) -> Self {
        Self {
            arch,
            page,
            base_url: arch.default_base_url().to_string(),
            vus: 10,
            duration: Duration::from_secs(30),
            think_time: Duration::from_secs(1),
            request_timeout: None,
        }
    }

    /// Returns the full URL hit by every virtual user.
    #[must_use]
    pub fn target_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), page_path(self.arch, self.page))
    }

    /// Validates settings.
    fn validate(&self) -> Result<(), BenchError> {
        if self.vus == 0 {
            return Err(BenchError::Invalid("vus must be greater than zero".to_string()));
        }
        if self.duration.is_zero() {
            return Err(BenchError::Invalid("duration must be greater than zero".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// One request outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Request latency in milliseconds.
    pub latency_ms: f64,
    /// Whether the request succeeded.
    pub ok: bool,
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchResult {
    /// Architecture under test.
    pub arch: Architecture,
    /// Page under test.
    pub page: Page,
    /// Number of virtual users.
    pub vus: usize,
    /// Measured wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Requests issued.
    pub requests: usize,
    /// Requests that failed.
    pub failures: usize,
    /// Median latency in milliseconds.
    pub p50_ms: f64,
    /// 95th percentile latency in milliseconds.
    pub p95_ms: f64,
    /// Requests per second.
    pub req_per_sec: f64,
    /// Failed fraction of requests in `[0, 1]`.
    pub error_rate: f64,
}

/// Returns the result file name for a run.
#[must_use]
pub fn result_file_name(arch: Architecture, page: Page, vus: usize) -> String {
    format!("results_{}_{}_{vus}.json", arch.as_str(), page.as_str())
}

/// Summarizes samples collected over `elapsed`.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "Request counts stay far below 2^52.")]
pub fn summarize(
    arch: Architecture,
    page: Page,
    vus: usize,
    samples: &[Sample],
    elapsed: Duration,
) -> BenchResult {
    let mut latencies: Vec<f64> = samples.iter().map(|sample| sample.latency_ms).collect();
    latencies.sort_by(f64::total_cmp);
    let requests = samples.len();
    let failures = samples.iter().filter(|sample| !sample.ok).count();
    let seconds = elapsed.as_secs_f64();
    let req_per_sec = if seconds > 0.0 { requests as f64 / seconds } else { 0.0 };
    let error_rate = if requests == 0 { 0.0 } else { failures as f64 / requests as f64 };
    BenchResult {
        arch,
        page,
        vus,
        duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        requests,
        failures,
        p50_ms: percentile(&latencies, 50),
        p95_ms: percentile(&latencies, 95),
        req_per_sec,
        error_rate,
    }
}

/// Nearest-rank percentile over sorted values; `0` when empty.
#[must_use]
pub fn percentile(sorted: &[f64], pct: usize) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (sorted.len() * pct.min(100)).div_ceil(100);
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted.get(index).copied().unwrap_or(0.0)
}

/// Writes a result as pretty JSON under `dir` and returns the file path.
///
/// # Errors
///
/// Returns [`BenchError`] when the directory or file cannot be written.
pub fn write_result(dir: &Path, result: &BenchResult) -> Result<PathBuf, BenchError> {
    fs::create_dir_all(dir).map_err(|err| BenchError::Io(err.to_string()))?;
    let path = dir.join(result_file_name(result.arch, result.page, result.vus));
    let mut bytes =
        serde_json::to_vec_pretty(result).map_err(|err| BenchError::Encode(err.to_string()))?;
    bytes.push(b'\n');
    fs::write(&path, bytes).map_err(|err| BenchError::Io(err.to_string()))?;
    Ok(path)
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs the load generator and summarizes the outcome.
///
/// # Errors
///
/// Returns [`BenchError`] when settings are invalid, the HTTP client cannot
/// be built or a virtual user task fails.
pub async fn run_bench(config: &BenchConfig) -> Result<BenchResult, BenchError> {
    config.validate()?;
    let mut builder = Client::builder();
    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().map_err(|err| BenchError::Client(err.to_string()))?;
    let url = config.target_url();
    let started = Instant::now();
    let deadline = started + config.duration;

    let mut users = JoinSet::new();
    for _ in 0 .. config.vus {
        users.spawn(virtual_user(client.clone(), url.clone(), deadline, config.think_time));
    }
    let mut samples = Vec::new();
    while let Some(joined) = users.join_next().await {
        samples.extend(joined.map_err(|err| BenchError::Task(err.to_string()))?);
    }
    Ok(summarize(config.arch, config.page, config.vus, &samples, started.elapsed()))
}

/// One virtual user's request loop.
async fn virtual_user(
    client: Client,
    url: String,
    deadline: Instant,
    think_time: Duration,
) -> Vec<Sample> {
    let mut samples = Vec::new();
    while Instant::now() < deadline {
        let started = Instant::now();
        let ok = match client.get(url.as_str()).send().await {
            Ok(response) => response.status() == StatusCode::OK && response.bytes().await.is_ok(),
            Err(_) => false,
        };
        samples.push(Sample {
            latency_ms: started.elapsed().as_secs_f64() * 1000.0,
            ok,
        });
        if !think_time.is_zero() {
            tokio::time::sleep(think_time).await;
        }
    }
    samples
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Load generator errors.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Invalid settings.
    #[error("invalid bench settings: {0}")]
    Invalid(String),
    /// HTTP client construction failed.
    #[error("http client error: {0}")]
    Client(String),
    /// A virtual user task failed.
    #[error("virtual user failed: {0}")]
    Task(String),
    /// Result file I/O failed.
    #[error("result io error: {0}")]
    Io(String),
    /// Result encoding failed.
    #[error("result encode error: {0}")]
    Encode(String),
}
