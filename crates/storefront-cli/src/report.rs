// crates/storefront-cli/src/report.rs
// ============================================================================
// Module: Benchmark Report
// Description: Markdown comparison of embedded and mesh benchmark results.
// Purpose: Turn a directory of result files into one side-by-side table.
// Dependencies: serde_json, crate::bench
// ============================================================================

//! ## Overview
//! For each VU level and page the report prints one row per architecture,
//! `N/A` when its result file is missing or unreadable. When both results
//! exist a Delta row shows how the embedded app's p95 latency and request rate
//! compare with the mesh baseline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::bench::Architecture;
use crate::bench::BenchResult;
use crate::bench::Page;
use crate::bench::result_file_name;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// VU levels compared by default.
pub const DEFAULT_VU_LEVELS: [usize; 3] = [20, 200, 2000];
/// Default report file name.
pub const DEFAULT_REPORT_NAME: &str = "BENCHMARK_REPORT.md";

/// Empty separator row between page groups.
const SPACER_ROW: &str = "| | | | | | | |";

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Loads one result file; `None` when it is missing or unreadable.
#[must_use]
pub fn load_result(dir: &Path, arch: Architecture, page: Page, vus: usize) -> Option<BenchResult> {
    let path = dir.join(result_file_name(arch, page, vus));
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the report using `lookup` to find each result.
#[must_use]
pub fn render_report(
    vu_levels: &[usize],
    lookup: impl Fn(Architecture, Page, usize) -> Option<BenchResult>,
) -> String {
    let mut markdown = String::from("# Benchmark Report\n\n");
    markdown.push_str("| Architecture | Page | VUs | p50 (ms) | p95 (ms) | Req/s | Error % |\n");
    markdown.push_str("| :--- | :--- | :--- | :--- | :--- | :--- | :--- |\n");
    for &vus in vu_levels {
        for page in Page::ALL {
            let mesh = lookup(Architecture::Mesh, page, vus);
            let embedded = lookup(Architecture::Embedded, page, vus);
            push_row(&mut markdown, Architecture::Mesh, page, vus, mesh.as_ref());
            push_row(&mut markdown, Architecture::Embedded, page, vus, embedded.as_ref());
            if let (Some(mesh), Some(embedded)) = (&mesh, &embedded)
                && let Some(row) = delta_row(mesh, embedded)
            {
                markdown.push_str(&row);
                markdown.push('\n');
            }
            markdown.push_str(SPACER_ROW);
            markdown.push('\n');
        }
    }
    markdown
}

/// Appends one architecture row.
fn push_row(
    markdown: &mut String,
    arch: Architecture,
    page: Page,
    vus: usize,
    result: Option<&BenchResult>,
) {
    let name = arch.display_name();
    let page = page.as_str().to_uppercase();
    let _ = match result {
        Some(result) => writeln!(
            markdown,
            "| {name} | {page} | {vus} | {:.2} | {:.2} | {:.2} | {:.2}% |",
            result.p50_ms,
            result.p95_ms,
            result.req_per_sec,
            result.error_rate * 100.0
        ),
        None => writeln!(markdown, "| {name} | {page} | {vus} | N/A | N/A | N/A | N/A |"),
    };
}

/// Builds the Delta row comparing embedded against the mesh baseline.
///
/// Returns `None` when the baseline has no p95 or request rate to compare
/// against.
fn delta_row(mesh: &BenchResult, embedded: &BenchResult) -> Option<String> {
    if mesh.p95_ms <= 0.0 || mesh.req_per_sec <= 0.0 {
        return None;
    }
    let p95_delta = (embedded.p95_ms - mesh.p95_ms) / mesh.p95_ms * 100.0;
    let req_delta = (embedded.req_per_sec - mesh.req_per_sec) / mesh.req_per_sec * 100.0;
    Some(format!("| **Delta** | | | | **{p95_delta:+.1}%** | **{req_delta:+.1}%** | |"))
}

// ============================================================================
// SECTION: Writing
// ============================================================================

/// Renders the report from result files in `results_dir` and writes it to
/// `output`.
///
/// # Errors
///
/// Returns [`ReportError`] when the report cannot be written.
pub fn write_report(
    results_dir: &Path,
    output: &Path,
    vu_levels: &[usize],
) -> Result<PathBuf, ReportError> {
    let markdown =
        render_report(vu_levels, |arch, page, vus| load_result(results_dir, arch, page, vus));
    fs::write(output, markdown).map_err(|err| ReportError::Io(err.to_string()))?;
    Ok(output.to_path_buf())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Report errors.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Report file I/O failed.
    #[error("report io error: {0}")]
    Io(String),
}
