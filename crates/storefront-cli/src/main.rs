// crates/storefront-cli/src/main.rs
// ============================================================================
// Module: Storefront CLI Entry Point
// Description: Command dispatcher for serving, seeding and benchmarking.
// Purpose: Run any storefront role and drive comparison benchmarks.
// Dependencies: clap, reqwest, storefront-cli, storefront-config,
//               storefront-http, thiserror, tokio
// ============================================================================

//! ## Overview
//! `storefront serve` runs one role (embedded app, gateway or a mesh
//! service) from config. `seed` reseeds a running server, `bench` drives one
//! page of one architecture with virtual users and `report` compares the
//! saved results. Security posture: binding beyond loopback needs
//! `--allow-non-loopback` or the matching config opt-in.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use reqwest::Client;
use serde_json::Value;
use storefront_cli::bench::Architecture;
use storefront_cli::bench::BenchConfig;
use storefront_cli::bench::Page;
use storefront_cli::bench::run_bench;
use storefront_cli::bench::write_result;
use storefront_cli::report::DEFAULT_REPORT_NAME;
use storefront_cli::report::DEFAULT_VU_LEVELS;
use storefront_cli::report::write_report;
use storefront_config::ConfigOverrides;
use storefront_config::ServerRole;
use storefront_config::StorefrontConfig;
use storefront_config::config_toml_example;
use storefront_http::StorefrontServer;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "storefront", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a storefront server.
    Serve(ServeCommand),
    /// Reseed a running embedded app or gateway.
    Seed(SeedCommand),
    /// Run the load generator against one page.
    Bench(BenchCommand),
    /// Write the markdown comparison report.
    Report(ReportCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Roles accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy)]
enum RoleArg {
    /// Embedded-database app.
    Embedded,
    /// Gateway over the mesh services.
    Gateway,
    /// Catalog service.
    Catalog,
    /// Inventory service.
    Inventory,
    /// Pricing service.
    Pricing,
    /// Reviews service.
    Reviews,
}

impl From<RoleArg> for ServerRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Embedded => Self::Embedded,
            RoleArg::Gateway => Self::Gateway,
            RoleArg::Catalog => Self::Catalog,
            RoleArg::Inventory => Self::Inventory,
            RoleArg::Pricing => Self::Pricing,
            RoleArg::Reviews => Self::Reviews,
        }
    }
}

/// Architectures accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy)]
enum ArchArg {
    /// Embedded-database app.
    Embedded,
    /// Gateway over the service mesh.
    Mesh,
}

impl From<ArchArg> for Architecture {
    fn from(arch: ArchArg) -> Self {
        match arch {
            ArchArg::Embedded => Self::Embedded,
            ArchArg::Mesh => Self::Mesh,
        }
    }
}

/// Pages accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy)]
enum PageArg {
    /// Home page listing.
    Home,
    /// Product listing page.
    Plp,
    /// Product detail page.
    Pdp,
}

impl From<PageArg> for Page {
    fn from(page: PageArg) -> Self {
        match page {
            PageArg::Home => Self::Home,
            PageArg::Plp => Self::Plp,
            PageArg::Pdp => Self::Pdp,
        }
    }
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to storefront.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Role to serve instead of `server.role`.
    #[arg(long, value_enum, value_name = "ROLE")]
    role: Option<RoleArg>,
    /// Bind address instead of `server.bind`.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
    /// Allow binding to non-loopback addresses.
    #[arg(long, action = ArgAction::SetTrue)]
    allow_non_loopback: bool,
}

/// Configuration for the `seed` command.
#[derive(Args, Debug)]
struct SeedCommand {
    /// Base URL of the embedded app or gateway.
    #[arg(long, value_name = "URL", default_value = "http://127.0.0.1:9926")]
    url: String,
    /// Optional request timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
}

/// Configuration for the `bench` command.
#[derive(Args, Debug)]
struct BenchCommand {
    /// Architecture under test.
    #[arg(long, value_enum)]
    arch: ArchArg,
    /// Page under test.
    #[arg(long, value_enum)]
    page: PageArg,
    /// Base URL (defaults to the architecture's loopback port).
    #[arg(long, value_name = "URL")]
    url: Option<String>,
    /// Concurrent virtual users.
    #[arg(long, default_value_t = 10)]
    vus: usize,
    /// Run duration in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    duration_secs: u64,
    /// Think time between a user's requests in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    think_ms: u64,
    /// Optional per-request timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
    /// Directory receiving the result file.
    #[arg(long, value_name = "DIR", default_value = "test-results")]
    out_dir: PathBuf,
}

/// Configuration for the `report` command.
#[derive(Args, Debug)]
struct ReportCommand {
    /// Directory holding result files.
    #[arg(long, value_name = "DIR", default_value = "test-results")]
    results_dir: PathBuf,
    /// Report output path.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_REPORT_NAME)]
    output: PathBuf,
    /// VU levels to compare (defaults to 20, 200 and 2000).
    #[arg(long = "vus", value_name = "N")]
    vus: Vec<usize>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a storefront configuration file.
    Validate(ConfigValidateCommand),
    /// Print an example configuration file.
    Example,
}

/// Configuration for the `config validate` command.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to storefront.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Seed(command) => command_seed(command).await,
        Commands::Bench(command) => command_bench(command).await,
        Commands::Report(command) => command_report(command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let overrides = ConfigOverrides {
        role: command.role.map(ServerRole::from),
        bind: command.bind,
        allow_non_loopback: command.allow_non_loopback,
    };
    let config = StorefrontConfig::load_or_default_with(command.config.as_deref(), &overrides)
        .map_err(|err| CliError::new(format!("Failed to load config: {err}")))?;
    let server = tokio::task::spawn_blocking(move || StorefrontServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("Failed to initialize server: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("Failed to initialize server: {err}")))?;
    let addr = server.bind_addr();
    if !addr.ip().is_loopback() {
        write_stderr_line(&format!("WARNING: serving on non-loopback address {addr}"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    write_stderr_line(&format!("storefront {} listening on {addr}", server.role().as_str()))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server.serve().await.map_err(|err| CliError::new(format!("Server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Seed Command
// ============================================================================

/// Executes the `seed` command.
async fn command_seed(command: SeedCommand) -> CliResult<ExitCode> {
    let mut builder = Client::builder();
    if let Some(timeout_ms) = command.timeout_ms {
        builder = builder.timeout(Duration::from_millis(timeout_ms));
    }
    let client = builder
        .build()
        .map_err(|err| CliError::new(format!("Failed to build http client: {err}")))?;
    let url = format!("{}/seed", command.url.trim_end_matches('/'));
    let response = client
        .post(url)
        .send()
        .await
        .map_err(|err| CliError::new(format!("Seed request failed: {err}")))?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|err| CliError::new(format!("Seed response unreadable: {err}")))?;
    if !status.is_success() {
        return Err(CliError::new(format!("Seed failed with status {status}: {body}")));
    }
    let message = body.get("message").and_then(Value::as_str).unwrap_or("Seeded");
    write_stdout_line(message).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Bench Commands
// ============================================================================

/// Executes the `bench` command.
async fn command_bench(command: BenchCommand) -> CliResult<ExitCode> {
    let arch = Architecture::from(command.arch);
    let mut config = BenchConfig::new(arch, Page::from(command.page));
    if let Some(url) = command.url {
        config.base_url = url;
    }
    config.vus = command.vus;
    config.duration = Duration::from_secs(command.duration_secs);
    config.think_time = Duration::from_millis(command.think_ms);
    config.request_timeout = command.timeout_ms.map(Duration::from_millis);

    let result = run_bench(&config)
        .await
        .map_err(|err| CliError::new(format!("Benchmark failed: {err}")))?;
    let path = write_result(&command.out_dir, &result)
        .map_err(|err| CliError::new(format!("Failed to save result: {err}")))?;
    let summary = format!(
        "{} requests, p50 {:.2} ms, p95 {:.2} ms, {:.2} req/s, {:.2}% errors -> {}",
        result.requests,
        result.p50_ms,
        result.p95_ms,
        result.req_per_sec,
        result.error_rate * 100.0,
        path.display()
    );
    write_stdout_line(&summary).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `report` command.
fn command_report(command: ReportCommand) -> CliResult<ExitCode> {
    let vu_levels = if command.vus.is_empty() { DEFAULT_VU_LEVELS.to_vec() } else { command.vus };
    let path = write_report(&command.results_dir, &command.output, &vu_levels)
        .map_err(|err| CliError::new(format!("Failed to write report: {err}")))?;
    write_stdout_line(&format!("Report generated at {}", path.display()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = StorefrontConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("Failed to load config: {err}")))?;
    write_stdout_line(&format!("Config valid (role: {})", config.server.role.as_str()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("Failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
