// crates/storefront-config/src/config.rs
// ============================================================================
// Module: Storefront Configuration
// Description: Configuration loading and validation for storefront servers.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: storefront-core, storefront-store-sqlite, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `STOREFRONT_CONFIG`, then
//! `storefront.toml`. Mesh service URLs may be overridden through
//! `CATALOG_URL`, `INVENTORY_URL`, `PRICING_URL` and `REVIEWS_URL`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use storefront_core::Dependency;
use storefront_core::SeedConfig;
use storefront_store_sqlite::SqliteStoreConfig;
use storefront_store_sqlite::SqliteStoreMode;
use storefront_store_sqlite::SqliteSyncMode;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "storefront.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "STOREFRONT_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default maximum request body size (seed payloads for a full catalog fit).
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Default `SQLite` busy timeout in milliseconds.
pub(crate) const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum mesh request timeout in milliseconds.
pub(crate) const MAX_MESH_TIMEOUT_MS: u64 = 60_000;
/// Maximum products generated per category.
pub(crate) const MAX_ITEMS_PER_CATEGORY: usize = 100_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Storefront configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorefrontConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Record store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Mesh service endpoints used by the gateway.
    #[serde(default)]
    pub mesh: MeshConfig,
    /// Seed generator configuration.
    #[serde(default)]
    pub seed: SeedConfig,
}

impl StorefrontConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        Self::load_resolved(&resolved, &ConfigOverrides::default())
    }

    /// Loads configuration, falling back to defaults when no path was given
    /// and the default file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicit file fails to load or the
    /// resulting configuration is invalid.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_or_default_with(path, &ConfigOverrides::default())
    }

    /// Like [`StorefrontConfig::load_or_default`], applying `overrides`
    /// before validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicit file fails to load or the
    /// resulting configuration is invalid.
    pub fn load_or_default_with(
        path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        let explicit = path.is_some() || env::var_os(CONFIG_ENV_VAR).is_some();
        if !explicit && !resolved.exists() {
            let mut config = Self::default();
            config.apply_env_overrides();
            overrides.apply(&mut config);
            config.validate()?;
            return Ok(config);
        }
        Self::load_resolved(&resolved, overrides)
    }

    /// Parses configuration from TOML text without env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates an already resolved path.
    fn load_resolved(resolved: &Path, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        validate_path(resolved)?;
        let bytes = fs::read(resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.apply_env_overrides();
        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Applies mesh URL overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.mesh.apply_overrides(|name| env::var(name).ok());
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.mesh.validate()?;
        validate_seed(&self.seed)?;
        if self.server.role == ServerRole::Gateway && self.store.store_type == StoreType::Sqlite {
            return Err(ConfigError::Invalid("gateway role does not use a record store".to_string()));
        }
        Ok(())
    }
}

/// Command-line overrides applied on top of file and env configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Role to serve instead of `server.role`.
    pub role: Option<ServerRole>,
    /// Bind address instead of `server.bind`.
    pub bind: Option<String>,
    /// Opt in to non-loopback binds; never turns an opt-in off.
    pub allow_non_loopback: bool,
}

impl ConfigOverrides {
    /// Applies the overrides to `config`.
    pub fn apply(&self, config: &mut StorefrontConfig) {
        if let Some(role) = self.role {
            config.server.role = role;
        }
        if let Some(bind) = &self.bind {
            config.server.bind = Some(bind.clone());
        }
        if self.allow_non_loopback {
            config.server.allow_non_loopback = true;
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Role a storefront server plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerRole {
    /// Embedded-database app serving aggregated views from local stores.
    #[default]
    Embedded,
    /// Gateway aggregating over the mesh services.
    Gateway,
    /// Catalog service (products and categories).
    Catalog,
    /// Inventory service.
    Inventory,
    /// Pricing service.
    Pricing,
    /// Reviews service.
    Reviews,
}

impl ServerRole {
    /// All roles.
    pub const ALL: [Self; 6] = [
        Self::Embedded,
        Self::Gateway,
        Self::Catalog,
        Self::Inventory,
        Self::Pricing,
        Self::Reviews,
    ];

    /// Returns a stable label for the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Gateway => "gateway",
            Self::Catalog => "catalog",
            Self::Inventory => "inventory",
            Self::Pricing => "pricing",
            Self::Reviews => "reviews",
        }
    }

    /// Returns the port the role listens on when no bind is configured.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Embedded => 9926,
            Self::Gateway => 3000,
            Self::Catalog => 3001,
            Self::Inventory => 3002,
            Self::Pricing => 3003,
            Self::Reviews => 3004,
        }
    }

    /// Returns the mesh dependency a service role implements.
    #[must_use]
    pub const fn dependency(self) -> Option<Dependency> {
        match self {
            Self::Catalog => Some(Dependency::Catalog),
            Self::Inventory => Some(Dependency::Inventory),
            Self::Pricing => Some(Dependency::Pricing),
            Self::Reviews => Some(Dependency::Reviews),
            Self::Embedded | Self::Gateway => None,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Role served by this process.
    #[serde(default)]
    pub role: ServerRole,
    /// Bind address; defaults to loopback on the role's port.
    #[serde(default)]
    pub bind: Option<String>,
    /// Allow binding to non-loopback addresses (explicit opt-in).
    #[serde(default)]
    pub allow_non_loopback: bool,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Request audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            role: ServerRole::default(),
            bind: None,
            allow_non_loopback: false,
            max_body_bytes: default_max_body_bytes(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the effective bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configured bind address is invalid.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        match self.bind.as_deref().map(str::trim) {
            Some(bind) if !bind.is_empty() => bind
                .parse()
                .map_err(|_| ConfigError::Invalid("invalid bind address".to_string())),
            _ => Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.role.default_port())),
        }
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        let addr = self.bind_addr()?;
        if !addr.ip().is_loopback() && !self.allow_non_loopback {
            return Err(ConfigError::Invalid(
                "non-loopback bind disallowed without allow_non_loopback".to_string(),
            ));
        }
        self.audit.validate()
    }
}

/// Request audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Record store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use in-memory stores.
    #[default]
    Memory,
    /// Use an `SQLite` database.
    Sqlite,
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the `SQLite` configuration when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (StoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
            _ => None,
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory store must not set path".to_string()));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_path_string("store.path", &path.to_string_lossy())
            }
        }
    }
}

// ============================================================================
// SECTION: Mesh
// ============================================================================

/// Mesh service endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MeshConfig {
    /// Catalog service base URL.
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    /// Inventory service base URL.
    #[serde(default = "default_inventory_url")]
    pub inventory_url: String,
    /// Pricing service base URL.
    #[serde(default = "default_pricing_url")]
    pub pricing_url: String,
    /// Reviews service base URL.
    #[serde(default = "default_reviews_url")]
    pub reviews_url: String,
    /// Optional per-request timeout in milliseconds; unset means no timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            inventory_url: default_inventory_url(),
            pricing_url: default_pricing_url(),
            reviews_url: default_reviews_url(),
            timeout_ms: None,
        }
    }
}

impl MeshConfig {
    /// Returns the environment variable overriding a dependency's URL.
    #[must_use]
    pub const fn env_var(dependency: Dependency) -> &'static str {
        match dependency {
            Dependency::Catalog => "CATALOG_URL",
            Dependency::Inventory => "INVENTORY_URL",
            Dependency::Pricing => "PRICING_URL",
            Dependency::Reviews => "REVIEWS_URL",
        }
    }

    /// Returns the configured base URL for a dependency.
    #[must_use]
    pub fn url(&self, dependency: Dependency) -> &str {
        match dependency {
            Dependency::Catalog => &self.catalog_url,
            Dependency::Inventory => &self.inventory_url,
            Dependency::Pricing => &self.pricing_url,
            Dependency::Reviews => &self.reviews_url,
        }
    }

    /// Returns the request timeout, if configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Replaces URLs with non-empty values returned by `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for dependency in Dependency::ALL {
            let Some(value) = lookup(Self::env_var(dependency)) else {
                continue;
            };
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            match dependency {
                Dependency::Catalog => self.catalog_url = value,
                Dependency::Inventory => self.inventory_url = value,
                Dependency::Pricing => self.pricing_url = value,
                Dependency::Reviews => self.reviews_url = value,
            }
        }
    }

    /// Validates mesh configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        for dependency in Dependency::ALL {
            let field = format!("mesh.{}_url", dependency.as_str());
            let url = Url::parse(self.url(dependency))
                .map_err(|err| ConfigError::Invalid(format!("{field} is invalid: {err}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(format!("{field} must use http:// or https://")));
            }
            if url.host_str().is_none() {
                return Err(ConfigError::Invalid(format!("{field} must include a host")));
            }
        }
        if let Some(timeout_ms) = self.timeout_ms
            && (timeout_ms == 0 || timeout_ms > MAX_MESH_TIMEOUT_MS)
        {
            return Err(ConfigError::Invalid(format!(
                "mesh.timeout_ms must be between 1 and {MAX_MESH_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Seed
// ============================================================================

/// Validates seed generator settings.
fn validate_seed(seed: &SeedConfig) -> Result<(), ConfigError> {
    if seed.items_per_category == 0 || seed.items_per_category > MAX_ITEMS_PER_CATEGORY {
        return Err(ConfigError::Invalid(format!(
            "seed.items_per_category must be between 1 and {MAX_ITEMS_PER_CATEGORY}"
        )));
    }
    if !seed.review_ratio.is_finite() || !(0.0 ..= 1.0).contains(&seed.review_ratio) {
        return Err(ConfigError::Invalid("seed.review_ratio must be within [0, 1]".to_string()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Audit logging is on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}

/// Default `SQLite` busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Default catalog service URL.
fn default_catalog_url() -> String {
    local_url(ServerRole::Catalog)
}

/// Default inventory service URL.
fn default_inventory_url() -> String {
    local_url(ServerRole::Inventory)
}

/// Default pricing service URL.
fn default_pricing_url() -> String {
    local_url(ServerRole::Pricing)
}

/// Default reviews service URL.
fn default_reviews_url() -> String {
    local_url(ServerRole::Reviews)
}

/// Loopback URL for a role's default port.
fn local_url(role: ServerRole) -> String {
    format!("http://127.0.0.1:{}", role.default_port())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
