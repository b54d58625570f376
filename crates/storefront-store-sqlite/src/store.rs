// crates/storefront-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Record Store
// Description: Per-kind record stores sharing one SQLite database.
// Purpose: Persist catalog records for the embedded aggregator.
// Dependencies: storefront-core, rusqlite, serde, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! Records are stored as JSON bodies in one table per record kind, next to
//! the key and the two filterable attributes (`product_id`, `category_id`)
//! extracted into indexed columns. Every operation runs on the blocking pool
//! against a single connection guarded by a mutex, so callers never block the
//! async runtime. Batched writes run inside one transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::marker::PhantomData;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use storefront_core::Attribute;
use storefront_core::CatalogStores;
use storefront_core::Record;
use storefront_core::RecordKind;
use storefront_core::RecordStore;
use storefront_core::ScanQuery;
use storefront_core::StoreError;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    Full,
    /// Normal synchronous mode; the demo data is regenerated on every seed.
    #[default]
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` catalog database.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a configuration for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Serde default for `busy_timeout_ms`.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) | SqliteStoreError::VersionMismatch(message) => {
                Self::Store(message)
            }
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps engine errors into [`SqliteStoreError::Db`].
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Database
// ============================================================================

/// Shared handle to the catalog database.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    /// Connection shared by every store, guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    /// Opens (creating if needed) the catalog database.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is invalid or the database
    /// cannot be opened or initialized.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns a store for records of type `R`.
    #[must_use]
    pub fn store<R: Record>(&self) -> SqliteRecordStore<R> {
        SqliteRecordStore {
            database: self.clone(),
            marker: PhantomData,
        }
    }

    /// Runs `operation` against the connection on the blocking pool.
    async fn run<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, SqliteStoreError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        let joined = tokio::task::spawn_blocking(move || {
            let mut guard = connection
                .lock()
                .map_err(|_| SqliteStoreError::Io("sqlite connection mutex poisoned".to_string()))?;
            operation(&mut guard)
        })
        .await
        .map_err(|err| StoreError::Store(format!("sqlite task failed: {err}")))?;
        joined.map_err(StoreError::from)
    }
}

/// Opens the catalog database and returns the five stores backed by it.
///
/// # Errors
///
/// Returns [`SqliteStoreError`] when the database cannot be opened.
pub fn open_catalog(config: &SqliteStoreConfig) -> Result<CatalogStores, SqliteStoreError> {
    let database = SqliteDatabase::open(config)?;
    Ok(CatalogStores {
        products: Arc::new(database.store()),
        prices: Arc::new(database.store()),
        inventory: Arc::new(database.store()),
        reviews: Arc::new(database.store()),
        categories: Arc::new(database.store()),
    })
}

// ============================================================================
// SECTION: Record Store
// ============================================================================

/// `SQLite`-backed store for one record kind.
pub struct SqliteRecordStore<R> {
    /// Shared database handle.
    database: SqliteDatabase,
    /// Record type marker.
    marker: PhantomData<fn() -> R>,
}

impl<R> Clone for SqliteRecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            marker: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for SqliteRecordStore<R> {
    async fn get(&self, key: &str) -> Result<Option<R>, StoreError> {
        let key = key.to_string();
        self.database
            .run(move |connection| {
                let sql = format!("SELECT body FROM {} WHERE key = ?1", table_name(R::KIND));
                let body: Option<String> = connection
                    .query_row(&sql, params![key], |row| row.get(0))
                    .optional()
                    .map_err(db_error)?;
                body.map(|body| decode_record(&body)).transpose()
            })
            .await
    }

    async fn scan(&self, query: ScanQuery) -> Result<Vec<R>, StoreError> {
        self.database.run(move |connection| scan_records(connection, &query)).await
    }

    async fn put(&self, record: R) -> Result<(), StoreError> {
        self.database.run(move |connection| upsert_record(connection, &record)).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.database
            .run(move |connection| {
                let sql = format!("DELETE FROM {} WHERE key = ?1", table_name(R::KIND));
                connection.execute(&sql, params![key]).map_err(db_error)?;
                Ok(())
            })
            .await
    }

    async fn put_many(&self, records: Vec<R>) -> Result<(), StoreError> {
        self.database
            .run(move |connection| {
                let tx = connection.transaction().map_err(db_error)?;
                for record in &records {
                    upsert_record(&tx, record)?;
                }
                tx.commit().map_err(db_error)
            })
            .await
    }
}

// ============================================================================
// SECTION: Statements
// ============================================================================

/// Returns the table holding records of `kind`.
const fn table_name(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Product => "products",
        RecordKind::Price => "prices",
        RecordKind::Inventory => "inventory",
        RecordKind::Review => "reviews",
        RecordKind::Category => "categories",
    }
}

/// Inserts or replaces one record.
fn upsert_record<R: Record>(connection: &Connection, record: &R) -> Result<(), SqliteStoreError> {
    let body = serde_json::to_string(record)
        .map_err(|err| SqliteStoreError::Invalid(format!("failed to encode record: {err}")))?;
    let sql = format!(
        "INSERT INTO {} (key, product_id, category_id, body) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(key) DO UPDATE SET
             product_id = excluded.product_id,
             category_id = excluded.category_id,
             body = excluded.body",
        table_name(R::KIND)
    );
    connection
        .execute(
            &sql,
            params![
                record.key(),
                record.attribute(Attribute::ProductId),
                record.attribute(Attribute::CategoryId),
                body
            ],
        )
        .map_err(db_error)?;
    Ok(())
}

/// Runs a filtered scan in key order.
fn scan_records<R: Record>(
    connection: &Connection,
    query: &ScanQuery,
) -> Result<Vec<R>, SqliteStoreError> {
    let limit = match query.limit {
        Some(limit) => i64::try_from(limit)
            .map_err(|_| SqliteStoreError::Invalid("scan limit out of range".to_string()))?,
        None => -1,
    };
    let table = table_name(R::KIND);
    let bodies: Vec<String> = match &query.filter {
        Some(filter) => {
            let sql = format!(
                "SELECT body FROM {table} WHERE {} = ?1 ORDER BY key LIMIT ?2",
                filter.attribute.as_str()
            );
            let mut statement = connection.prepare(&sql).map_err(db_error)?;
            let rows = statement
                .query_map(params![filter.value, limit], |row| row.get(0))
                .map_err(db_error)?;
            rows.collect::<Result<_, _>>().map_err(db_error)?
        }
        None => {
            let sql = format!("SELECT body FROM {table} ORDER BY key LIMIT ?1");
            let mut statement = connection.prepare(&sql).map_err(db_error)?;
            let rows = statement.query_map(params![limit], |row| row.get(0)).map_err(db_error)?;
            rows.collect::<Result<_, _>>().map_err(db_error)?
        }
    };
    bodies.iter().map(|body| decode_record(body)).collect()
}

/// Decodes a stored JSON body.
fn decode_record<R: Record>(body: &str) -> Result<R, SqliteStoreError> {
    serde_json::from_str(body).map_err(|err| {
        SqliteStoreError::Invalid(format!("corrupt {} record: {err}", R::KIND.as_str()))
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies the configured `SQLite` pragmas.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            for kind in RecordKind::ALL {
                let table = table_name(kind);
                tx.execute_batch(&format!(
                    "CREATE TABLE IF NOT EXISTS {table} (
                        key TEXT PRIMARY KEY NOT NULL,
                        product_id TEXT,
                        category_id TEXT,
                        body TEXT NOT NULL
                    );
                    CREATE INDEX IF NOT EXISTS idx_{table}_product_id ON {table} (product_id);
                    CREATE INDEX IF NOT EXISTS idx_{table}_category_id ON {table} (category_id);"
                ))
                .map_err(db_error)?;
            }
        }
        Some(SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "expected schema version {SCHEMA_VERSION}, found {other}"
            )));
        }
    }
    tx.commit().map_err(db_error)
}
