//! Database Layer with Connection Pooling and Safe Transactions
//!
//! SQLite database layer featuring:
//! - Connection pooling via r2d2 for concurrent access
//! - Panic-safe `BEGIN IMMEDIATE` transactions with automatic rollback
//! - Version-tracked migrations
//! - WAL mode for concurrent readers during reference rewrites

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, TransactionBehavior};

use crate::config::StorageConfig;
use crate::constants::database as defaults;
use crate::types::{Result, ResultExt, WikiError};

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

const SCHEMA: &str = include_str!("schema.sql");

/// Current schema version for migration tracking
const SCHEMA_VERSION: u32 = 2;

/// Migration definitions
struct Migration {
    version: u32,
    description: &'static str,
    up: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Enable incremental WAL checkpoints",
        up: "PRAGMA wal_autocheckpoint = 1000",
    },
    Migration {
        version: 2,
        description: "Index references by referenced name",
        up: "CREATE INDEX IF NOT EXISTS idx_wiki_references_name
             ON wiki_references(referenced_name, link_type)",
    },
];

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,
    /// Minimum idle connections to keep ready
    pub min_idle: u32,
    /// Timeout for acquiring a connection (seconds)
    pub connection_timeout_secs: u64,
}

impl PoolConfig {
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            max_size: config.pool_max_size,
            min_idle: (config.pool_max_size / 4).max(1),
            connection_timeout_secs: config.connection_timeout_secs,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: defaults::DEFAULT_POOL_SIZE,
            min_idle: 1,
            connection_timeout_secs: defaults::DEFAULT_CONNECTION_TIMEOUT_SECS,
        }
    }
}

/// Row counts across the wiki
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DatabaseStats {
    pub webs: usize,
    pub pages: usize,
    pub revisions: usize,
    pub references: usize,
    pub schema_version: u32,
}

/// Thread-safe database with connection pooling.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl Database {
    /// Open database with connection pooling at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, PoolConfig::default())
    }

    /// Open database with custom pool configuration.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: PoolConfig) -> Result<Self> {
        let manager =
            SqliteConnectionManager::file(path.as_ref()).with_init(Self::configure_connection);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.min_idle.min(config.max_size)))
            .connection_timeout(std::time::Duration::from_secs(
                config.connection_timeout_secs,
            ))
            .build(manager)
            .map_err(|e| WikiError::Storage(format!("Failed to create connection pool: {}", e)))?;

        tracing::debug!(
            path = %path.as_ref().display(),
            max_size = config.max_size,
            "Opened database"
        );
        Ok(Self { pool })
    }

    /// Open an in-memory database for testing or temporary use.
    ///
    /// The pool holds a single connection; callers must not hold one
    /// connection while acquiring another.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| WikiError::Storage(format!("Failed to create in-memory pool: {}", e)))?;

        Ok(Self { pool })
    }

    /// Configure a new connection.
    fn configure_connection(conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA cache_size = -16000;
            "#,
        )?;
        conn.busy_timeout(std::time::Duration::from_millis(defaults::BUSY_TIMEOUT_MS))?;
        Ok(())
    }

    /// Get a connection from the pool.
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            WikiError::Storage(format!("Failed to acquire database connection: {}", e))
        })
    }

    /// Initialize database schema and bring older databases up to date.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        let existing_version = Self::user_version(&conn)?;

        conn.execute_batch(SCHEMA)
            .with_context("Failed to initialize database schema")?;

        // schema.sql already contains everything the migrations add
        if existing_version == 0 {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .with_context("Failed to set schema version")?;
        }

        drop(conn);
        self.migrate()?;
        Ok(())
    }

    fn user_version(conn: &Connection) -> Result<u32> {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .with_context("Failed to read schema version")
    }

    /// Run version-tracked migrations.
    fn migrate(&self) -> Result<()> {
        let conn = self.conn()?;
        let current_version = Self::user_version(&conn)?;

        for migration in MIGRATIONS {
            if migration.version > current_version {
                conn.execute_batch(migration.up).with_context_fn(|| {
                    format!(
                        "Failed to apply migration {}: {}",
                        migration.version, migration.description
                    )
                })?;

                tracing::info!(
                    "Applied migration {}: {}",
                    migration.version,
                    migration.description
                );
            }
        }

        if current_version < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .with_context("Failed to update schema version")?;
        }

        Ok(())
    }

    /// Get a raw connection for advanced operations.
    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.conn()
    }

    /// Execute a single SQL statement.
    pub fn execute(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<usize> {
        let conn = self.conn()?;
        conn.execute(sql, params)
            .with_context("Failed to execute SQL")
    }

    /// Execute a function within a panic-safe database transaction.
    ///
    /// The transaction starts with `BEGIN IMMEDIATE`, so concurrent writers
    /// queue up instead of failing on lock upgrade. It commits when the
    /// closure returns `Ok` and rolls back on `Err` or panic.
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .with_context("Failed to start transaction")?;

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&tx)));

        match result {
            Ok(Ok(value)) => {
                tx.commit().with_context("Failed to commit transaction")?;
                Ok(value)
            }
            Ok(Err(e)) => {
                // Rolled back on drop
                Err(e)
            }
            Err(panic_payload) => {
                let panic_msg = panic_payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "Unknown panic".to_string());

                tracing::error!("Transaction panicked: {}", panic_msg);
                Err(WikiError::Storage(format!(
                    "Transaction panicked: {}",
                    panic_msg
                )))
            }
        }
    }

    /// Row counts for status reporting
    pub fn stats(&self) -> Result<DatabaseStats> {
        let conn = self.conn()?;
        let count = |table: &str| -> Result<usize> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
            .with_context_fn(|| format!("Failed to count {}", table))
        };

        Ok(DatabaseStats {
            webs: count("webs")?,
            pages: count("pages")?,
            revisions: count("revisions")?,
            references: count("wiki_references")?,
            schema_version: Self::user_version(&conn)?,
        })
    }
}
