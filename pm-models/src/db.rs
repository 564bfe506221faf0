//! Database initialization, connection pooling, and lifecycle management.
//!
//! Uses SQLite in WAL mode with r2d2 connection pooling.
//! Runs integrity checks on startup and applies versioned migrations.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, ErrorCode};
use tracing::{info, warn, error};

use pm_core::error::{PmError, PmResult};
use pm_core::config::DatabaseConfig;

use crate::schema;
use crate::migrations;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Map a rusqlite error onto the workspace error type.
///
/// Constraint failures (unique email, dangling landlord or property reference,
/// second tenant on a property) become `PmError::Constraint`.
pub fn db_error(e: rusqlite::Error) -> PmError {
    match &e {
        rusqlite::Error::SqliteFailure(err, msg) if err.code == ErrorCode::ConstraintViolation => {
            PmError::Constraint(msg.clone().unwrap_or_else(|| e.to_string()))
        }
        _ => PmError::Database(e.to_string()),
    }
}

/// Database wrapper providing initialization, pooling, and lifecycle management.
#[derive(Clone)]
pub struct Database {
    pool: Arc<DbPool>,
}

impl Database {
    /// Initialize the database at the given path with the provided configuration.
    ///
    /// This:
    /// 1. Creates the database file and parent directories if needed
    /// 2. Enables WAL mode and foreign keys on every pooled connection
    /// 3. Sets up connection pooling
    /// 4. Runs integrity checks if configured
    /// 5. Creates the schema tables
    /// 6. Runs pending migrations
    pub fn init(db_path: &Path, config: &DatabaseConfig) -> PmResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("initializing database at {}", db_path.display());

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_customizer(Box::new(ConnectionCustomizer {
                wal_mode: config.wal_mode,
            }))
            .build(manager)
            .map_err(|e| PmError::Pool(e.to_string()))?;

        let db = Self {
            pool: Arc::new(pool),
        };

        if config.integrity_check_on_startup {
            db.run_integrity_check()?;
        }

        {
            let conn = db.conn()?;
            schema::create_tables(&conn)?;
            migrations::run_migrations(&conn)?;
        }

        info!("database initialized successfully");
        Ok(db)
    }

    /// Get a connection from the pool.
    ///
    /// The connection returns to the pool when the guard is dropped, on
    /// success and error paths alike.
    pub fn conn(&self) -> PmResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| PmError::Pool(e.to_string()))
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Run a SQLite integrity check.
    pub fn run_integrity_check(&self) -> PmResult<()> {
        let conn = self.conn()?;
        let result: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| PmError::Database(e.to_string()))?;

        if result != "ok" {
            error!("database integrity check failed: {result}");
            return Err(PmError::IntegrityCheck(result));
        }

        info!("database integrity check passed");
        Ok(())
    }

    /// Execute a function within a database transaction.
    pub fn transaction<T, F>(&self, f: F) -> PmResult<T>
    where
        F: FnOnce(&Connection) -> PmResult<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| PmError::Database(e.to_string()))?;

        let result = f(&tx)?;

        tx.commit()
            .map_err(|e| PmError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get database statistics (row counts per table).
    pub fn stats(&self) -> PmResult<DatabaseStats> {
        let conn = self.conn()?;

        let count = |sql: &str| -> PmResult<i64> {
            conn.query_row(sql, [], |row| row.get(0))
                .map_err(|e| PmError::Database(e.to_string()))
        };

        Ok(DatabaseStats {
            landlords: count("SELECT COUNT(*) FROM landlords")?,
            tenants: count("SELECT COUNT(*) FROM tenants")?,
            properties: count("SELECT COUNT(*) FROM properties")?,
            contractors: count("SELECT COUNT(*) FROM contractors")?,
            issues: count("SELECT COUNT(*) FROM issues")?,
            open_issues: count("SELECT COUNT(*) FROM issues WHERE resolved = 0")?,
        })
    }

    /// Reset the database by dropping and recreating all tables.
    pub fn reset(&self) -> PmResult<()> {
        warn!("resetting database - all data will be lost");
        let conn = self.conn()?;
        schema::drop_tables(&conn)?;
        schema::create_tables(&conn)?;
        migrations::run_migrations(&conn)?;
        info!("database reset complete");
        Ok(())
    }
}

/// Database row count statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DatabaseStats {
    pub landlords: i64,
    pub tenants: i64,
    pub properties: i64,
    pub contractors: i64,
    pub issues: i64,
    pub open_issues: i64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "landlords={}, tenants={}, properties={}, contractors={}, issues={} ({} open)",
            self.landlords, self.tenants, self.properties, self.contractors, self.issues,
            self.open_issues
        )
    }
}

/// r2d2 connection customizer that applies PRAGMA settings.
#[derive(Debug)]
struct ConnectionCustomizer {
    wal_mode: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        if self.wal_mode {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }

        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;",
        )?;

        Ok(())
    }
}
