//! Versioned database migrations.
//!
//! Migrations run sequentially from the current stored version to the latest.
//! Each migration is an idempotent SQL script.

use rusqlite::Connection;
use tracing::{info, warn};
use pm_core::error::{PmError, PmResult};
use pm_core::constants::DB_SCHEMA_VERSION;

/// Run all pending migrations on the database.
pub fn run_migrations(conn: &Connection) -> PmResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version >= DB_SCHEMA_VERSION {
        info!("database schema is up to date (version {current_version})");
        return Ok(());
    }

    info!("running migrations from version {current_version} to {DB_SCHEMA_VERSION}");

    for version in (current_version + 1)..=DB_SCHEMA_VERSION {
        run_migration(conn, version)?;
    }

    set_schema_version(conn, DB_SCHEMA_VERSION)?;
    info!("migrations complete, schema at version {DB_SCHEMA_VERSION}");
    Ok(())
}

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> PmResult<i32> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .map_err(|e| PmError::Database(e.to_string()))?;

    if count == 0 {
        conn.execute("INSERT INTO schema_version (version) VALUES (0)", [])
            .map_err(|e| PmError::Database(e.to_string()))?;
        return Ok(0);
    }

    conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
        row.get(0)
    })
    .map_err(|e| PmError::Database(e.to_string()))
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> PmResult<()> {
    conn.execute("UPDATE schema_version SET version = ?1", [version])
        .map_err(|e| PmError::Database(e.to_string()))?;
    Ok(())
}

/// Run a specific migration version.
fn run_migration(conn: &Connection, version: i32) -> PmResult<()> {
    info!("applying migration version {version}");

    match version {
        1 => migration_v1(conn),
        2 => migration_v2(conn),
        _ => {
            warn!("unknown migration version {version}, skipping");
            Ok(())
        }
    }
}

/// Migration v1: baseline. The tables themselves come from `schema::create_tables`.
fn migration_v1(_conn: &Connection) -> PmResult<()> {
    Ok(())
}

/// Migration v2: a property holds at most one tenant.
///
/// Older databases may already have several tenants on one property; all but
/// the lowest tenant id are detached before the unique index is created.
fn migration_v2(conn: &Connection) -> PmResult<()> {
    let detached = conn
        .execute(
            "UPDATE tenants SET property_id = NULL
             WHERE property_id IS NOT NULL
               AND id NOT IN (
                   SELECT MIN(id) FROM tenants
                   WHERE property_id IS NOT NULL
                   GROUP BY property_id
               )",
            [],
        )
        .map_err(|e| PmError::Migration(format!("v2 detach duplicates: {e}")))?;

    if detached > 0 {
        warn!("detached {detached} tenant(s) sharing a property before enforcing one tenant per property");
    }

    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_tenants_property_unique ON tenants(property_id);",
    )
    .map_err(|e| PmError::Migration(format!("v2 unique tenant index: {e}")))?;

    Ok(())
}
