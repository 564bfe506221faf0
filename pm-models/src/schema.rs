//! Database schema definitions and table creation.
//!
//! Five entity tables plus the schema version marker. Every tenant, property
//! and contractor references a landlord; tenants and issues optionally
//! reference a property.

use rusqlite::Connection;
use pm_core::error::{PmError, PmResult};
use tracing::info;

/// Create all database tables and indexes if they do not exist.
pub fn create_tables(conn: &Connection) -> PmResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| PmError::Database(format!("failed to create schema: {e}")))?;
    info!("database schema verified");
    Ok(())
}

/// Drop all tables (used for database reset). Children go first so foreign
/// keys never dangle mid-drop.
pub fn drop_tables(conn: &Connection) -> PmResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS issues;
         DROP TABLE IF EXISTS tenants;
         DROP TABLE IF EXISTS contractors;
         DROP TABLE IF EXISTS properties;
         DROP TABLE IF EXISTS landlords;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| PmError::Database(format!("failed to drop tables: {e}")))?;
    Ok(())
}

/// Complete SQL schema for all tables.
const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

-- Landlords
CREATE TABLE IF NOT EXISTS landlords (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    phone_number    TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE
);

-- Properties
CREATE TABLE IF NOT EXISTS properties (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    address         TEXT NOT NULL,
    landlord_id     INTEGER NOT NULL REFERENCES landlords(id)
);

CREATE INDEX IF NOT EXISTS idx_properties_landlord_id ON properties(landlord_id);

-- Tenants
CREATE TABLE IF NOT EXISTS tenants (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    phone_number    TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    landlord_id     INTEGER NOT NULL REFERENCES landlords(id),
    property_id     INTEGER REFERENCES properties(id)
);

CREATE INDEX IF NOT EXISTS idx_tenants_landlord_id ON tenants(landlord_id);

-- Contractors (work is a JSON array of labels)
CREATE TABLE IF NOT EXISTS contractors (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    phone_number    TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    work            TEXT NOT NULL DEFAULT '[]',
    landlord_id     INTEGER NOT NULL REFERENCES landlords(id)
);

CREATE INDEX IF NOT EXISTS idx_contractors_landlord_id ON contractors(landlord_id);

-- Maintenance issues
CREATE TABLE IF NOT EXISTS issues (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    description     TEXT NOT NULL,
    location        TEXT NOT NULL,
    action          TEXT NOT NULL,
    resolved        INTEGER NOT NULL DEFAULT 0,
    property_id     INTEGER REFERENCES properties(id)
);

CREATE INDEX IF NOT EXISTS idx_issues_property_id ON issues(property_id);
CREATE INDEX IF NOT EXISTS idx_issues_resolved ON issues(resolved);
"#;
