//! Property entity model.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use pm_core::error::{PmError, PmResult};

use crate::db::db_error;
use crate::queries::{self, Assignments, Page, SqlFilter};

/// A rental property owned by one landlord, holding at most one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub address: String,
    pub landlord_id: i64,
}

/// Fields required to create a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProperty {
    pub address: String,
    pub landlord_id: i64,
}

/// Partial property update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyUpdate {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub landlord_id: Option<i64>,
}

/// List filter for properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub landlord_id: Option<i64>,
}

impl Property {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            address: row.get("address")?,
            landlord_id: row.get("landlord_id")?,
        })
    }

    // ─── Static finders ──────────────────────────────────────────────────

    /// Find a property by ID.
    pub fn find_by_id(conn: &Connection, id: i64) -> PmResult<Option<Self>> {
        match conn.query_row("SELECT * FROM properties WHERE id = ?1", [id], Self::from_row) {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PmError::Database(e.to_string())),
        }
    }

    /// Whether a property with this ID exists.
    pub fn exists(conn: &Connection, id: i64) -> PmResult<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM properties WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )
        .map_err(|e| PmError::Database(e.to_string()))
    }

    /// List properties ordered by ID.
    pub fn list(conn: &Connection, filter: &PropertyFilter, page: Page) -> PmResult<Vec<Self>> {
        let mut sql_filter = SqlFilter::new();
        sql_filter.eq("landlord_id", filter.landlord_id);
        queries::select_page(conn, "properties", sql_filter, page, Self::from_row)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn insert(conn: &Connection, new: &NewProperty) -> PmResult<Self> {
        conn.execute(
            "INSERT INTO properties (address, landlord_id) VALUES (?1, ?2)",
            params![new.address, new.landlord_id],
        )
        .map_err(db_error)?;

        Ok(Self {
            id: conn.last_insert_rowid(),
            address: new.address.clone(),
            landlord_id: new.landlord_id,
        })
    }

    /// Apply a partial update. Returns `None` when the property does not exist.
    pub fn update(conn: &Connection, id: i64, changes: &PropertyUpdate) -> PmResult<Option<Self>> {
        let mut sets = Assignments::new();
        sets.set("address", changes.address.clone())
            .set("landlord_id", changes.landlord_id);

        if !sets.is_empty() && sets.apply(conn, "properties", id)? == 0 {
            return Ok(None);
        }
        Self::find_by_id(conn, id)
    }

    /// Delete a property by ID. Referencing tenants or issues block the delete.
    pub fn delete(conn: &Connection, id: i64) -> PmResult<bool> {
        let changed = conn
            .execute("DELETE FROM properties WHERE id = ?1", [id])
            .map_err(db_error)?;
        Ok(changed > 0)
    }
}
