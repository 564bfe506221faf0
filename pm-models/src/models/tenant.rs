//! Tenant entity model.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use pm_core::error::{PmError, PmResult};

use crate::db::db_error;
use crate::models::double_option;
use crate::queries::{self, Assignments, Page, SqlFilter};

/// A tenant renting from a landlord, optionally living in one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub landlord_id: i64,
    pub property_id: Option<i64>,
}

/// Fields required to create a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTenant {
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub landlord_id: i64,
    #[serde(default)]
    pub property_id: Option<i64>,
}

/// Partial tenant update.
///
/// `property_id` is tri-state: absent leaves it alone, `null` moves the
/// tenant out, a number moves them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub landlord_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub property_id: Option<Option<i64>>,
}

/// List filter for tenants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantFilter {
    pub landlord_id: Option<i64>,
    pub property_id: Option<i64>,
}

impl Tenant {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            phone_number: row.get("phone_number")?,
            email: row.get("email")?,
            landlord_id: row.get("landlord_id")?,
            property_id: row.get("property_id")?,
        })
    }

    // ─── Static finders ──────────────────────────────────────────────────

    /// Find a tenant by ID.
    pub fn find_by_id(conn: &Connection, id: i64) -> PmResult<Option<Self>> {
        match conn.query_row("SELECT * FROM tenants WHERE id = ?1", [id], Self::from_row) {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PmError::Database(e.to_string())),
        }
    }

    /// The tenant currently living in a property, if any.
    pub fn find_by_property(conn: &Connection, property_id: i64) -> PmResult<Option<Self>> {
        match conn.query_row(
            "SELECT * FROM tenants WHERE property_id = ?1",
            [property_id],
            Self::from_row,
        ) {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PmError::Database(e.to_string())),
        }
    }

    /// List tenants ordered by ID.
    pub fn list(conn: &Connection, filter: &TenantFilter, page: Page) -> PmResult<Vec<Self>> {
        let mut sql_filter = SqlFilter::new();
        sql_filter
            .eq("landlord_id", filter.landlord_id)
            .eq("property_id", filter.property_id);
        queries::select_page(conn, "tenants", sql_filter, page, Self::from_row)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn insert(conn: &Connection, new: &NewTenant) -> PmResult<Self> {
        conn.execute(
            "INSERT INTO tenants (name, phone_number, email, landlord_id, property_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![new.name, new.phone_number, new.email, new.landlord_id, new.property_id],
        )
        .map_err(db_error)?;

        Ok(Self {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            phone_number: new.phone_number.clone(),
            email: new.email.clone(),
            landlord_id: new.landlord_id,
            property_id: new.property_id,
        })
    }

    /// Apply a partial update. Returns `None` when the tenant does not exist.
    pub fn update(conn: &Connection, id: i64, changes: &TenantUpdate) -> PmResult<Option<Self>> {
        let mut sets = Assignments::new();
        sets.set("name", changes.name.clone())
            .set("phone_number", changes.phone_number.clone())
            .set("email", changes.email.clone())
            .set("landlord_id", changes.landlord_id)
            .set("property_id", changes.property_id);

        if !sets.is_empty() && sets.apply(conn, "tenants", id)? == 0 {
            return Ok(None);
        }
        Self::find_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> PmResult<bool> {
        let changed = conn
            .execute("DELETE FROM tenants WHERE id = ?1", [id])
            .map_err(db_error)?;
        Ok(changed > 0)
    }
}
