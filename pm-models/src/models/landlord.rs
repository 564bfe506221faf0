//! Landlord entity model.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use pm_core::error::{PmError, PmResult};

use crate::db::db_error;
use crate::queries::{self, Assignments, Page, SqlFilter};

/// A landlord owns properties and employs contractors; tenants rent from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landlord {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub email: String,
}

/// Fields required to create a landlord.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLandlord {
    pub name: String,
    pub phone_number: String,
    pub email: String,
}

/// Partial landlord update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandlordUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Landlord {
    /// Construct a Landlord from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            phone_number: row.get("phone_number")?,
            email: row.get("email")?,
        })
    }

    // ─── Static finders ──────────────────────────────────────────────────

    /// Find a landlord by ID.
    pub fn find_by_id(conn: &Connection, id: i64) -> PmResult<Option<Self>> {
        match conn.query_row("SELECT * FROM landlords WHERE id = ?1", [id], Self::from_row) {
            Ok(l) => Ok(Some(l)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PmError::Database(e.to_string())),
        }
    }

    /// Find a landlord by email address.
    pub fn find_by_email(conn: &Connection, email: &str) -> PmResult<Option<Self>> {
        match conn.query_row("SELECT * FROM landlords WHERE email = ?1", [email], Self::from_row) {
            Ok(l) => Ok(Some(l)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PmError::Database(e.to_string())),
        }
    }

    /// List landlords ordered by ID.
    pub fn list(conn: &Connection, page: Page) -> PmResult<Vec<Self>> {
        queries::select_page(conn, "landlords", SqlFilter::new(), page, Self::from_row)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Insert a new landlord and return the stored row.
    pub fn insert(conn: &Connection, new: &NewLandlord) -> PmResult<Self> {
        conn.execute(
            "INSERT INTO landlords (name, phone_number, email) VALUES (?1, ?2, ?3)",
            params![new.name, new.phone_number, new.email],
        )
        .map_err(db_error)?;

        Ok(Self {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            phone_number: new.phone_number.clone(),
            email: new.email.clone(),
        })
    }

    /// Apply a partial update. Returns `None` when the landlord does not exist.
    pub fn update(conn: &Connection, id: i64, changes: &LandlordUpdate) -> PmResult<Option<Self>> {
        let mut sets = Assignments::new();
        sets.set("name", changes.name.clone())
            .set("phone_number", changes.phone_number.clone())
            .set("email", changes.email.clone());

        if !sets.is_empty() && sets.apply(conn, "landlords", id)? == 0 {
            return Ok(None);
        }
        Self::find_by_id(conn, id)
    }

    /// Delete a landlord by ID.
    ///
    /// Fails with a constraint error while properties, tenants or contractors
    /// still reference the landlord.
    pub fn delete(conn: &Connection, id: i64) -> PmResult<bool> {
        let changed = conn
            .execute("DELETE FROM landlords WHERE id = ?1", [id])
            .map_err(db_error)?;
        Ok(changed > 0)
    }
}
