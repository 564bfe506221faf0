//! Contractor entity model.

use serde::{Deserialize, Serialize};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use pm_core::error::{PmError, PmResult};

use crate::db::db_error;
use crate::queries::{self, Assignments, Page, SqlFilter};

/// A contractor working for a landlord, tagged with the kinds of work they do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contractor {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    /// Work-category labels, e.g. `["plumbing", "electrical"]`.
    pub work: Vec<String>,
    pub landlord_id: i64,
}

/// Fields required to create a contractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContractor {
    pub name: String,
    pub phone_number: String,
    pub email: String,
    #[serde(default)]
    pub work: Vec<String>,
    pub landlord_id: i64,
}

/// Partial contractor update. A supplied `work` list replaces the stored one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractorUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub work: Option<Vec<String>>,
    #[serde(default)]
    pub landlord_id: Option<i64>,
}

/// List filter for contractors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractorFilter {
    pub landlord_id: Option<i64>,
    /// Only contractors carrying this work label.
    pub work: Option<String>,
}

/// Trim labels, drop blanks and duplicates, keep first-seen order.
pub fn normalize_work(labels: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.trim();
        if !label.is_empty() && !out.iter().any(|l| l == label) {
            out.push(label.to_string());
        }
    }
    out
}

fn encode_work(labels: &[String]) -> PmResult<String> {
    Ok(serde_json::to_string(&normalize_work(labels))?)
}

impl Contractor {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let raw: String = row.get("work")?;
        let work = serde_json::from_str(&raw).map_err(|e| {
            let idx = row.as_ref().column_index("work").unwrap_or(0);
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        })?;

        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            phone_number: row.get("phone_number")?,
            email: row.get("email")?,
            work,
            landlord_id: row.get("landlord_id")?,
        })
    }

    // ─── Static finders ──────────────────────────────────────────────────

    /// Find a contractor by ID.
    pub fn find_by_id(conn: &Connection, id: i64) -> PmResult<Option<Self>> {
        match conn.query_row("SELECT * FROM contractors WHERE id = ?1", [id], Self::from_row) {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PmError::Database(e.to_string())),
        }
    }

    /// List contractors ordered by ID.
    pub fn list(conn: &Connection, filter: &ContractorFilter, page: Page) -> PmResult<Vec<Self>> {
        let mut sql_filter = SqlFilter::new();
        sql_filter.eq("landlord_id", filter.landlord_id).clause(
            "EXISTS (SELECT 1 FROM json_each(contractors.work) WHERE json_each.value = ?)",
            filter.work.as_ref().map(|w| w.trim().to_string()),
        );
        queries::select_page(conn, "contractors", sql_filter, page, Self::from_row)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn insert(conn: &Connection, new: &NewContractor) -> PmResult<Self> {
        let work = normalize_work(&new.work);
        conn.execute(
            "INSERT INTO contractors (name, phone_number, email, work, landlord_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![new.name, new.phone_number, new.email, encode_work(&work)?, new.landlord_id],
        )
        .map_err(db_error)?;

        Ok(Self {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            phone_number: new.phone_number.clone(),
            email: new.email.clone(),
            work,
            landlord_id: new.landlord_id,
        })
    }

    /// Apply a partial update. Returns `None` when the contractor does not exist.
    pub fn update(conn: &Connection, id: i64, changes: &ContractorUpdate) -> PmResult<Option<Self>> {
        let work = changes.work.as_deref().map(encode_work).transpose()?;

        let mut sets = Assignments::new();
        sets.set("name", changes.name.clone())
            .set("phone_number", changes.phone_number.clone())
            .set("email", changes.email.clone())
            .set("work", work)
            .set("landlord_id", changes.landlord_id);

        if !sets.is_empty() && sets.apply(conn, "contractors", id)? == 0 {
            return Ok(None);
        }
        Self::find_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> PmResult<bool> {
        let changed = conn
            .execute("DELETE FROM contractors WHERE id = ?1", [id])
            .map_err(db_error)?;
        Ok(changed > 0)
    }
}
