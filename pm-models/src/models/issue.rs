//! Maintenance issue entity model.

use serde::{Deserialize, Serialize};
use rusqlite::{params, Connection, Row};
use pm_core::error::{PmError, PmResult};

use crate::db::db_error;
use crate::models::double_option;
use crate::queries::{self, Assignments, Page, SqlFilter};

/// A maintenance issue, optionally tied to a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub description: String,
    pub location: String,
    /// Free-text remediation, e.g. "Plumber dispatched".
    pub action: String,
    pub resolved: bool,
    pub property_id: Option<i64>,
}

/// Fields required to file an issue. New issues always start unresolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIssue {
    pub description: String,
    pub location: String,
    pub action: String,
    #[serde(default)]
    pub property_id: Option<i64>,
}

/// Partial issue update. This is the only way `resolved` changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueUpdate {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub resolved: Option<bool>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub property_id: Option<Option<i64>>,
}

/// List filter for issues.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFilter {
    pub property_id: Option<i64>,
    pub resolved: Option<bool>,
}

impl Issue {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            description: row.get("description")?,
            location: row.get("location")?,
            action: row.get("action")?,
            resolved: row.get("resolved")?,
            property_id: row.get("property_id")?,
        })
    }

    // ─── Static finders ──────────────────────────────────────────────────

    /// Find an issue by ID.
    pub fn find_by_id(conn: &Connection, id: i64) -> PmResult<Option<Self>> {
        match conn.query_row("SELECT * FROM issues WHERE id = ?1", [id], Self::from_row) {
            Ok(i) => Ok(Some(i)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PmError::Database(e.to_string())),
        }
    }

    /// List issues ordered by ID.
    pub fn list(conn: &Connection, filter: &IssueFilter, page: Page) -> PmResult<Vec<Self>> {
        let mut sql_filter = SqlFilter::new();
        sql_filter
            .eq("property_id", filter.property_id)
            .eq("resolved", filter.resolved);
        queries::select_page(conn, "issues", sql_filter, page, Self::from_row)
    }

    /// Total number of issues.
    pub fn count(conn: &Connection) -> PmResult<i64> {
        conn.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .map_err(|e| PmError::Database(e.to_string()))
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn insert(conn: &Connection, new: &NewIssue) -> PmResult<Self> {
        conn.execute(
            "INSERT INTO issues (description, location, action, resolved, property_id)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![new.description, new.location, new.action, new.property_id],
        )
        .map_err(db_error)?;

        Ok(Self {
            id: conn.last_insert_rowid(),
            description: new.description.clone(),
            location: new.location.clone(),
            action: new.action.clone(),
            resolved: false,
            property_id: new.property_id,
        })
    }

    /// Apply a partial update. Returns `None` when the issue does not exist.
    pub fn update(conn: &Connection, id: i64, changes: &IssueUpdate) -> PmResult<Option<Self>> {
        let mut sets = Assignments::new();
        sets.set("description", changes.description.clone())
            .set("location", changes.location.clone())
            .set("action", changes.action.clone())
            .set("resolved", changes.resolved)
            .set("property_id", changes.property_id);

        if !sets.is_empty() && sets.apply(conn, "issues", id)? == 0 {
            return Ok(None);
        }
        Self::find_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> PmResult<bool> {
        let changed = conn
            .execute("DELETE FROM issues WHERE id = ?1", [id])
            .map_err(db_error)?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_issue_ignores_resolved_field() {
        let new: NewIssue = serde_json::from_str(
            r#"{"description": "Leak", "location": "Kitchen", "action": "Plumber", "resolved": true}"#,
        )
        .unwrap();
        assert_eq!(new.property_id, None);
    }
}
