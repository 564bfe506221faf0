//! Query helpers shared by the entity models.
//!
//! Offset pagination, dynamic `WHERE` filters and partial `UPDATE` builders.
//! All values travel as bound parameters; only column and table names (which
//! are compile-time constants) are formatted into SQL.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};

use pm_core::constants::DEFAULT_LIST_LIMIT;
use pm_core::error::PmResult;

use crate::db::db_error;
use crate::models::contractor::Contractor;
use crate::models::issue::Issue;
use crate::models::landlord::Landlord;
use crate::models::property::Property;
use crate::models::tenant::Tenant;

/// Offset pagination window. `limit` has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl Page {
    /// Build a window, clamping negative values to zero.
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip: skip.max(0),
            limit: limit.max(0),
        }
    }

    /// Every row.
    pub fn all() -> Self {
        Self { skip: 0, limit: -1 }
    }
}

// ─── Filters ────────────────────────────────────────────────────────────────

/// Conjunction of `WHERE` clauses with their bound values.
#[derive(Debug, Default)]
pub(crate) struct SqlFilter {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl SqlFilter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add `column = ?` when a value is present.
    pub(crate) fn eq<T: Into<Value>>(&mut self, column: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.clauses.push(format!("{column} = ?"));
            self.values.push(value.into());
        }
        self
    }

    /// Add a raw clause with one placeholder when a value is present.
    pub(crate) fn clause<T: Into<Value>>(&mut self, sql: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.clauses.push(sql.to_string());
            self.values.push(value.into());
        }
        self
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

/// Run `SELECT * FROM {table}` with a filter and page, ordered by id.
pub(crate) fn select_page<T, F>(
    conn: &Connection,
    table: &str,
    filter: SqlFilter,
    page: Page,
    map: F,
) -> PmResult<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let sql = format!(
        "SELECT * FROM {table}{} ORDER BY id LIMIT ? OFFSET ?",
        filter.where_sql()
    );
    let mut values = filter.values;
    values.push(Value::Integer(page.limit));
    values.push(Value::Integer(page.skip));

    let mut stmt = conn.prepare(&sql).map_err(db_error)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), map)
        .map_err(db_error)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(db_error)
}

// ─── Partial updates ────────────────────────────────────────────────────────

/// Column assignments for a partial `UPDATE`. Only supplied fields are set.
#[derive(Debug, Default)]
pub(crate) struct Assignments {
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl Assignments {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Set a column when the field was supplied.
    pub(crate) fn set<T: Into<Value>>(&mut self, column: &'static str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.columns.push(column);
            self.values.push(value.into());
        }
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Apply the assignments to one row. Returns the number of rows changed.
    pub(crate) fn apply(self, conn: &Connection, table: &str, id: i64) -> PmResult<usize> {
        let sets: Vec<String> = self.columns.iter().map(|c| format!("{c} = ?")).collect();
        let sql = format!("UPDATE {table} SET {} WHERE id = ?", sets.join(", "));
        let mut values = self.values;
        values.push(Value::Integer(id));
        conn.execute(&sql, params_from_iter(values.iter()))
            .map_err(db_error)
    }
}

// ─── Dataset ────────────────────────────────────────────────────────────────

/// Every row of every entity, ordered by id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    pub tenants: Vec<Tenant>,
    pub landlords: Vec<Landlord>,
    pub properties: Vec<Property>,
    pub issues: Vec<Issue>,
    pub contractors: Vec<Contractor>,
}

/// Load the whole dataset. Call inside a transaction for a consistent view.
pub fn load_dataset(conn: &Connection) -> PmResult<Dataset> {
    Ok(Dataset {
        tenants: Tenant::list(conn, &Default::default(), Page::all())?,
        landlords: Landlord::list(conn, Page::all())?,
        properties: Property::list(conn, &Default::default(), Page::all())?,
        issues: Issue::list(conn, &Default::default(), Page::all())?,
        contractors: Contractor::list(conn, &Default::default(), Page::all())?,
    })
}
