//! Route table.

pub mod health;
pub mod landlords;
pub mod tenants;
pub mod properties;
pub mod contractors;
pub mod issues;
pub mod chat;

use axum::Router;

use pm_core::constants::DEFAULT_LIST_LIMIT;
use pm_models::Page;

use crate::state::AppState;

/// Every route, without middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(landlords::routes())
        .merge(tenants::routes())
        .merge(properties::routes())
        .merge(contractors::routes())
        .merge(issues::routes())
        .merge(chat::routes())
}

pub(crate) fn default_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

/// Build the window from raw `skip`/`limit` query values.
///
/// Negative values clamp to zero, so `limit=-1` returns an empty page rather
/// than reaching SQLite's unbounded `LIMIT -1`.
pub(crate) fn page(skip: i64, limit: i64) -> Page {
    Page::new(skip, limit)
}
