use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use pm_core::constants::entities;
use pm_models::{Issue, IssueFilter, IssueUpdate, NewIssue};

use crate::error::{ApiError, ApiResult, JsonBody};
use crate::routes::{default_limit, page};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct IssueQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    property_id: Option<i64>,
    resolved: Option<bool>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/issues", post(create).get(list))
        .route("/issues/:id", get(read).put(update).delete(remove))
}

/// New issues always start unresolved; a missing property is a 404.
async fn create(
    State(state): State<AppState>,
    JsonBody(new): JsonBody<NewIssue>,
) -> ApiResult<(StatusCode, Json<Issue>)> {
    let issue = state.directory.create_issue(&new)?;
    Ok((StatusCode::CREATED, Json(issue)))
}

async fn list(State(state): State<AppState>, Query(query): Query<IssueQuery>) -> ApiResult<Json<Vec<Issue>>> {
    let filter = IssueFilter {
        property_id: query.property_id,
        resolved: query.resolved,
    };
    Ok(Json(state.directory.list_issues(&filter, page(query.skip, query.limit))?))
}

async fn read(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Issue>> {
    state
        .directory
        .get_issue(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(entities::ISSUE))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(changes): JsonBody<IssueUpdate>,
) -> ApiResult<Json<Issue>> {
    state
        .directory
        .update_issue(id, &changes)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(entities::ISSUE))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    if state.directory.delete_issue(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(entities::ISSUE))
    }
}
