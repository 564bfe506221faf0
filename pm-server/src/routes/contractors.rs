use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use pm_core::constants::entities;
use pm_models::{Contractor, ContractorFilter, ContractorUpdate, NewContractor};

use crate::error::{ApiError, ApiResult, JsonBody};
use crate::routes::{default_limit, page};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ContractorQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    landlord_id: Option<i64>,
    /// Work label, e.g. `plumbing`.
    work: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contractors", post(create).get(list))
        .route("/contractors/:id", get(read).put(update).delete(remove))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(new): JsonBody<NewContractor>,
) -> ApiResult<(StatusCode, Json<Contractor>)> {
    let contractor = state.directory.create_contractor(&new)?;
    Ok((StatusCode::CREATED, Json(contractor)))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ContractorQuery>,
) -> ApiResult<Json<Vec<Contractor>>> {
    let filter = ContractorFilter {
        landlord_id: query.landlord_id,
        work: query.work,
    };
    Ok(Json(state.directory.list_contractors(&filter, page(query.skip, query.limit))?))
}

async fn read(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Contractor>> {
    state
        .directory
        .get_contractor(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(entities::CONTRACTOR))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(changes): JsonBody<ContractorUpdate>,
) -> ApiResult<Json<Contractor>> {
    state
        .directory
        .update_contractor(id, &changes)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(entities::CONTRACTOR))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    if state.directory.delete_contractor(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(entities::CONTRACTOR))
    }
}
