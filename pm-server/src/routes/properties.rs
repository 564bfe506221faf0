use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use pm_core::constants::entities;
use pm_models::{Issue, NewProperty, Property, PropertyFilter, PropertyUpdate, Tenant};

use crate::error::{ApiError, ApiResult, JsonBody};
use crate::routes::{default_limit, page};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct PropertyQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    landlord_id: Option<i64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/properties", post(create).get(list))
        .route("/properties/:id", get(read).put(update).delete(remove))
        .route("/properties/:id/tenant", get(tenant))
        .route("/properties/:id/issues", get(issues))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(new): JsonBody<NewProperty>,
) -> ApiResult<(StatusCode, Json<Property>)> {
    let property = state.directory.create_property(&new)?;
    Ok((StatusCode::CREATED, Json(property)))
}

async fn list(State(state): State<AppState>, Query(query): Query<PropertyQuery>) -> ApiResult<Json<Vec<Property>>> {
    let filter = PropertyFilter { landlord_id: query.landlord_id };
    Ok(Json(state.directory.list_properties(&filter, page(query.skip, query.limit))?))
}

async fn read(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Property>> {
    state
        .directory
        .get_property(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(entities::PROPERTY))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(changes): JsonBody<PropertyUpdate>,
) -> ApiResult<Json<Property>> {
    state
        .directory
        .update_property(id, &changes)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(entities::PROPERTY))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    if state.directory.delete_property(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(entities::PROPERTY))
    }
}

/// The current tenant, or `null` when the property is vacant.
async fn tenant(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Option<Tenant>>> {
    Ok(Json(state.directory.property_tenant(id)?))
}

async fn issues(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Vec<Issue>>> {
    Ok(Json(state.directory.property_issues(id)?))
}
