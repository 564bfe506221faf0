use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use pm_core::constants::entities;
use pm_models::{NewTenant, Tenant, TenantFilter, TenantUpdate};

use crate::error::{ApiError, ApiResult, JsonBody};
use crate::routes::{default_limit, page};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct TenantQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    landlord_id: Option<i64>,
    property_id: Option<i64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tenants", post(create).get(list))
        .route("/tenants/:id", get(read).put(update).delete(remove))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(new): JsonBody<NewTenant>,
) -> ApiResult<(StatusCode, Json<Tenant>)> {
    let tenant = state.directory.create_tenant(&new)?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

async fn list(State(state): State<AppState>, Query(query): Query<TenantQuery>) -> ApiResult<Json<Vec<Tenant>>> {
    let filter = TenantFilter {
        landlord_id: query.landlord_id,
        property_id: query.property_id,
    };
    Ok(Json(state.directory.list_tenants(&filter, page(query.skip, query.limit))?))
}

async fn read(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Tenant>> {
    state
        .directory
        .get_tenant(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(entities::TENANT))
}

/// Partial update. `"property_id": null` moves the tenant out.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(changes): JsonBody<TenantUpdate>,
) -> ApiResult<Json<Tenant>> {
    state
        .directory
        .update_tenant(id, &changes)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(entities::TENANT))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    if state.directory.delete_tenant(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(entities::TENANT))
    }
}
