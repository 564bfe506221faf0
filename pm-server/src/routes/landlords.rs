//! `/landlords` plus the landlord relationship reads.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use pm_core::constants::entities;
use pm_models::{Contractor, Landlord, LandlordUpdate, NewLandlord, Page, Property, Tenant};

use crate::error::{ApiError, ApiResult, JsonBody};
use crate::routes::page;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/landlords", post(create).get(list))
        .route("/landlords/:id", get(read).put(update).delete(remove))
        .route("/landlords/:id/properties", get(properties))
        .route("/landlords/:id/tenants", get(tenants))
        .route("/landlords/:id/contractors", get(contractors))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(new): JsonBody<NewLandlord>,
) -> ApiResult<(StatusCode, Json<Landlord>)> {
    let landlord = state.directory.create_landlord(&new)?;
    Ok((StatusCode::CREATED, Json(landlord)))
}

async fn list(State(state): State<AppState>, Query(query): Query<Page>) -> ApiResult<Json<Vec<Landlord>>> {
    Ok(Json(state.directory.list_landlords(page(query.skip, query.limit))?))
}

async fn read(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Landlord>> {
    state
        .directory
        .get_landlord(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(entities::LANDLORD))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(changes): JsonBody<LandlordUpdate>,
) -> ApiResult<Json<Landlord>> {
    state
        .directory
        .update_landlord(id, &changes)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(entities::LANDLORD))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    if state.directory.delete_landlord(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(entities::LANDLORD))
    }
}

async fn properties(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Vec<Property>>> {
    Ok(Json(state.directory.landlord_properties(id)?))
}

async fn tenants(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Vec<Tenant>>> {
    Ok(Json(state.directory.landlord_tenants(id)?))
}

async fn contractors(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Vec<Contractor>>> {
    Ok(Json(state.directory.landlord_contractors(id)?))
}
