use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use pm_core::constants::APP_NAME;
use pm_llm::ChatModel;
use pm_services::Service;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Liveness, service states and row counts. Does not call the model.
async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let stats = state.directory.stats()?;
    let healthy = state.directory.is_healthy() && state.assistant.is_healthy();
    Ok(Json(json!({
        "status": if healthy { "ok" } else { "degraded" },
        "services": {
            "directory": state.directory.state().as_str(),
            "assistant": state.assistant.state().as_str(),
        },
        "service": APP_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.assistant.model().model_name(),
        "sessions": state.sessions.len().await,
        "database": stats,
    })))
}
