//! Chat endpoints: the single default session and explicit sessions.

use std::convert::Infallible;

use async_stream::stream;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use pm_llm::ChatMessage;

use crate::error::{ApiError, ApiResult, JsonBody};
use crate::state::{AppState, SharedConversation};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/stream", post(chat_stream))
        .route("/chat/sessions", post(open_session))
        .route("/chat/sessions/:id", delete(close_session))
        .route("/chat/sessions/:id/messages", post(session_message))
        .route("/chat/sessions/:id/stream", post(session_stream))
        .route("/chat/sessions/:id/history", get(session_history))
}

async fn find_session(state: &AppState, id: &Uuid) -> ApiResult<SharedConversation> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::not_found("Session"))
}

async fn reply(session: SharedConversation, message: &str) -> Json<ChatResponse> {
    let mut conversation = session.lock().await;
    let reply = conversation.send_message(message).await;
    Json(ChatResponse { reply })
}

/// Chunked `text/plain` body carrying the reply fragments as they arrive.
fn streamed_reply(session: SharedConversation, message: String) -> Response {
    let body = Body::from_stream(stream! {
        let mut conversation = session.lock().await;
        let mut fragments = Box::pin(conversation.stream_message(&message));
        while let Some(fragment) = fragments.next().await {
            yield Ok::<_, Infallible>(fragment);
        }
        debug!("streamed chat response finished");
    });
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

async fn chat(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let session = state.sessions.default_session(&state.assistant).await?;
    Ok(reply(session, &request.message).await)
}

async fn chat_stream(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ChatRequest>,
) -> ApiResult<Response> {
    let session = state.sessions.default_session(&state.assistant).await?;
    Ok(streamed_reply(session, request.message))
}

async fn open_session(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<SessionCreated>)> {
    let conversation = state.assistant.new_conversation()?;
    let session_id = state.sessions.insert(conversation).await;
    Ok((StatusCode::CREATED, Json(SessionCreated { session_id })))
}

async fn close_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Session"))
    }
}

async fn session_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let session = find_session(&state, &id).await?;
    Ok(reply(session, &request.message).await)
}

async fn session_stream(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<ChatRequest>,
) -> ApiResult<Response> {
    let session = find_session(&state, &id).await?;
    Ok(streamed_reply(session, request.message))
}

async fn session_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let session = find_session(&state, &id).await?;
    let messages = session.lock().await.messages();
    Ok(Json(messages))
}
