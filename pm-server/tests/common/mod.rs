//! Shared test utilities for HTTP tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pm_core::config::{AssistantConfig, DatabaseConfig};
use pm_core::error::PmResult;
use pm_llm::{ChatMessage, ChatModel, ChatReply, FragmentStream, ToolCall, ToolSpec};
use pm_models::Database;
use pm_server::{build_router, AppState, SessionLimits};
use pm_services::{AssistantService, DirectoryService, Service};

/// Model that files an issue whenever the utterance mentions a leak and
/// otherwise echoes the last message.
#[derive(Default)]
pub struct EchoModel {
    pub calls: Mutex<usize>,
}

fn last_user(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == pm_llm::Role::User)
        .map(|m| m.content.clone())
        .unwrap_or_default()
}

#[async_trait]
impl ChatModel for EchoModel {
    fn model_name(&self) -> &str {
        "echo"
    }

    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> PmResult<ChatReply> {
        *self.calls.lock().unwrap() += 1;
        let last = last_user(messages);
        if !tools.is_empty() {
            if last.contains("leak") {
                return Ok(ChatReply {
                    content: String::new(),
                    tool_calls: vec![ToolCall::new(
                        "create_issue",
                        serde_json::json!({
                            "description": "Leaking faucet",
                            "location": "Kitchen",
                            "action": "Plumber dispatched"
                        }),
                    )],
                });
            }
            return Ok(ChatReply::text(""));
        }
        Ok(ChatReply::text(format!("echo: {last}")))
    }

    async fn chat_stream(&self, messages: &[ChatMessage]) -> PmResult<FragmentStream> {
        use futures::StreamExt;
        let reply = format!("echo: {}", last_user(messages));
        let fragments: Vec<PmResult<String>> =
            reply.split_inclusive(' ').map(|f| Ok(f.to_string())).collect();
        Ok(futures::stream::iter(fragments).boxed())
    }
}

/// Router over a fresh temp database and the echo model.
pub fn create_test_app() -> (Router, AppState, TempDir) {
    create_test_app_with_limits(SessionLimits::default())
}

/// Same as [`create_test_app`] with explicit session bounds.
pub fn create_test_app_with_limits(limits: SessionLimits) -> (Router, AppState, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let db = Database::init(&dir.path().join("test.db"), &DatabaseConfig::default())
        .expect("failed to init test database");
    let mut directory = DirectoryService::new(db);
    directory.init().expect("failed to init directory service");
    let mut assistant = AssistantService::new(
        Arc::new(EchoModel::default()),
        directory.clone(),
        AssistantConfig::default(),
    );
    assistant.init().expect("failed to init assistant service");
    let state = AppState::new(directory, assistant).with_session_limits(limits);
    let app = build_router(state.clone(), &["http://localhost:3000".to_string()]);
    (app, state, dir)
}

/// Send one request through the router; returns status and raw body.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response: Response<Body> = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

/// Like [`send`] but parses the body as JSON (`Null` when empty).
pub async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
