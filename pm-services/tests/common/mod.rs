//! Shared test utilities for service integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tempfile::TempDir;

use pm_core::config::{AssistantConfig, DatabaseConfig};
use pm_core::error::{PmError, PmResult};
use pm_llm::{ChatMessage, ChatModel, ChatReply, FragmentStream, ToolCall, ToolSpec};
use pm_models::{Database, Landlord, NewLandlord, NewProperty, Property};
use pm_services::{AssistantService, DirectoryService};

/// Create a directory service over a temporary database.
/// The TempDir must be held alive for the duration of the test.
pub fn create_test_directory() -> (DirectoryService, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("test.db");
    let db = Database::init(&path, &DatabaseConfig::default()).expect("failed to init test database");
    (DirectoryService::new(db), dir)
}

/// Insert one landlord with one property. Returns (landlord, property).
pub fn seed_landlord_with_property(directory: &DirectoryService) -> (Landlord, Property) {
    let landlord = directory
        .create_landlord(&NewLandlord {
            name: "Test Landlord".into(),
            phone_number: "555-0000".into(),
            email: "landlord@test.com".into(),
        })
        .expect("failed to insert landlord");
    let property = directory
        .create_property(&NewProperty {
            address: "1 Test Road".into(),
            landlord_id: landlord.id,
        })
        .expect("failed to insert property");
    (landlord, property)
}

/// One scripted model answer.
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply(ChatReply),
    Fail(String),
}

impl Scripted {
    pub fn text(content: &str) -> Self {
        Self::Reply(ChatReply::text(content))
    }

    pub fn tool(name: &str, arguments: Value) -> Self {
        Self::Reply(ChatReply {
            content: String::new(),
            tool_calls: vec![ToolCall::new(name, arguments)],
        })
    }
}

/// A recorded model invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub messages: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
    pub streamed: bool,
}

/// Chat model that answers from a script and records every call.
///
/// When the script runs dry it answers `"ok"`.
#[derive(Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, messages: &[ChatMessage], tools: &[ToolSpec], streamed: bool) -> PmResult<ChatReply> {
        self.calls.lock().unwrap().push(Invocation {
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
            streamed,
        });
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail(message)) => Err(PmError::Llm { status: 500, message }),
            None => Ok(ChatReply::text("ok")),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> PmResult<ChatReply> {
        self.next(messages, tools, false)
    }

    async fn chat_stream(&self, messages: &[ChatMessage]) -> PmResult<FragmentStream> {
        let reply = self.next(messages, &[], true)?;
        let fragments: Vec<PmResult<String>> = reply
            .content
            .split_inclusive(' ')
            .map(|f| Ok(f.to_string()))
            .collect();
        Ok(futures::stream::iter(fragments).boxed())
    }
}

/// Assistant wired to a scripted model and a fresh temp database.
pub fn create_test_assistant(
    script: Vec<Scripted>,
    settings: AssistantConfig,
) -> (AssistantService, Arc<ScriptedModel>, TempDir) {
    let (directory, dir) = create_test_directory();
    let model = ScriptedModel::new(script);
    let assistant = AssistantService::new(model.clone(), directory, settings);
    (assistant, model, dir)
}
