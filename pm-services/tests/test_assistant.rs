//! Integration tests for the conversation loop.
//!
//! Tests history growth, tool routing and execution, prompt freshness after
//! store writes, error recording and the streamed variant.

mod common;

use common::Scripted;
use futures::StreamExt;
use serde_json::json;

use pm_core::config::AssistantConfig;
use pm_llm::Role;
use pm_models::queries::Page;
use pm_models::{IssueFilter, IssueUpdate, NewIssue};
use pm_services::assistant::INTERRUPTED_REPLY;
use pm_services::{AssistantService, Service, ServiceState};

fn leak_arguments() -> serde_json::Value {
    json!({
        "description": "Leaking faucet",
        "location": "Kitchen",
        "action": "Plumber dispatched"
    })
}

// ---- Plain turns ----

#[tokio::test]
async fn plain_turns_grow_history_by_two() {
    let (assistant, _model, _dir) = common::create_test_assistant(
        vec![
            Scripted::text(""),
            Scripted::text("Hello there"),
            Scripted::text(""),
            Scripted::text("Your landlord is Alice"),
        ],
        AssistantConfig::default(),
    );
    let mut conversation = assistant.new_conversation().unwrap();
    assert_eq!(conversation.history().len(), 1);

    assert_eq!(conversation.send_message("hi").await, "Hello there");
    assert_eq!(conversation.send_message("who is my landlord?").await, "Your landlord is Alice");
    assert_eq!(conversation.history().len(), 1 + 2 * 2);

    let messages = conversation.messages();
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[1].content, "hi");
    assert_eq!(messages[2].content, "Hello there");
    assert_eq!(messages[4].role, Role::Assistant);
}

#[tokio::test]
async fn routing_sends_system_and_utterance_with_tools() {
    let (assistant, model, _dir) =
        common::create_test_assistant(vec![Scripted::text(""), Scripted::text("fine")], AssistantConfig::default());
    let mut conversation = assistant.new_conversation().unwrap();
    conversation.send_message("how are you?").await;

    let calls = model.calls();
    assert_eq!(calls.len(), 2);

    let routing = &calls[0];
    assert_eq!(routing.tool_names, vec!["create_issue".to_string()]);
    assert_eq!(routing.messages.len(), 2);
    assert_eq!(routing.messages[0].role, Role::System);
    assert_eq!(routing.messages[1].content, "how are you?");

    let reply = &calls[1];
    assert!(reply.tool_names.is_empty());
    let user_entries = reply.messages.iter().filter(|m| m.role == Role::User).count();
    assert_eq!(user_entries, 1, "the utterance is replayed once");
}

#[tokio::test]
async fn unknown_tool_is_ignored() {
    let (assistant, model, _dir) = common::create_test_assistant(
        vec![Scripted::tool("delete_everything", json!({})), Scripted::text("No can do")],
        AssistantConfig::default(),
    );
    let mut conversation = assistant.new_conversation().unwrap();
    assert_eq!(conversation.send_message("wipe it").await, "No can do");
    assert_eq!(conversation.history().len(), 3);
    assert_eq!(model.calls().len(), 2);
    assert_eq!(assistant.directory().stats().unwrap().issues, 0);
}

// ---- Tool turns ----

#[tokio::test]
async fn successful_tool_turn_adds_three_entries() {
    let (assistant, _model, _dir) = common::create_test_assistant(
        vec![Scripted::tool("create_issue", leak_arguments()), Scripted::text("Anything else?")],
        AssistantConfig::default(),
    );
    let mut conversation = assistant.new_conversation().unwrap();
    let reply = conversation.send_message("my kitchen faucet leaks").await;
    assert_eq!(reply, "Anything else?");
    assert_eq!(conversation.history().len(), 1 + 3);

    let messages = conversation.messages();
    assert!(messages[2].content.starts_with("I've created a new maintenance issue:"));
    assert!(messages[2].content.contains("- Location: Kitchen"));

    let issues = assistant.directory().list_issues(&IssueFilter::default(), Page::default()).unwrap();
    assert_eq!(issues.len(), 1);
    assert!(!issues[0].resolved);
    assert!(messages[2].content.ends_with(&format!("- Issue ID: {}", issues[0].id)));
}

#[tokio::test]
async fn tool_turn_refreshes_prompt_before_final_reply() {
    let (assistant, model, _dir) = common::create_test_assistant(
        vec![Scripted::tool("create_issue", leak_arguments()), Scripted::text("Done")],
        AssistantConfig::default(),
    );
    let mut conversation = assistant.new_conversation().unwrap();
    assert!(!conversation.history().system_prompt().contains("Leaking faucet"));

    conversation.send_message("faucet leaks").await;

    let calls = model.calls();
    assert!(calls[1].messages[0].content.contains("- Issue 1: Leaking faucet at Kitchen"));
    assert!(conversation.history().system_prompt().contains("Resolved: false"));
}

#[tokio::test]
async fn tool_with_missing_property_reports_failure_without_insert() {
    let mut arguments = leak_arguments();
    arguments["property_id"] = json!(9999);
    let (assistant, _model, _dir) = common::create_test_assistant(
        vec![Scripted::tool("create_issue", arguments), Scripted::text("Sorry about that")],
        AssistantConfig::default(),
    );
    let mut conversation = assistant.new_conversation().unwrap();
    conversation.send_message("file it for property 9999").await;

    let messages = conversation.messages();
    assert_eq!(messages[2].content, "I couldn't create the issue: Property with ID 9999 not found");
    assert_eq!(assistant.directory().stats().unwrap().issues, 0);
}

#[tokio::test]
async fn tool_accepts_numeric_string_property() {
    let (directory, _dir) = common::create_test_directory();
    let (_, property) = common::seed_landlord_with_property(&directory);

    let mut arguments = leak_arguments();
    arguments["property_id"] = json!(property.id.to_string());
    let model = common::ScriptedModel::new(vec![
        Scripted::tool("create_issue", arguments),
        Scripted::text("Filed"),
    ]);
    let assistant = AssistantService::new(model, directory.clone(), AssistantConfig::default());

    let mut conversation = assistant.new_conversation().unwrap();
    conversation.send_message("leak in my unit").await;
    assert_eq!(directory.property_issues(property.id).unwrap().len(), 1);
}

#[tokio::test]
async fn confirmation_can_lead_the_reply_instead() {
    let settings = AssistantConfig { record_tool_confirmation: false, ..AssistantConfig::default() };
    let (assistant, _model, _dir) = common::create_test_assistant(
        vec![Scripted::tool("create_issue", leak_arguments()), Scripted::text("Anything else?")],
        settings,
    );
    let mut conversation = assistant.new_conversation().unwrap();
    let reply = conversation.send_message("faucet leaks").await;
    assert!(reply.starts_with("I've created a new maintenance issue:"));
    assert!(reply.ends_with("\n\nAnything else?"));
    assert_eq!(conversation.history().len(), 3);
}

// ---- Prompt freshness ----

#[tokio::test]
async fn outside_writes_refresh_prompt_before_next_turn() {
    let (assistant, model, _dir) = common::create_test_assistant(vec![], AssistantConfig::default());
    let mut conversation = assistant.new_conversation().unwrap();
    assert!(conversation.history().system_prompt().contains("ISSUES:\n\n\nCONTRACTORS:"));

    assistant
        .directory()
        .create_issue(&NewIssue {
            description: "Broken heater".into(),
            location: "Bedroom".into(),
            action: "Call HVAC".into(),
            property_id: None,
        })
        .unwrap();

    conversation.send_message("any open issues?").await;
    let routing = &model.calls()[0];
    assert!(routing.messages[0].content.contains("- Issue 1: Broken heater at Bedroom"));
}

#[tokio::test]
async fn updated_row_replaces_stale_values_in_prompt() {
    let (assistant, model, _dir) = common::create_test_assistant(vec![], AssistantConfig::default());
    let issue = assistant
        .directory()
        .create_issue(&NewIssue {
            description: "Broken heater".into(),
            location: "Bedroom".into(),
            action: "Call HVAC".into(),
            property_id: None,
        })
        .unwrap();
    let mut conversation = assistant.new_conversation().unwrap();
    assert!(conversation.history().system_prompt().contains("Resolved: false"));

    assistant
        .directory()
        .update_issue(issue.id, &IssueUpdate { resolved: Some(true), ..IssueUpdate::default() })
        .unwrap()
        .unwrap();

    conversation.send_message("is the heater fixed?").await;
    let routing_prompt = &model.calls()[0].messages[0].content;
    assert!(routing_prompt.contains("- Issue 1: Broken heater at Bedroom, Action: Call HVAC, Resolved: true"));
    assert!(!routing_prompt.contains("Resolved: false"));

    let prompt = conversation.history().system_prompt();
    assert!(prompt.contains("Resolved: true"));
    assert!(!prompt.contains("Resolved: false"));
}

#[tokio::test]
async fn refresh_if_stale_skips_when_current() {
    let (assistant, _model, _dir) = common::create_test_assistant(vec![], AssistantConfig::default());
    let mut conversation = assistant.new_conversation().unwrap();
    assert!(!conversation.refresh_if_stale().unwrap());
    common::seed_landlord_with_property(assistant.directory());
    assert!(conversation.refresh_if_stale().unwrap());
    assert!(conversation.history().system_prompt().contains("- Property 1: 1 Test Road"));
}

// ---- Failures ----

#[tokio::test]
async fn model_failure_is_recorded_as_error_reply() {
    let (assistant, _model, _dir) = common::create_test_assistant(
        vec![Scripted::Fail("model 'llama3.1' not found".into())],
        AssistantConfig::default(),
    );
    let mut conversation = assistant.new_conversation().unwrap();
    let reply = conversation.send_message("hello?").await;
    assert!(reply.starts_with("Error: "));
    assert!(reply.contains("not found"));
    assert_eq!(conversation.history().len(), 3);
    assert_eq!(conversation.history().last().unwrap().content, reply);
}

#[tokio::test]
async fn failure_on_final_reply_after_tool_keeps_issue() {
    let (assistant, _model, _dir) = common::create_test_assistant(
        vec![Scripted::tool("create_issue", leak_arguments()), Scripted::Fail("boom".into())],
        AssistantConfig::default(),
    );
    let mut conversation = assistant.new_conversation().unwrap();
    let reply = conversation.send_message("faucet leaks").await;
    assert!(reply.starts_with("Error: "));
    assert_eq!(conversation.history().len(), 4);
    assert_eq!(assistant.directory().stats().unwrap().issues, 1);
}

// ---- History bounds ----

#[tokio::test]
async fn context_window_limits_replay() {
    let settings = AssistantConfig { history_capacity: 6, context_window_messages: 2, ..AssistantConfig::default() };
    let (assistant, model, _dir) = common::create_test_assistant(vec![], settings);
    let mut conversation = assistant.new_conversation().unwrap();
    for i in 0..5 {
        conversation.send_message(&format!("turn {i}")).await;
    }
    assert_eq!(conversation.history().len(), 1 + 6);
    assert_eq!(conversation.history().evicted(), 4);

    let last_reply_call = model.calls().into_iter().last().unwrap();
    assert_eq!(last_reply_call.messages.len(), 1 + 2);
    assert_eq!(last_reply_call.messages[2].content, "turn 4");
}

// ---- Streaming ----

#[tokio::test]
async fn stream_yields_fragments_and_records_reply() {
    let (assistant, model, _dir) = common::create_test_assistant(
        vec![Scripted::text(""), Scripted::text("Your rent is due Friday")],
        AssistantConfig::default(),
    );
    let mut conversation = assistant.new_conversation().unwrap();
    let fragments: Vec<String> = conversation.stream_message("when is rent due?").collect().await;
    assert_eq!(fragments, vec!["Your ", "rent ", "is ", "due ", "Friday"]);
    assert_eq!(conversation.history().len(), 3);
    assert_eq!(conversation.history().last().unwrap().content, "Your rent is due Friday");
    assert!(model.calls()[1].streamed);
}

#[tokio::test]
async fn stream_failure_yields_error() {
    let (assistant, _model, _dir) = common::create_test_assistant(
        vec![Scripted::text(""), Scripted::Fail("connection reset".into())],
        AssistantConfig::default(),
    );
    let mut conversation = assistant.new_conversation().unwrap();
    let fragments: Vec<String> = conversation.stream_message("hi").collect().await;
    assert_eq!(fragments.len(), 1);
    assert!(fragments[0].starts_with("Error: "));
    assert_eq!(conversation.history().len(), 3);
}

#[tokio::test]
async fn dropped_stream_still_pairs_user_entry() {
    let (assistant, _model, _dir) = common::create_test_assistant(
        vec![
            Scripted::text(""),
            Scripted::text("Your rent is due Friday"),
            Scripted::text(""),
            Scripted::text("Anything else?"),
        ],
        AssistantConfig::default(),
    );
    let mut conversation = assistant.new_conversation().unwrap();
    {
        let mut fragments = Box::pin(conversation.stream_message("when is rent due?"));
        assert_eq!(fragments.next().await.as_deref(), Some("Your "));
    }

    assert_eq!(conversation.history().len(), 3);
    let last = conversation.history().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, INTERRUPTED_REPLY);

    assert_eq!(conversation.send_message("thanks").await, "Anything else?");
    let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn stream_dropped_before_first_fragment_is_recorded() {
    let (assistant, _model, _dir) = common::create_test_assistant(vec![], AssistantConfig::default());
    let mut conversation = assistant.new_conversation().unwrap();
    let fragments = conversation.stream_message("hello");
    drop(fragments);
    // Never polled: nothing ran, so nothing is recorded.
    assert_eq!(conversation.history().len(), 1);
}

// ---- Service ----

#[tokio::test]
async fn assistant_service_lifecycle_and_isolation() {
    let (mut assistant, _model, _dir) = common::create_test_assistant(vec![], AssistantConfig::default());
    assistant.init().unwrap();
    assert_eq!(assistant.state(), ServiceState::Running);

    let mut first = assistant.new_conversation().unwrap();
    let second = assistant.new_conversation().unwrap();
    assert_ne!(first.id(), second.id());

    first.send_message("hello").await;
    assert_eq!(first.history().len(), 3);
    assert_eq!(second.history().len(), 1);

    assistant.shutdown().unwrap();
    assert!(!assistant.is_healthy());
}
