//! The conversation loop and the service that hands out conversations.

use std::sync::Arc;

use async_stream::stream;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use pm_core::config::AssistantConfig;
use pm_core::error::{PmError, PmResult};
use pm_llm::{ChatMessage, ChatModel};

use super::history::SessionHistory;
use super::router::{Route, ToolRouter};
use super::{prompt, snapshot, tools};
use crate::directory::DirectoryService;
use crate::service::{Service, ServiceState};

/// Recorded when a streamed turn is abandoned before its reply completes.
pub const INTERRUPTED_REPLY: &str = "Error: reply interrupted";

/// One chat session: a transcript plus the prompt it was built from.
///
/// Turns are processed one at a time (`&mut self`); callers sharing a
/// conversation across tasks wrap it in a mutex.
pub struct Conversation {
    id: Uuid,
    started_at: DateTime<Utc>,
    model: Arc<dyn ChatModel>,
    directory: DirectoryService,
    router: ToolRouter,
    settings: AssistantConfig,
    history: SessionHistory,
    /// Store generation the current system prompt reflects.
    prompt_generation: u64,
}

impl Conversation {
    /// Start a conversation seeded with a freshly built system prompt.
    pub fn start(
        model: Arc<dyn ChatModel>,
        directory: DirectoryService,
        settings: AssistantConfig,
    ) -> PmResult<Self> {
        let history = SessionHistory::new(String::new(), settings.history_capacity);
        let mut conversation = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            model,
            directory,
            router: ToolRouter::new(),
            settings,
            history,
            prompt_generation: 0,
        };
        conversation.refresh_prompt()?;
        info!(session = %conversation.id, model = conversation.model.model_name(), "conversation started");
        Ok(conversation)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Full stored transcript, system message first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.history.messages()
    }

    /// Rebuild the snapshot and system prompt from the store.
    ///
    /// The generation is read before the dataset, so a write racing with
    /// the read leaves the prompt marked stale rather than fresh.
    pub fn refresh_prompt(&mut self) -> PmResult<()> {
        let generation = self.directory.generation();
        let dataset = self.directory.dataset()?;
        let text = snapshot::render(&dataset);
        self.history
            .replace_system(prompt::assemble(&self.settings.persona, &text));
        self.prompt_generation = generation;
        debug!(session = %self.id, generation, "system prompt refreshed");
        Ok(())
    }

    /// Refresh only when a write has been committed since the last build.
    pub fn refresh_if_stale(&mut self) -> PmResult<bool> {
        if self.directory.generation() == self.prompt_generation {
            return Ok(false);
        }
        self.refresh_prompt()?;
        Ok(true)
    }

    /// Route the utterance and run the tool when one was chosen.
    ///
    /// Returns the confirmation text when it should lead the final reply
    /// instead of being recorded as its own entry.
    async fn prepare_turn(&mut self, utterance: &str) -> PmResult<Option<String>> {
        self.refresh_if_stale()?;

        let route = self
            .router
            .route(self.model.as_ref(), self.history.system_prompt(), utterance)
            .await?;

        let Route::ToolCall(call) = route else {
            return Ok(None);
        };

        let outcome = tools::execute_create_issue(&self.directory, &call.arguments);
        info!(session = %self.id, created = outcome.is_created(), "tool call handled");
        let confirmation = outcome.confirmation();

        let prefix = if self.settings.record_tool_confirmation {
            self.history.push_assistant(confirmation);
            None
        } else {
            Some(confirmation)
        };

        self.refresh_prompt()?;
        Ok(prefix)
    }

    /// Record and return the placeholder for a failed turn.
    fn fail(&mut self, e: PmError) -> String {
        error!(session = %self.id, "turn failed: {e}");
        let message = format!("Error: {e}");
        self.history.push_assistant(message.clone());
        message
    }

    fn context(&self) -> Vec<ChatMessage> {
        self.history.context(self.settings.context_window_messages)
    }

    /// Process one user utterance and return the reply.
    ///
    /// Never fails: model and store errors come back as `Error: {reason}`
    /// and are recorded in the transcript like any other reply.
    pub async fn send_message(&mut self, text: &str) -> String {
        self.history.push_user(text);

        let prefix = match self.prepare_turn(text).await {
            Ok(prefix) => prefix,
            Err(e) => return self.fail(e),
        };

        let context = self.context();
        match self.model.chat(&context, &[]).await {
            Ok(reply) => {
                let content = match prefix {
                    Some(confirmation) => format!("{confirmation}\n\n{}", reply.content),
                    None => reply.content,
                };
                self.history.push_assistant(content.clone());
                content
            }
            Err(e) => self.fail(e),
        }
    }

    /// Streamed variant of [`send_message`](Self::send_message).
    ///
    /// Fragments are yielded as they arrive; the concatenated reply is
    /// recorded once the stream ends. A failure yields and records
    /// `Error: {reason}` in place of the partial reply. Dropping the stream
    /// before it ends records `Error: reply interrupted`.
    pub fn stream_message<'a>(&'a mut self, text: &'a str) -> impl Stream<Item = String> + Send + 'a {
        stream! {
            self.history.push_user(text);
            let mut turn = StreamedTurn::new(self);

            let prefix = match turn.conversation.prepare_turn(text).await {
                Ok(prefix) => prefix,
                Err(e) => {
                    yield turn.fail(e);
                    return;
                }
            };

            let mut reply = String::new();
            if let Some(confirmation) = prefix {
                let head = format!("{confirmation}\n\n");
                reply.push_str(&head);
                yield head;
            }

            let context = turn.conversation.context();
            let mut fragments = match turn.conversation.model.chat_stream(&context).await {
                Ok(fragments) => fragments,
                Err(e) => {
                    yield turn.fail(e);
                    return;
                }
            };

            while let Some(fragment) = fragments.next().await {
                match fragment {
                    Ok(fragment) => {
                        reply.push_str(&fragment);
                        yield fragment;
                    }
                    Err(e) => {
                        yield turn.fail(e);
                        return;
                    }
                }
            }

            turn.finish(reply);
        }
    }
}

/// A streamed turn whose user entry is already recorded.
///
/// Pairs it with exactly one assistant entry however the stream ends,
/// including when the consumer drops it midway.
struct StreamedTurn<'a> {
    conversation: &'a mut Conversation,
    recorded: bool,
}

impl<'a> StreamedTurn<'a> {
    fn new(conversation: &'a mut Conversation) -> Self {
        Self { conversation, recorded: false }
    }

    fn finish(&mut self, reply: String) {
        debug!(session = %self.conversation.id, chars = reply.len(), "streamed reply complete");
        self.conversation.history.push_assistant(reply);
        self.recorded = true;
    }

    fn fail(&mut self, e: PmError) -> String {
        self.recorded = true;
        self.conversation.fail(e)
    }
}

impl Drop for StreamedTurn<'_> {
    fn drop(&mut self) {
        if !self.recorded {
            warn!(session = %self.conversation.id, "streamed reply dropped before completion");
            self.conversation.history.push_assistant(INTERRUPTED_REPLY);
        }
    }
}

/// Hands out conversations bound to one chat model and one directory.
#[derive(Clone)]
pub struct AssistantService {
    state: ServiceState,
    model: Arc<dyn ChatModel>,
    directory: DirectoryService,
    settings: AssistantConfig,
}

impl AssistantService {
    pub fn new(model: Arc<dyn ChatModel>, directory: DirectoryService, settings: AssistantConfig) -> Self {
        Self {
            state: ServiceState::Created,
            model,
            directory,
            settings,
        }
    }

    pub fn model(&self) -> &Arc<dyn ChatModel> {
        &self.model
    }

    pub fn directory(&self) -> &DirectoryService {
        &self.directory
    }

    pub fn settings(&self) -> &AssistantConfig {
        &self.settings
    }

    /// Start a fresh conversation with its own history.
    pub fn new_conversation(&self) -> PmResult<Conversation> {
        Conversation::start(self.model.clone(), self.directory.clone(), self.settings.clone())
    }
}

impl Service for AssistantService {
    fn name(&self) -> &str {
        "assistant"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> PmResult<()> {
        if self.settings.context_window_messages == 0 {
            self.state = ServiceState::Failed;
            return Err(PmError::Config("assistant.context_window_messages must be at least 1".into()));
        }
        self.state = ServiceState::Running;
        info!(model = self.model.model_name(), "assistant service initialized");
        Ok(())
    }

    fn shutdown(&mut self) -> PmResult<()> {
        self.state = ServiceState::Stopped;
        info!("assistant service shut down");
        Ok(())
    }
}
