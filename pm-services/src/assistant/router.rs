//! Decides per turn whether the utterance goes to a tool or straight to a reply.

use tracing::{debug, info, warn};

use pm_core::error::PmResult;
use pm_llm::{ChatMessage, ChatModel, ToolCall, ToolSpec};

use super::tools;

/// Outcome of routing one utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// The model proposed a call to a registered tool.
    ToolCall(ToolCall),
    /// Answer with a plain completion.
    Direct,
}

/// Offers the registered tools to the model and keeps only the first
/// proposed call.
#[derive(Debug, Clone)]
pub struct ToolRouter {
    tools: Vec<ToolSpec>,
}

impl Default for ToolRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRouter {
    pub fn new() -> Self {
        Self {
            tools: vec![tools::create_issue_spec()],
        }
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    fn is_registered(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Send `[system, user]` to a tool-aware invocation and classify the reply.
    pub async fn route(
        &self,
        model: &dyn ChatModel,
        system_prompt: &str,
        utterance: &str,
    ) -> PmResult<Route> {
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(utterance)];
        let reply = model.chat(&messages, &self.tools).await?;

        let Some(call) = reply.tool_calls.into_iter().next() else {
            debug!("no tool proposed, replying directly");
            return Ok(Route::Direct);
        };

        if !self.is_registered(&call.name) {
            warn!(tool = %call.name, "model proposed an unknown tool; ignoring");
            return Ok(Route::Direct);
        }

        info!(tool = %call.name, "turn routed to tool");
        Ok(Route::ToolCall(call))
    }
}
