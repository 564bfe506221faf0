//! The chat-model seam.
//!
//! The assistant only ever talks to `dyn ChatModel`, so tests can swap the
//! HTTP client for a scripted fake.

use async_trait::async_trait;
use futures::stream::BoxStream;

use pm_core::error::PmResult;

use crate::types::{ChatMessage, ChatReply, ToolSpec};

/// Lazily produced, finite, non-restartable sequence of text fragments.
pub type FragmentStream = BoxStream<'static, PmResult<String>>;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier used in logs.
    fn model_name(&self) -> &str;

    /// One completion. With a non-empty `tools` slice the model may answer
    /// with proposed tool calls instead of (or alongside) text.
    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> PmResult<ChatReply>;

    /// Streamed completion without tools.
    async fn chat_stream(&self, messages: &[ChatMessage]) -> PmResult<FragmentStream>;
}
