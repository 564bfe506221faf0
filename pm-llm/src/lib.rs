//! Property Manager LLM - chat client for a local Ollama server.
//!
//! Provides the role-tagged message types, the tool schema sent to the model,
//! the `ChatModel` trait the assistant depends on, and `OllamaClient`, its
//! HTTP implementation over `/api/chat` (single reply or NDJSON stream).

pub mod client;
pub mod chat;
pub mod model;
pub mod types;

// Re-export key types
pub use client::OllamaClient;
pub use model::{ChatModel, FragmentStream};
pub use types::{ChatMessage, ChatReply, Role, ToolCall, ToolSpec};
