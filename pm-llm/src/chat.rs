//! `/api/chat` requests: single replies, tool calls and NDJSON streaming.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use pm_core::error::{PmError, PmResult};

use crate::client::OllamaClient;
use crate::model::{ChatModel, FragmentStream};
use crate::types::{ChatMessage, ChatReply, ToolCall, ToolSpec};

/// Body of a non-streamed reply, and of each streamed line.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<WireMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl From<WireMessage> for ChatReply {
    fn from(message: WireMessage) -> Self {
        Self {
            content: message.content,
            tool_calls: message
                .tool_calls
                .into_iter()
                .map(|call| ToolCall::new(call.function.name, call.function.arguments))
                .collect(),
        }
    }
}

/// Parse one NDJSON line. Blank lines yield `None`.
fn parse_line(line: &[u8]) -> PmResult<Option<ChatChunk>> {
    let text = std::str::from_utf8(line)
        .map_err(|e| PmError::MalformedResponse(format!("stream line is not UTF-8: {e}")))?
        .trim();
    if text.is_empty() {
        return Ok(None);
    }
    let chunk: ChatChunk = serde_json::from_str(text)
        .map_err(|e| PmError::MalformedResponse(format!("bad stream line {text:?}: {e}")))?;
    if let Some(error) = chunk.error {
        return Err(PmError::Llm { status: 200, message: error });
    }
    Ok(Some(chunk))
}

impl OllamaClient {
    fn request_body(&self, messages: &[ChatMessage], tools: &[ToolSpec], stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
            "options": {
                "temperature": self.temperature,
            },
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(ToolSpec::to_wire).collect());
        }
        body
    }

    /// One chat completion, optionally offering tools.
    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> PmResult<ChatReply> {
        debug!(model = %self.model, messages = messages.len(), tools = tools.len(), "chat request");
        let body = self.request_body(messages, tools, false);
        let response = self.post("/api/chat", &body).await?;

        let chunk: ChatChunk = response
            .json()
            .await
            .map_err(|e| PmError::MalformedResponse(format!("failed to parse chat reply: {e}")))?;
        if let Some(error) = chunk.error {
            return Err(PmError::Llm { status: 200, message: error });
        }
        let message = chunk
            .message
            .ok_or_else(|| PmError::MalformedResponse("chat reply has no message".into()))?;

        let reply = ChatReply::from(message);
        info!(
            model = %self.model,
            chars = reply.content.len(),
            tool_calls = reply.tool_calls.len(),
            "chat reply received"
        );
        Ok(reply)
    }

    /// Streamed chat completion. Fragments are yielded as they arrive; the
    /// stream ends at the first `done` line or when the body closes.
    pub async fn chat_completion_stream(&self, messages: &[ChatMessage]) -> PmResult<FragmentStream> {
        debug!(model = %self.model, messages = messages.len(), "streaming chat request");
        let body = self.request_body(messages, &[], true);
        let mut response = self.post("/api/chat", &body).await?;

        let stream = try_stream! {
            let mut buffer: Vec<u8> = Vec::new();
            let mut finished = false;

            'read: while let Some(bytes) = response.chunk().await.map_err(OllamaClient::classify_error)? {
                buffer.extend_from_slice(&bytes);
                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    if let Some(chunk) = parse_line(&line)? {
                        if let Some(message) = chunk.message {
                            if !message.content.is_empty() {
                                yield message.content;
                            }
                        }
                        if chunk.done {
                            finished = true;
                            break 'read;
                        }
                    }
                }
            }

            if !finished {
                if let Some(chunk) = parse_line(&buffer)? {
                    if let Some(message) = chunk.message {
                        if !message.content.is_empty() {
                            yield message.content;
                        }
                    }
                }
            }
        };

        Ok(stream.boxed())
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> PmResult<ChatReply> {
        self.chat_completion(messages, tools).await
    }

    async fn chat_stream(&self, messages: &[ChatMessage]) -> PmResult<FragmentStream> {
        self.chat_completion_stream(messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pm_core::config::LlmConfig;

    #[test]
    fn test_parse_line_with_tool_calls() {
        let line = br#"{"message":{"role":"assistant","content":"","tool_calls":[{"function":{"name":"create_issue","arguments":{"description":"Leak"}}}]},"done":true}"#;
        let chunk = parse_line(line).unwrap().unwrap();
        let reply = ChatReply::from(chunk.message.unwrap());
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].arguments["description"], "Leak");
    }

    #[test]
    fn test_parse_line_blank_and_error() {
        assert!(parse_line(b"   \n").unwrap().is_none());
        let err = parse_line(br#"{"error":"model not loaded"}"#).unwrap_err();
        assert!(matches!(err, PmError::Llm { .. }));
        assert!(matches!(parse_line(b"{not json").unwrap_err(), PmError::MalformedResponse(_)));
    }

    #[test]
    fn test_request_body_shape() {
        let client = OllamaClient::new(&LlmConfig::default()).unwrap();
        let tools = vec![ToolSpec {
            name: "create_issue".into(),
            description: "File an issue".into(),
            parameters: json!({"type": "object"}),
        }];
        let body = client.request_body(&[ChatMessage::user("hi")], &tools, false);
        assert_eq!(body["model"], "llama3.1");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["tools"][0]["function"]["name"], "create_issue");

        let plain = client.request_body(&[], &[], true);
        assert!(plain.get("tools").is_none());
        assert_eq!(plain["options"]["temperature"], 0.0);
    }
}
