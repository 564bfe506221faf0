//! Per-conversation transcript.

use std::collections::VecDeque;

use pm_llm::{ChatMessage, Role};

/// Ordered, role-tagged transcript: one system message followed by user and
/// assistant entries.
///
/// Stored entries are capped at `capacity`; the oldest non-system entries are
/// evicted first. The system message is never evicted.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    system: ChatMessage,
    entries: VecDeque<ChatMessage>,
    capacity: usize,
    evicted: u64,
}

impl SessionHistory {
    pub fn new(system_prompt: impl Into<String>, capacity: usize) -> Self {
        Self {
            system: ChatMessage::system(system_prompt),
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            evicted: 0,
        }
    }

    /// Swap in a freshly assembled system instruction.
    pub fn replace_system(&mut self, system_prompt: impl Into<String>) {
        self.system = ChatMessage::system(system_prompt);
    }

    pub fn system_prompt(&self) -> &str {
        &self.system.content
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    fn push(&mut self, message: ChatMessage) {
        debug_assert!(message.role != Role::System);
        self.entries.push_back(message);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
    }

    /// Total messages, system message included.
    pub fn len(&self) -> usize {
        1 + self.entries.len()
    }

    /// Never true: the system message is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Entries dropped to stay within capacity.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Most recent non-system entry.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.entries.back()
    }

    /// The full stored transcript, system message first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        std::iter::once(self.system.clone())
            .chain(self.entries.iter().cloned())
            .collect()
    }

    /// What gets replayed to the model: the system message plus the last
    /// `window` entries.
    pub fn context(&self, window: usize) -> Vec<ChatMessage> {
        let skip = self.entries.len().saturating_sub(window);
        std::iter::once(self.system.clone())
            .chain(self.entries.iter().skip(skip).cloned())
            .collect()
    }
}
