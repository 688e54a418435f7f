//! Conversation log
//!
//! Append-only record of the exchanged messages. The whole log is resent as
//! history on every turn, so the payload grows linearly with the length of
//! the conversation; there is no truncation or incremental diffing.

// Re-export types from the shared types module
pub use crate::types::{HistoryEntry, Message, Role};

/// Ordered, append-only message log
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    /// Create a new empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log seeded with an assistant greeting
    ///
    /// An empty or whitespace-only greeting seeds nothing.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut log = Self::new();
        if !greeting.trim().is_empty() {
            log.append(Message::assistant(greeting));
        }
        log
    }

    /// Append a message at the end
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Full ordered history payload for the next remote call
    pub fn to_history(&self) -> Vec<HistoryEntry> {
        self.messages.iter().map(Message::to_history_entry).collect()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}
