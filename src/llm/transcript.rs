use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::llm::client::ChatBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// An ordered chat history. Extending it yields a new transcript; a sent
/// transcript comes back with the reply appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self::new().with(Role::System, prompt)
    }

    pub fn with(mut self, role: Role, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
        });
        self
    }

    pub fn user(self, content: impl Into<String>) -> Self {
        self.with(Role::User, content)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Content of the most recent assistant message.
    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// One round trip: the returned transcript ends with the backend's reply.
    pub fn send(self, backend: &dyn ChatBackend) -> Result<Transcript, PipelineError> {
        let reply = backend.complete(&self)?;
        Ok(self.with(Role::Assistant, reply))
    }
}
