// In-memory chat log for the page's assistant panel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::constants::CHAT_DISPLAY_LIMIT;
use crate::error::{FoodyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Anything that can answer a conversation with one assistant turn.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn complete(&self, turns: &[ChatTurn]) -> Result<ChatTurn>;
}

/// Process-lifetime conversation. Never persisted.
#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the user turn, sends the whole log, then appends the reply.
    /// A failed call leaves the user turn in place.
    pub async fn send(&mut self, service: &dyn ChatService, user_text: &str) -> Result<&ChatTurn> {
        if user_text.is_empty() {
            return Err(FoodyError::EmptyChatMessage);
        }
        self.turns.push(ChatTurn::user(user_text));
        info!(turns = self.turns.len(), "Forwarding chat log");

        let reply = service.complete(&self.turns).await.map_err(|e| {
            error!("Chat completion failed: {}", e);
            e
        })?;
        // The service speaks for the assistant whatever role it reports.
        self.turns.push(ChatTurn::assistant(reply.content));
        Ok(&self.turns[self.turns.len() - 1])
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// The last [`CHAT_DISPLAY_LIMIT`] turns, oldest first.
    pub fn visible_turns(&self) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(CHAT_DISPLAY_LIMIT);
        &self.turns[start..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
