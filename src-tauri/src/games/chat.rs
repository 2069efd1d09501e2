//! Chat tutor conversation
//!
//! The transcript is append-only. Sending a message pays a participation
//! reward straight away; the tutor's reply is appended when it arrives, or
//! dropped if the request fails.

use super::{SessionError, CHAT_MESSAGE_XP};
use crate::content::prompts::chat_greeting;
use crate::content::{ChatTurn, ContentResult};
use crate::profile::Language;
use serde::Serialize;

const FALLBACK_REPLY: &str = "I'm listening!";

#[derive(Debug, Clone)]
pub struct ChatSession {
    language: Language,
    topic: String,
    turns: Vec<ChatTurn>,
    awaiting_reply: bool,
}

/// Everything needed to ask the tutor for a reply
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub language: Language,
    pub topic: String,
    /// Transcript before the new message
    pub history: Vec<ChatTurn>,
    pub message: String,
    pub xp_awarded: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub turns: Vec<ChatTurn>,
    pub awaiting_reply: bool,
}

impl ChatSession {
    pub fn new(language: Language, topic: &str) -> Self {
        Self {
            language,
            topic: topic.to_string(),
            turns: vec![ChatTurn::model(&chat_greeting(language, topic))],
            awaiting_reply: false,
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// Record the user's message and hand back the request to send
    pub fn begin_turn(&mut self, text: &str) -> Result<PendingTurn, SessionError> {
        let message = text.trim();
        if message.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.awaiting_reply {
            return Err(SessionError::AwaitingReply);
        }

        let pending = PendingTurn {
            language: self.language,
            topic: self.topic.clone(),
            history: self.turns.clone(),
            message: message.to_string(),
            xp_awarded: CHAT_MESSAGE_XP,
        };
        self.turns.push(ChatTurn::user(message));
        self.awaiting_reply = true;
        Ok(pending)
    }

    /// Append the tutor's reply. A failed request leaves the transcript as is.
    pub fn complete_turn(&mut self, reply: ContentResult<String>) -> Option<&ChatTurn> {
        self.awaiting_reply = false;
        match reply {
            Ok(text) => {
                let text = if text.trim().is_empty() {
                    FALLBACK_REPLY
                } else {
                    text.trim()
                };
                self.turns.push(ChatTurn::model(text));
                self.turns.last()
            }
            Err(e) => {
                log::warn!("Chat reply failed, dropping turn: {}", e);
                None
            }
        }
    }

    pub fn view(&self) -> ChatView {
        ChatView {
            turns: self.turns.clone(),
            awaiting_reply: self.awaiting_reply,
        }
    }
}
