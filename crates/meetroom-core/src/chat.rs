use chrono::{DateTime, Utc};

use crate::errors::MeetError;
use crate::session::{Command, CommandLink};
use crate::signaling::ChatPayload;

/// Sender id and name used for locally synthesized messages.
pub const SYSTEM_SENDER: &str = "System";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_peer_id: Option<String>,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
}

impl ChatMessage {
    pub fn system(body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id: SYSTEM_SENDER.to_string(),
            sender_name: SYSTEM_SENDER.to_string(),
            sender_peer_id: None,
            body: body.into(),
            timestamp: Utc::now(),
            kind: MessageKind::System,
        }
    }

    /// Builds a message from a relayed payload; a missing timestamp is
    /// stamped with the local arrival time. Relayed messages are always
    /// `User`: system messages only come from [`ChatMessage::system`].
    pub fn from_payload(payload: ChatPayload) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id: payload.sender_id,
            sender_name: payload.sender_name,
            sender_peer_id: payload.sender_peer_id,
            body: payload.message,
            timestamp: payload.timestamp.unwrap_or_else(Utc::now),
            kind: MessageKind::User,
        }
    }
}

/// Append-only record of chat messages in local arrival order.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
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
}

/// Chat facade bound to a running session.
///
/// Sent messages are not echoed locally; they show up in the log when
/// the relay delivers them back.
#[derive(Clone)]
pub struct ChatService {
    link: CommandLink,
}

impl ChatService {
    pub(crate) fn new(link: CommandLink) -> Self {
        Self { link }
    }

    /// Send a chat message to the room. Blank bodies are ignored.
    pub async fn send_message(&self, text: &str) -> Result<(), MeetError> {
        let body = text.to_string();
        self.link.request(|reply| Command::SendChat { body, reply }).await?
    }

    /// Get all messages in the current session.
    pub async fn messages(&self) -> Result<Vec<ChatMessage>, MeetError> {
        Ok(self.link.snapshot().await?.messages)
    }
}
