//! WebSocket message DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::{self, BrokerError, PayloadEncoder};

/// Outbound frame kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    /// Live message relayed by the dispatcher
    Chat,
    /// Message replayed from the store when joining
    History,
    /// Error notice addressed to one connection only
    Error,
}

/// Chat message frame sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub r#type: MessageType,
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    pub content: String,
    /// Unix milliseconds (UTC)
    pub timestamp: i64,
}

impl ChatMessage {
    /// Same message, re-tagged as replayed history
    pub fn history(mut self) -> Self {
        self.r#type = MessageType::History;
        self
    }
}

/// Frame received from clients
///
/// Only `content` is read. Any other field, including a client supplied
/// `sender_id`, is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    PersistFailed,
    InvalidContent,
}

/// Error frame sent to a single connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorMessage {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::Error,
            code,
            message: message.into(),
        }
    }
}

/// 保存済みメッセージを `chat` フレームの JSON にする
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatFrameEncoder;

impl PayloadEncoder for ChatFrameEncoder {
    fn encode(&self, message: &domain::ChatMessage) -> Result<String, BrokerError> {
        serde_json::to_string(&ChatMessage::from(message.clone()))
            .map_err(|e| BrokerError::EncodeFailed(e.to_string()))
    }
}
