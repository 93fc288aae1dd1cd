//! API request and response types

use crate::db::{Message, Sender};
use crate::error::ChatError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to open a session
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub player: Option<String>,
}

/// Query for the message history
#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Request to send a player message
#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_token: String,
    pub player: String,
    pub expires_at: DateTime<Utc>,
}

/// One message as exchanged in a round trip
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub sender: Sender,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageBody {
    fn from(message: Message) -> Self {
        Self {
            sender: message.sender,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

/// One entry of the history listing
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(flatten)]
    pub message: MessageBody,
}

impl From<Message> for HistoryEntry {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            message: message.into(),
        }
    }
}

/// Response with the message history
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<HistoryEntry>,
    pub is_active: bool,
}

/// Response for a completed round trip
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub player_message: MessageBody,
    #[serde(rename = "valezap_message")]
    pub backend_message: MessageBody,
    pub ended: bool,
}

/// Response for an accepted backend push
#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub status: &'static str,
    pub ended: bool,
}

/// Health probe response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

impl From<ChatError> for ErrorResponse {
    fn from(err: ChatError) -> Self {
        Self {
            error: err.kind.as_str(),
            message: err.message,
        }
    }
}
