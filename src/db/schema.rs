//! Database schema and types

pub use crate::state_machine::state::SessionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS chat_sessions (
    session_token TEXT PRIMARY KEY NOT NULL,
    player_id TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    ended_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_chat_sessions_player ON chat_sessions(player_id);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_token TEXT NOT NULL,
    sender TEXT NOT NULL CHECK (sender IN ('player', 'backend')),
    content TEXT NOT NULL CHECK (length(content) > 0),
    created_at TEXT NOT NULL,

    FOREIGN KEY (session_token)
        REFERENCES chat_sessions(session_token) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_token, created_at, id);
";

/// Conversation session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub player_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Lifecycle state derived from the persisted columns
    pub fn state(&self) -> SessionState {
        if self.is_active {
            SessionState::Active
        } else {
            SessionState::Ended
        }
    }

    pub fn is_owned_by(&self, player_id: &str) -> bool {
        self.player_id == player_id
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Player,
    Backend,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::Player => "player",
            Sender::Backend => "backend",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "player" => Some(Sender::Player),
            "backend" => Some(Sender::Backend),
            _ => None,
        }
    }
}

/// Message record (append-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub session_token: String,
    pub sender: Sender,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
