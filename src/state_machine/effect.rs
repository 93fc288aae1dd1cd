//! Effects produced by state transitions

use crate::db::Sender;

/// Effects to be applied, in order, inside one store scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the session log
    PersistMessage { sender: Sender, content: String },

    /// Mark the session ended at the timestamp of the message persisted
    /// just before it
    CloseSession,
}

impl Effect {
    pub fn persist_player_message(content: impl Into<String>) -> Self {
        Effect::PersistMessage {
            sender: Sender::Player,
            content: content.into(),
        }
    }

    pub fn persist_backend_message(content: impl Into<String>) -> Self {
        Effect::PersistMessage {
            sender: Sender::Backend,
            content: content.into(),
        }
    }
}
