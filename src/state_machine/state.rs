//! Session state types

use serde::{Deserialize, Serialize};

/// Lifecycle of a chat session: `Active` until the backend sends the
/// terminator phrase, then `Ended` for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Active,
    Ended,
}

impl SessionState {
    #[allow(dead_code)] // Used in tests
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Active)
    }
}
