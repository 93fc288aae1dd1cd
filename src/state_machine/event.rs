//! Events that can occur in a session

/// Messages arriving at a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Validated text sent by the owning player
    PlayerMessage { text: String },
    /// Reply or push from the backend, already trimmed
    BackendMessage { text: String },
}
