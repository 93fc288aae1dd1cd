//! Pure state transition function

use super::{Effect, Event, SessionState};
use crate::identity::is_conversation_terminator;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
    /// The message was the end-of-conversation phrase
    pub terminator: bool,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
            terminator: false,
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn terminated(mut self) -> Self {
        self.terminator = true;
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Session has ended")]
    SessionEnded,
}

/// Pure transition function
///
/// Player messages are only accepted while the session is active. Backend
/// messages are always recorded; the terminator phrase ends an active
/// session and is a no-op for one that already ended.
pub fn transition(state: SessionState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        (SessionState::Active, Event::PlayerMessage { text }) => {
            Ok(TransitionResult::new(SessionState::Active)
                .with_effect(Effect::persist_player_message(text)))
        }

        (SessionState::Ended, Event::PlayerMessage { .. }) => Err(TransitionError::SessionEnded),

        (SessionState::Active, Event::BackendMessage { text }) => {
            if is_conversation_terminator(&text) {
                Ok(TransitionResult::new(SessionState::Ended)
                    .with_effect(Effect::persist_backend_message(text))
                    .with_effect(Effect::CloseSession)
                    .terminated())
            } else {
                Ok(TransitionResult::new(SessionState::Active)
                    .with_effect(Effect::persist_backend_message(text)))
            }
        }

        (SessionState::Ended, Event::BackendMessage { text }) => {
            let terminator = is_conversation_terminator(&text);
            let result = TransitionResult::new(SessionState::Ended)
                .with_effect(Effect::persist_backend_message(text));
            Ok(if terminator { result.terminated() } else { result })
        }
    }
}
