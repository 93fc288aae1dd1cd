//! Runtime for executing conversations
//!
//! [`ConversationService`] owns the store handle and the backend
//! dispatcher. It runs the player round trip (`orchestrator`) and the
//! backend push path (`relay`), applying state machine effects inside
//! store scopes.

mod orchestrator;
mod relay;

#[cfg(test)]
pub mod testing;

pub use relay::BackendPush;

use crate::db::{Database, DbError, Message, Session, StoreTx};
use crate::dispatch::BackendDispatcher;
use crate::error::{ChatError, ChatResult};
use crate::identity::{generate_player_id, normalize_player, MessageLimits, DEFAULT_COUNTRY_CODE};
use crate::state_machine::Effect;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Fresh tokens tried before a creation gives up on collisions
const TOKEN_ATTEMPTS: usize = 3;

/// The conversation core, shared by every request handler
pub struct ConversationService {
    db: Database,
    dispatcher: Arc<dyn BackendDispatcher>,
    limits: MessageLimits,
    relay_secret: Option<String>,
}

impl ConversationService {
    pub fn new(
        db: Database,
        dispatcher: Arc<dyn BackendDispatcher>,
        limits: MessageLimits,
        relay_secret: Option<String>,
    ) -> Self {
        Self {
            db,
            dispatcher,
            limits,
            relay_secret: relay_secret.filter(|s| !s.is_empty()),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Open a new session for `requested_player`, or for a synthetic
    /// player id when none (or nothing usable) was supplied.
    pub fn create_session(&self, requested_player: Option<&str>) -> ChatResult<Session> {
        self.create_session_with(requested_player, || uuid::Uuid::new_v4().simple().to_string())
    }

    fn create_session_with(
        &self,
        requested_player: Option<&str>,
        mut next_token: impl FnMut() -> String,
    ) -> ChatResult<Session> {
        let player = requested_player
            .and_then(normalize_player)
            .unwrap_or_else(|| generate_player_id(DEFAULT_COUNTRY_CODE));

        let mut last_error = None;
        for _ in 0..TOKEN_ATTEMPTS {
            let token = next_token();
            match self.db.create_session(&token, &player) {
                Ok(session) => {
                    tracing::info!(session = %session.token, player = %session.player_id, "Session created");
                    return Ok(session);
                }
                Err(DbError::TokenCollision(token)) => {
                    tracing::warn!(session = %token, "Session token collision, retrying");
                    last_error = Some(DbError::TokenCollision(token));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error.map_or_else(|| ChatError::store("Could not create session"), ChatError::from))
    }

    /// A session together with its ordered message log
    pub fn session_history(&self, token: &str) -> ChatResult<(Session, Vec<Message>)> {
        let token = require_token(token)?;

        let (session, messages) = self.db.scope(Some(token), |tx| -> ChatResult<_> {
            Ok((tx.get_session(token)?, tx.list_messages(token)?))
        })?;

        tracing::debug!(
            session = %token,
            count = messages.len(),
            active = session.is_active,
            "Messages listed"
        );
        Ok((session, messages))
    }
}

fn require_token(token: &str) -> ChatResult<&str> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ChatError::invalid_input("session_token is required"));
    }
    Ok(token)
}

fn require_player(raw: Option<&str>) -> ChatResult<String> {
    raw.and_then(normalize_player)
        .ok_or_else(|| ChatError::invalid_input("Invalid player"))
}

fn authorize(session: &Session, player: &str) -> ChatResult<()> {
    if session.is_owned_by(player) {
        Ok(())
    } else {
        Err(ChatError::forbidden("Player is not authorized for this session"))
    }
}

/// Apply transition effects in order; returns the messages persisted.
///
/// `CloseSession` stamps `ended_at` with the timestamp of the message
/// persisted before it.
fn apply_effects(
    tx: &StoreTx<'_>,
    token: &str,
    effects: Vec<Effect>,
    at: DateTime<Utc>,
) -> ChatResult<Vec<Message>> {
    let mut persisted: Vec<Message> = Vec::new();

    for effect in effects {
        match effect {
            Effect::PersistMessage { sender, content } => {
                persisted.push(tx.append_message(token, sender, &content, at)?);
            }
            Effect::CloseSession => {
                let ended_at = persisted.last().map_or(at, |m| m.created_at);
                tx.close_session(token, ended_at)?;
            }
        }
    }

    Ok(persisted)
}

/// Take the single message a transition persisted
fn single_message(persisted: Vec<Message>) -> ChatResult<Message> {
    persisted
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::store("Message was not persisted"))
}
