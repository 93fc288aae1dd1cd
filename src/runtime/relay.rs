//! Backend-originated pushes outside the player round trip

use super::{apply_effects, authorize, require_player, require_token, single_message, ConversationService};
use crate::db::Message;
use crate::error::{ChatError, ChatResult};
use crate::state_machine::{transition, Event};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use subtle::ConstantTimeEq;

/// Inbound push body, in the backend's wire vocabulary
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendPush {
    #[serde(rename = "sessao", default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub player: Option<String>,
    /// Raw `mensagem` value; validated as text by `receive_backend_push`
    #[serde(rename = "mensagem", default)]
    pub message: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub message: Message,
    /// The pushed text was the end-of-conversation phrase
    pub ended: bool,
}

impl ConversationService {
    /// Record a message the backend pushed on its own initiative.
    ///
    /// The credential is checked before anything else is looked at.
    pub fn receive_backend_push(
        &self,
        credential: Option<&str>,
        push: &BackendPush,
    ) -> ChatResult<PushOutcome> {
        if !self.credential_matches(credential) {
            tracing::warn!(
                session = push.session_token.as_deref().unwrap_or(""),
                "Relay push rejected: bad credential"
            );
            return Err(ChatError::unauthorized("Invalid API key"));
        }

        let token = require_token(push.session_token.as_deref().unwrap_or(""))?;
        let player = require_player(push.player.as_deref())?;
        let text = match &push.message {
            Some(Value::String(text)) if !text.trim().is_empty() => text.trim().to_string(),
            _ => return Err(ChatError::invalid_input("Message is required")),
        };

        let (message, ended) = self.db.scope(Some(token), |tx| -> ChatResult<(Message, bool)> {
            let session = tx.get_session(token)?;
            authorize(&session, &player)?;
            let result = transition(session.state(), Event::BackendMessage { text })?;
            let message = single_message(apply_effects(tx, token, result.effects, Utc::now())?)?;
            Ok((message, result.terminator))
        })?;

        tracing::info!(
            session = %token,
            player = %player,
            message_id = message.id,
            ended,
            "Relay message received"
        );
        if ended {
            tracing::info!(session = %token, player = %player, "Session ended");
        }

        Ok(PushOutcome { message, ended })
    }

    fn credential_matches(&self, credential: Option<&str>) -> bool {
        match (&self.relay_secret, credential) {
            (Some(expected), Some(given)) => bool::from(expected.as_bytes().ct_eq(given.as_bytes())),
            _ => false,
        }
    }
}
