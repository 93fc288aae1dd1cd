//! Player round trip: persist, dispatch, persist the reply
//!
//! The player's message and the backend's reply commit in two separate
//! store scopes. An upstream failure between them leaves the player's
//! message in the log.

use super::{apply_effects, authorize, require_player, require_token, single_message, ConversationService};
use crate::db::Message;
use crate::dispatch::{reply_text, DispatchRequest};
use crate::error::{ChatError, ChatResult};
use crate::identity::validate_message;
use crate::state_machine::{transition, Event};
use chrono::Utc;

/// Both sides of one completed exchange
#[derive(Debug, Clone)]
pub struct RoundTrip {
    pub player_message: Message,
    pub backend_message: Message,
    /// The reply was the end-of-conversation phrase
    pub ended: bool,
}

impl ConversationService {
    /// Record a player message, forward it to the backend and record the reply.
    pub async fn submit_player_message(
        &self,
        token: &str,
        player: Option<&str>,
        text: Option<&str>,
    ) -> ChatResult<RoundTrip> {
        let token = require_token(token)?;
        let player = require_player(player)?;
        let text = validate_message(text, &self.limits)?;

        let player_message = self.db.scope(Some(token), |tx| -> ChatResult<Message> {
            let session = tx.get_session(token)?;
            authorize(&session, &player)?;
            let result = transition(session.state(), Event::PlayerMessage { text: text.clone() })?;
            single_message(apply_effects(tx, token, result.effects, Utc::now())?)
        })?;

        tracing::info!(
            session = %token,
            player = %player,
            message_id = player_message.id,
            "Player message stored"
        );

        let request = DispatchRequest {
            session_token: token.to_string(),
            player: player.clone(),
            message: text,
        };
        let body = self.dispatcher.dispatch(&request).await?;
        let reply = reply_text(&body).map_err(|e| {
            tracing::error!(session = %token, error = %e.message, "Backend reply unusable");
            ChatError::from(e)
        })?;

        let (backend_message, ended) = self.db.scope(Some(token), |tx| -> ChatResult<_> {
            let session = tx.get_session(token)?;
            authorize(&session, &player)?;
            let result = transition(session.state(), Event::BackendMessage { text: reply })?;
            let message = single_message(apply_effects(tx, token, result.effects, Utc::now())?)?;
            Ok((message, result.terminator))
        })?;

        if ended {
            tracing::info!(session = %token, player = %player, "Session ended");
        }

        Ok(RoundTrip {
            player_message,
            backend_message,
            ended,
        })
    }
}
