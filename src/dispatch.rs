//! Backend dispatch abstraction
//!
//! The conversation core hands each player message to a remote workflow
//! and expects a JSON object back carrying the reply text.

mod error;
mod webhook;

#[allow(unused_imports)] // Used in tests
pub use error::{DispatchError, DispatchErrorKind};
pub use webhook::WebhookDispatcher;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// Field carrying the message text, both outbound and in the reply
pub const REPLY_FIELD: &str = "mensagem";

/// Payload posted to the backend workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchRequest {
    #[serde(rename = "sessao")]
    pub session_token: String,
    pub player: String,
    #[serde(rename = "mensagem")]
    pub message: String,
}

/// Common interface for reaching the backend workflow
#[async_trait]
pub trait BackendDispatcher: Send + Sync {
    /// Deliver one player message and return the backend's JSON object
    async fn dispatch(&self, request: &DispatchRequest) -> Result<Map<String, Value>, DispatchError>;
}

#[async_trait]
impl<T: BackendDispatcher + ?Sized> BackendDispatcher for Arc<T> {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<Map<String, Value>, DispatchError> {
        (**self).dispatch(request).await
    }
}

/// Pull the trimmed reply text out of a backend response object
pub fn reply_text(body: &Map<String, Value>) -> Result<String, DispatchError> {
    match body.get(REPLY_FIELD) {
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Err(DispatchError::missing_reply("Backend reply is empty"))
            } else {
                Ok(trimmed.to_string())
            }
        }
        _ => Err(DispatchError::missing_reply("Invalid backend response")),
    }
}

/// Logging wrapper for dispatchers
pub struct LoggingDispatcher {
    inner: Arc<dyn BackendDispatcher>,
}

impl LoggingDispatcher {
    pub fn new(inner: Arc<dyn BackendDispatcher>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl BackendDispatcher for LoggingDispatcher {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<Map<String, Value>, DispatchError> {
        tracing::debug!(
            session = %request.session_token,
            player = %request.player,
            "Dispatching message to backend"
        );

        let start = Instant::now();
        let result = self.inner.dispatch(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(
                    session = %request.session_token,
                    player = %request.player,
                    duration_ms = %duration.as_millis(),
                    "Backend response received"
                );
            }
            Err(e) => {
                tracing::error!(
                    session = %request.session_token,
                    player = %request.player,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    body = e.body.as_deref().unwrap_or(""),
                    "Backend dispatch failed"
                );
            }
        }

        result
    }
}
