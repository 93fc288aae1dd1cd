//! HTTP API for the ValeZap relay
//!
//! Player-facing session and message routes, the backend push webhook and
//! a health probe.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::runtime::ConversationService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConversationService>,
    /// Reported as `expires_at` on new sessions
    pub session_ttl: chrono::Duration,
}

impl AppState {
    pub fn new(service: ConversationService, session_ttl: chrono::Duration) -> Self {
        Self {
            service: Arc::new(service),
            session_ttl,
        }
    }
}
