//! Mock implementations for testing
//!
//! These mocks stand in for the backend webhook without real I/O.

use crate::dispatch::{BackendDispatcher, DispatchError, DispatchRequest};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

type Reply = Result<Map<String, Value>, DispatchError>;

// ============================================================================
// Mock Dispatcher
// ============================================================================

/// Mock dispatcher that returns queued replies
pub struct MockDispatcher {
    replies: Mutex<VecDeque<Reply>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<DispatchRequest>>,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a backend response body; anything but an object behaves like
    /// a backend that answered with the wrong JSON shape
    pub fn queue_reply(&self, body: Value) {
        let reply = match body {
            Value::Object(map) => Ok(map),
            _ => Err(DispatchError::invalid_payload("Backend response is not a JSON object")),
        };
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Queue a dispatch failure
    pub fn queue_error(&self, error: DispatchError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<DispatchRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Reply {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DispatchError::network("No mock reply queued")))
    }
}

impl Default for MockDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendDispatcher for MockDispatcher {
    async fn dispatch(&self, request: &DispatchRequest) -> Reply {
        self.requests.lock().unwrap().push(request.clone());
        self.next_reply()
    }
}

// ============================================================================
// Delayed Mock Dispatcher (for interleaving tests)
// ============================================================================

/// Mock dispatcher that holds each request for a fixed delay
pub struct DelayedMockDispatcher {
    inner: MockDispatcher,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockDispatcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockDispatcher::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, body: Value) {
        self.inner.queue_reply(body);
    }
}

#[async_trait]
impl BackendDispatcher for DelayedMockDispatcher {
    async fn dispatch(&self, request: &DispatchRequest) -> Reply {
        self.inner.requests.lock().unwrap().push(request.clone());
        self.request_started.notify_waiters();
        tokio::time::sleep(self.delay).await;
        self.inner.next_reply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchErrorKind;
    use serde_json::json;

    fn request() -> DispatchRequest {
        DispatchRequest {
            session_token: "tok".to_string(),
            player: "abc123".to_string(),
            message: "oi".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_returns_replies_in_order() {
        let mock = MockDispatcher::new();
        mock.queue_reply(json!({"mensagem": "um"}));
        mock.queue_error(DispatchError::timeout("slow"));

        let first = mock.dispatch(&request()).await.unwrap();
        assert_eq!(first["mensagem"], "um");
        let second = mock.dispatch(&request()).await.unwrap_err();
        assert_eq!(second.kind, DispatchErrorKind::Timeout);
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_without_replies_is_network_error() {
        let mock = MockDispatcher::new();
        let err = mock.dispatch(&request()).await.unwrap_err();
        assert_eq!(err.kind, DispatchErrorKind::Network);
    }

    #[tokio::test]
    async fn test_mock_non_object_reply_is_invalid_payload() {
        let mock = MockDispatcher::new();
        mock.queue_reply(json!(["mensagem"]));
        let err = mock.dispatch(&request()).await.unwrap_err();
        assert_eq!(err.kind, DispatchErrorKind::InvalidPayload);
    }
}
