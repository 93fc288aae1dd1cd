//! Dispatch error types

use thiserror::Error;

/// Longest response body excerpt kept for logging
const BODY_EXCERPT_CHARS: usize = 500;

/// Backend dispatch error with classification
///
/// Callers of the conversation core only ever see these as one upstream
/// failure; the kind exists for logs.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DispatchError {
    pub kind: DispatchErrorKind,
    pub message: String,
    /// Leading part of the offending response body, when there was one
    pub body: Option<String>,
}

impl DispatchError {
    pub fn new(kind: DispatchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.chars().take(BODY_EXCERPT_CHARS).collect());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::Timeout, message)
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::Status, message)
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::InvalidJson, message)
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::InvalidPayload, message)
    }

    pub fn missing_reply(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::MissingReply, message)
    }
}

/// Why a dispatch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchErrorKind {
    /// Connection refused, DNS, TLS, broken body stream
    Network,
    /// No complete response within the configured timeout
    Timeout,
    /// Non-2xx status
    Status,
    /// Body is not JSON
    InvalidJson,
    /// JSON but not an object
    InvalidPayload,
    /// Object without a usable reply text
    MissingReply,
}

impl DispatchErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Status => "status",
            Self::InvalidJson => "invalid_json",
            Self::InvalidPayload => "invalid_payload",
            Self::MissingReply => "missing_reply",
        }
    }
}
