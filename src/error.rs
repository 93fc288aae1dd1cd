//! Error taxonomy surfaced by the conversation core
//!
//! Every failure of the orchestrator or the relay is reported as a
//! [`ChatError`]: one [`ErrorKind`] plus a human-readable detail.

use crate::db::DbError;
use crate::dispatch::DispatchError;
use crate::state_machine::TransitionError;
use serde::Serialize;
use thiserror::Error;

/// Conversation error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ChatError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ChatError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamError, message)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreError, message)
    }
}

/// Error classification, one per caller-visible failure mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-bounds client data
    InvalidInput,
    /// Unknown session token
    NotFound,
    /// Player does not own the session
    Forbidden,
    /// Operation violates the session state (e.g. session ended)
    Conflict,
    /// Relay credential missing or wrong
    Unauthorized,
    /// Remote backend unreachable or returned an unusable payload
    UpstreamError,
    /// Persistence-layer failure; the enclosing scope was rolled back
    StoreError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::Unauthorized => "unauthorized",
            Self::UpstreamError => "upstream_error",
            Self::StoreError => "store_error",
        }
    }
}

impl From<DbError> for ChatError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::SessionNotFound(_) => Self::not_found("Session not found"),
            other => Self::store(other.to_string()),
        }
    }
}

impl From<DispatchError> for ChatError {
    fn from(err: DispatchError) -> Self {
        Self::upstream(err.message)
    }
}

impl From<TransitionError> for ChatError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::SessionEnded => Self::conflict(err.to_string()),
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
