//! Database module for the conversation relay
//!
//! Provides persistence for chat sessions and their message history.
//! Every mutation runs inside [`Database::scope`], which commits when the
//! closure succeeds and rolls back everything it did when it fails.

mod schema;

pub use schema::*;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Session token already exists: {0}")]
    TokenCollision(String),
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> DbResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Close the underlying connection once no other handle is alive.
    ///
    /// Other clones keep the connection open until they are dropped.
    pub fn close(self) -> DbResult<()> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                let conn = mutex.into_inner().map_err(|_| DbError::LockPoisoned)?;
                conn.close().map_err(|(_, e)| DbError::Sqlite(e))
            }
            Err(_) => Ok(()),
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    /// Run `f` inside one atomic transaction.
    ///
    /// The transaction starts `IMMEDIATE`, so concurrent scopes serialize on
    /// the write lock and each observes the others' committed state only.
    /// `session` tags the tracing span the scope runs in.
    pub fn scope<T, E>(
        &self,
        session: Option<&str>,
        f: impl FnOnce(&StoreTx<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let span = tracing::debug_span!("store_scope", session = session.unwrap_or(""));
        let _entered = span.enter();

        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DbError::from)?;
        let store = StoreTx { tx };

        match f(&store) {
            Ok(value) => {
                store.tx.commit().map_err(DbError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(e) = store.tx.rollback() {
                    tracing::warn!(error = %e, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    // ==================== Single-operation scopes ====================

    pub fn create_session(&self, token: &str, player_id: &str) -> DbResult<Session> {
        self.scope(Some(token), |tx| tx.create_session(token, player_id, Utc::now()))
    }

    #[allow(dead_code)] // Used in tests
    pub fn get_session(&self, token: &str) -> DbResult<Session> {
        self.scope(Some(token), |tx| tx.get_session(token))
    }

    #[allow(dead_code)] // Used in tests
    pub fn list_messages(&self, token: &str) -> DbResult<Vec<Message>> {
        self.scope(Some(token), |tx| tx.list_messages(token))
    }

    #[allow(dead_code)] // Store surface; the runtime appends inside its own scopes
    pub fn append_message(
        &self,
        token: &str,
        sender: Sender,
        content: &str,
        at: DateTime<Utc>,
    ) -> DbResult<Message> {
        self.scope(Some(token), |tx| tx.append_message(token, sender, content, at))
    }

    #[allow(dead_code)] // Store surface; the runtime closes inside its own scopes
    pub fn close_session(&self, token: &str, at: DateTime<Utc>) -> DbResult<bool> {
        self.scope(Some(token), |tx| tx.close_session(token, at))
    }

    #[allow(dead_code)] // Used in tests
    pub fn delete_session(&self, token: &str) -> DbResult<()> {
        self.scope(Some(token), |tx| tx.delete_session(token))
    }
}

/// Store operations bound to one open transaction
pub struct StoreTx<'conn> {
    tx: rusqlite::Transaction<'conn>,
}

impl StoreTx<'_> {
    // ==================== Session Operations ====================

    /// Insert a new active session
    pub fn create_session(
        &self,
        token: &str,
        player_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<Session> {
        self.tx
            .execute(
                "INSERT INTO chat_sessions (session_token, player_id, is_active, created_at, ended_at)
                 VALUES (?1, ?2, 1, ?3, NULL)",
                params![token, player_id, format_timestamp(at)],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref failure, _)
                    if failure.code == ErrorCode::ConstraintViolation =>
                {
                    DbError::TokenCollision(token.to_string())
                }
                other => DbError::Sqlite(other),
            })?;

        Ok(Session {
            token: token.to_string(),
            player_id: player_id.to_string(),
            is_active: true,
            created_at: at,
            ended_at: None,
        })
    }

    /// Get session by token
    pub fn get_session(&self, token: &str) -> DbResult<Session> {
        self.tx
            .query_row(
                "SELECT session_token, player_id, is_active, created_at, ended_at
                 FROM chat_sessions WHERE session_token = ?1",
                params![token],
                session_from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => DbError::SessionNotFound(token.to_string()),
                other => DbError::Sqlite(other),
            })
    }

    /// Mark the session ended.
    ///
    /// Returns `true` when this call performed the transition and `false`
    /// when the session was already ended; `ended_at` is written only once.
    pub fn close_session(&self, token: &str, at: DateTime<Utc>) -> DbResult<bool> {
        let updated = self.tx.execute(
            "UPDATE chat_sessions SET is_active = 0, ended_at = ?1
             WHERE session_token = ?2 AND is_active = 1",
            params![format_timestamp(at), token],
        )?;

        if updated == 0 {
            // Distinguish "already ended" from "no such session"
            self.get_session(token)?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Delete a session and all its messages
    pub fn delete_session(&self, token: &str) -> DbResult<()> {
        // Messages are deleted by CASCADE
        let deleted = self.tx.execute(
            "DELETE FROM chat_sessions WHERE session_token = ?1",
            params![token],
        )?;

        if deleted == 0 {
            return Err(DbError::SessionNotFound(token.to_string()));
        }
        Ok(())
    }

    // ==================== Message Operations ====================

    /// Append a message to a session's log.
    ///
    /// `at` is clamped to the session's latest message time so that
    /// `created_at` never decreases along the log.
    pub fn append_message(
        &self,
        token: &str,
        sender: Sender,
        content: &str,
        at: DateTime<Utc>,
    ) -> DbResult<Message> {
        self.get_session(token)?;

        let latest: Option<String> = self
            .tx
            .query_row(
                "SELECT MAX(created_at) FROM messages WHERE session_token = ?1",
                params![token],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        let created_at = match latest.as_deref().and_then(parse_timestamp) {
            Some(latest) if latest > at => latest,
            _ => at,
        };

        self.tx.execute(
            "INSERT INTO messages (session_token, sender, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![token, sender.as_str(), content, format_timestamp(created_at)],
        )?;

        Ok(Message {
            id: self.tx.last_insert_rowid(),
            session_token: token.to_string(),
            sender,
            content: content.to_string(),
            created_at,
        })
    }

    /// Messages of a session in replay order
    pub fn list_messages(&self, token: &str) -> DbResult<Vec<Message>> {
        self.get_session(token)?;

        let mut stmt = self.tx.prepare(
            "SELECT id, session_token, sender, content, created_at
             FROM messages WHERE session_token = ?1
             ORDER BY created_at ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![token], message_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        token: row.get(0)?,
        player_id: row.get(1)?,
        is_active: row.get(2)?,
        created_at: timestamp_column(row, 3)?,
        ended_at: row
            .get::<_, Option<String>>(4)?
            .map(|raw| timestamp_from_str(4, &raw))
            .transpose()?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let raw_sender: String = row.get(2)?;
    let sender = Sender::parse(&raw_sender).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown sender: {raw_sender}").into(),
        )
    })?;

    Ok(Message {
        id: row.get(0)?,
        session_token: row.get(1)?,
        sender,
        content: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
    })
}

/// Fixed-width RFC 3339, so text order matches time order
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    timestamp_from_str(idx, &raw)
}

fn timestamp_from_str(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    parse_timestamp(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("invalid timestamp: {raw}").into(),
        )
    })
}
