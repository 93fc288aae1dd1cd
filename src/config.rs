//! Environment-driven configuration

use crate::identity::MessageLimits;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_BACKEND_TIMEOUT_SECS: f64 = 15.0;
const DEFAULT_SESSION_HOURS: i64 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process settings, read once at startup
#[derive(Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub backend_url: String,
    pub backend_timeout: Duration,
    /// Sent as `X-API-Key` on every dispatch when set
    pub backend_api_key: Option<String>,
    /// Credential expected on relay pushes; unset rejects every push
    pub webhook_api_key: Option<String>,
    pub limits: MessageLimits,
    /// Only used to report `expires_at` on new sessions
    pub session_ttl: chrono::Duration,
    pub allowed_origins: Vec<String>,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Blank values count as unset
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let db_path = var("VALEZAP_DB_PATH").map_or_else(
            || {
                let home = var("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.valezap/valezap.db"))
            },
            PathBuf::from,
        );

        let port = var("VALEZAP_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let backend_url = var("VALEZAP_BACKEND_URL").ok_or(ConfigError::Missing("VALEZAP_BACKEND_URL"))?;

        let backend_timeout = match var("VALEZAP_BACKEND_TIMEOUT") {
            None => Duration::from_secs_f64(DEFAULT_BACKEND_TIMEOUT_SECS),
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|secs| secs.is_finite() && *secs > 0.0)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or(ConfigError::Invalid {
                    name: "VALEZAP_BACKEND_TIMEOUT",
                    value: raw,
                })?,
        };

        let defaults = MessageLimits::default();
        let limits = MessageLimits {
            min_len: var("VALEZAP_MIN_MESSAGE_LENGTH")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_len),
            max_len: var("VALEZAP_MAX_MESSAGE_LENGTH")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_len),
        };
        if limits.min_len == 0 || limits.min_len > limits.max_len {
            return Err(ConfigError::Invalid {
                name: "VALEZAP_MIN_MESSAGE_LENGTH",
                value: format!("{} (max {})", limits.min_len, limits.max_len),
            });
        }

        let session_hours = var("VALEZAP_SESSION_HOURS")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_SESSION_HOURS);

        let allowed_origins = var("VALEZAP_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            db_path,
            port,
            backend_url,
            backend_timeout,
            backend_api_key: var("VALEZAP_BACKEND_API_KEY"),
            webhook_api_key: var("VALEZAP_WEBHOOK_API_KEY"),
            limits,
            session_ttl: chrono::Duration::hours(session_hours),
            allowed_origins,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: Option<&String>| key.map(|_| "<redacted>");
        f.debug_struct("AppConfig")
            .field("db_path", &self.db_path)
            .field("port", &self.port)
            .field("backend_url", &self.backend_url)
            .field("backend_timeout", &self.backend_timeout)
            .field("backend_api_key", &redact(self.backend_api_key.as_ref()))
            .field("webhook_api_key", &redact(self.webhook_api_key.as_ref()))
            .field("limits", &self.limits)
            .field("session_ttl", &self.session_ttl)
            .field("allowed_origins", &self.allowed_origins)
            .field("log_level", &self.log_level)
            .finish()
    }
}
