//! Unified error handling for the trend signal bot
//!
//! Subsystems keep their own `thiserror` enums (`ConfigError`,
//! `ProviderError`, `NotifyError`); this type is what commands and the
//! orchestrator propagate.

use std::fmt;
use std::io;

use crate::clients::notifier::NotifyError;
use crate::clients::provider::ProviderError;
use crate::config::ConfigError;

/// Main error type for the trend signal bot
#[derive(Debug)]
pub enum BotError {
    // Configuration errors
    ConfigNotFound(String),
    ConfigParse(String),
    ConfigValidation(String),

    // Database errors
    DatabaseConnection(String),
    DatabaseQuery(String),

    // Market data errors
    MarketData(ProviderError),

    // Notification errors
    Notification(NotifyError),

    // Watch list errors
    EmptyWatchList,
    InvalidInstrument(String),

    // IO errors
    FileNotFound(String),
    FileRead(String),
    FileWrite(String),

    // General errors
    Internal(String),
}

impl BotError {
    /// Get a user-friendly error message with helpful context
    pub fn user_message(&self) -> String {
        match self {
            BotError::ConfigNotFound(path) => {
                format!(
                    "Configuration file not found: {}\n\n\
                    💡 Quick fix:\n\
                    1. Run: trend-bot init\n\
                    2. Edit config.toml (instruments, resolutions, telegram)\n\
                    3. Try again",
                    path
                )
            }
            BotError::ConfigValidation(msg) => {
                format!(
                    "Configuration validation error: {}\n\n\
                    💡 Check config.toml for:\n\
                    - At least one resolution\n\
                    - Positive indicator periods\n\
                    - Thresholds between 0 and 100",
                    msg
                )
            }
            BotError::EmptyWatchList => {
                "No instruments to watch\n\n\
                💡 Either:\n\
                - Add instruments to [scan] instruments in config.toml\n\
                - Run: trend-bot watch add XBTUSD"
                    .to_string()
            }
            BotError::Notification(NotifyError::NotConfigured(msg)) => {
                format!(
                    "Notifications are not configured: {}\n\n\
                    💡 Set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID, or use --dry-run",
                    msg
                )
            }
            BotError::MarketData(ProviderError::RateLimited(msg)) => {
                format!(
                    "Market data rate limit exceeded: {}\n\n\
                    💡 Lower kraken.max_calls_per_minute or raise scan.request_delay_ms",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            BotError::MarketData(e) => e.is_retryable(),
            BotError::Notification(NotifyError::Transport(_))
            | BotError::Notification(NotifyError::Timeout(_)) => true,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            BotError::ConfigNotFound(_)
            | BotError::ConfigParse(_)
            | BotError::ConfigValidation(_) => "config",

            BotError::DatabaseConnection(_) | BotError::DatabaseQuery(_) => "database",

            BotError::MarketData(_) => "market_data",

            BotError::Notification(_) => "notification",

            BotError::EmptyWatchList | BotError::InvalidInstrument(_) => "watch_list",

            BotError::FileNotFound(_) | BotError::FileRead(_) | BotError::FileWrite(_) => "io",

            BotError::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path)
            }
            BotError::ConfigParse(msg) => {
                write!(f, "Configuration parse error: {}", msg)
            }
            BotError::ConfigValidation(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }

            BotError::DatabaseConnection(msg) => {
                write!(f, "Database connection error: {}", msg)
            }
            BotError::DatabaseQuery(msg) => {
                write!(f, "Database query error: {}", msg)
            }

            BotError::MarketData(err) => {
                write!(f, "Market data error: {}", err)
            }

            BotError::Notification(err) => {
                write!(f, "Notification error: {}", err)
            }

            BotError::EmptyWatchList => {
                write!(f, "Watch list is empty")
            }
            BotError::InvalidInstrument(instrument) => {
                write!(f, "Invalid instrument identifier: '{}'", instrument)
            }

            BotError::FileNotFound(path) => {
                write!(f, "File not found: {}", path)
            }
            BotError::FileRead(msg) => {
                write!(f, "File read error: {}", msg)
            }
            BotError::FileWrite(msg) => {
                write!(f, "File write error: {}", msg)
            }

            BotError::Internal(msg) => {
                write!(f, "Internal error: {}", msg)
            }
        }
    }
}

impl std::error::Error for BotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BotError::MarketData(err) => Some(err),
            BotError::Notification(err) => Some(err),
            _ => None,
        }
    }
}

// Conversion implementations for common error types

impl From<io::Error> for BotError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => BotError::FileNotFound(err.to_string()),
            io::ErrorKind::PermissionDenied => BotError::FileRead(err.to_string()),
            _ => BotError::Internal(format!("IO error: {}", err)),
        }
    }
}

impl From<rusqlite::Error> for BotError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => BotError::DatabaseQuery(msg),
            rusqlite::Error::SqliteFailure(code, None)
                if code.code == rusqlite::ErrorCode::CannotOpen =>
            {
                BotError::DatabaseConnection(err.to_string())
            }
            rusqlite::Error::QueryReturnedNoRows => {
                BotError::DatabaseQuery("Query returned no rows".to_string())
            }
            _ => BotError::DatabaseQuery(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Internal(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for BotError {
    fn from(err: toml::de::Error) -> Self {
        BotError::ConfigParse(format!("TOML parse error: {}", err))
    }
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            BotError::MarketData(ProviderError::Http(status.as_u16()))
        } else {
            BotError::MarketData(ProviderError::Network(err.to_string()))
        }
    }
}

impl From<ConfigError> for BotError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::FileRead(msg) => BotError::FileRead(msg),
            ConfigError::FileWrite(msg) => BotError::FileWrite(msg),
            ConfigError::Parse(msg) => BotError::ConfigParse(msg),
            ConfigError::Serialize(msg) => BotError::Internal(msg),
            ConfigError::Validation(msg) => BotError::ConfigValidation(msg),
        }
    }
}

impl From<ProviderError> for BotError {
    fn from(err: ProviderError) -> Self {
        BotError::MarketData(err)
    }
}

impl From<NotifyError> for BotError {
    fn from(err: NotifyError) -> Self {
        BotError::Notification(err)
    }
}

impl From<String> for BotError {
    fn from(msg: String) -> Self {
        BotError::Internal(msg)
    }
}

impl From<&str> for BotError {
    fn from(msg: &str) -> Self {
        BotError::Internal(msg.to_string())
    }
}

/// Result type alias using BotError
pub type BotResult<T> = Result<T, BotError>;
