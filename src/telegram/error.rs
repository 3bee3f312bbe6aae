//! Telegram API error types

use std::time::Duration;
use thiserror::Error;

/// Bot API error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TelegramError {
    pub kind: TelegramErrorKind,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl TelegramError {
    pub fn new(kind: TelegramErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TelegramErrorKind::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TelegramErrorKind::Decode, message)
    }

    /// Classify a failed API call by its HTTP status / `error_code`
    pub fn from_status(code: u16, description: impl Into<String>) -> Self {
        let kind = match code {
            // The API answers 404 for an unknown bot token
            401 | 403 | 404 => TelegramErrorKind::Auth,
            429 => TelegramErrorKind::RateLimit,
            500..=599 => TelegramErrorKind::ServerError,
            _ => TelegramErrorKind::InvalidRequest,
        };
        Self::new(kind, format!("Telegram API error {code}: {}", description.into()))
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs embed the bot token
        let e = e.without_url();
        if e.is_decode() {
            Self::decode(e.to_string())
        } else {
            Self::network(e.to_string())
        }
    }
}

/// Error classification for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelegramErrorKind {
    /// Connection failures and timeouts - retryable
    Network,
    /// Flood control (429) - retryable after `retry_after`
    RateLimit,
    /// Server error (5xx) - retryable
    ServerError,
    /// Bad or revoked token - not retryable
    Auth,
    /// Rejected request (400) - not retryable
    InvalidRequest,
    /// Response body didn't match the expected shape
    Decode,
}

impl TelegramErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}
