//! Process configuration from the environment

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_SUBMISSIONS_DIR: &str = "data/submissions";
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_MAX_SESSIONS: usize = 10_000;
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingToken,
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Bot configuration
#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub api_url: String,
    pub submissions_dir: PathBuf,
    pub session_ttl: Duration,
    pub max_sessions: usize,
    pub poll_timeout: Duration,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; `from_env` passes the process env
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("TELEGRAM_BOT_TOKEN")
            .or_else(|| lookup("BOT_TOKEN"))
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            token: token.trim().to_string(),
            api_url: lookup("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            submissions_dir: lookup("SUBMISSIONS_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_SUBMISSIONS_DIR), PathBuf::from),
            session_ttl: parse_var(&lookup, "SESSION_TTL_SECS")?
                .map_or(DEFAULT_SESSION_TTL, Duration::from_secs),
            max_sessions: parse_var(&lookup, "MAX_SESSIONS")?.unwrap_or(DEFAULT_MAX_SESSIONS),
            poll_timeout: parse_var(&lookup, "POLL_TIMEOUT_SECS")?
                .map_or(DEFAULT_POLL_TIMEOUT, Duration::from_secs),
        })
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

// Keep the token out of logs
impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("submissions_dir", &self.submissions_dir)
            .field("session_ttl", &self.session_ttl)
            .field("max_sessions", &self.max_sessions)
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}
