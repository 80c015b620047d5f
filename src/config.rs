use std::time::Duration;

use crate::error::{AppError, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;
pub const DEFAULT_MAX_SESSIONS: u64 = 1000;

/// Process-wide settings, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub bind_addr: String,
    pub request_timeout: Duration,
    pub session_ttl: Duration,
    pub max_sessions: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("bind_addr", &self.bind_addr)
            .field("request_timeout", &self.request_timeout)
            .field("session_ttl", &self.session_ttl)
            .field("max_sessions", &self.max_sessions)
            .finish()
    }
}

impl Config {
    /// Load `.env` if present, then read the environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("GEMINI_API_KEY")
            .or_else(|| get("API_KEY"))
            .ok_or_else(|| {
                AppError::Configuration(
                    "GEMINI_API_KEY must be set in the environment or .env file".into(),
                )
            })?;

        let positive = |key: &str, default: u64| -> Result<u64> {
            match get(key) {
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(value) if value > 0 => Ok(value),
                    _ => Err(AppError::Configuration(format!(
                        "{} must be a positive integer, got {:?}",
                        key, raw
                    ))),
                },
                None => Ok(default),
            }
        };

        let request_timeout =
            Duration::from_secs(positive("ECOGUARD_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);
        let session_ttl =
            Duration::from_secs(positive("ECOGUARD_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?);
        let max_sessions = positive("ECOGUARD_MAX_SESSIONS", DEFAULT_MAX_SESSIONS)? as usize;

        Ok(Self {
            api_key: api_key.trim().to_string(),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            bind_addr: get("ECOGUARD_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            request_timeout,
            session_ttl,
            max_sessions,
        })
    }
}
