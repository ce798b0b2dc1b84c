//! Configuration module for the Bloggit client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Bloggit backend
    pub api_base_url: String,
    /// File holding the authentication token between runs
    pub token_path: PathBuf,
    /// Quiet period after the last edit before a grammar check is sent
    pub grammar_debounce: Duration,
    /// Shortest plain-text projection that is worth checking
    pub grammar_min_length: usize,
    /// How long a toast stays visible
    pub toast_ttl: Duration,
    /// Per-request timeout for backend calls
    pub request_timeout: Duration,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human formatter
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("BLOGGIT_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5001".to_string());

        let token_path = env::var("BLOGGIT_TOKEN_PATH")
            .unwrap_or_else(|_| "./data/token".to_string())
            .into();

        let grammar_debounce =
            Duration::from_millis(parse_var("BLOGGIT_GRAMMAR_DEBOUNCE_MS", 2000)?);
        let grammar_min_length = parse_var("BLOGGIT_GRAMMAR_MIN_LENGTH", 10)?;
        let toast_ttl = Duration::from_millis(parse_var("BLOGGIT_TOAST_TTL_MS", 3000)?);
        let request_timeout = Duration::from_secs(parse_var("BLOGGIT_REQUEST_TIMEOUT_SECS", 30)?);

        let log_level = env::var("BLOGGIT_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
        let log_json = env::var("BLOGGIT_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            api_base_url,
            token_path,
            grammar_debounce,
            grammar_min_length,
            toast_ttl,
            request_timeout,
            log_level,
            log_json,
        })
    }

    /// Defaults pointed at a specific backend, with the token kept in `token_path`.
    pub fn for_backend(api_base_url: impl Into<String>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            token_path: token_path.into(),
            grammar_debounce: Duration::from_millis(2000),
            grammar_min_length: 10,
            toast_ttl: Duration::from_millis(3000),
            request_timeout: Duration::from_secs(30),
            log_level: "warn".to_string(),
            log_json: false,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid {} value: {:?}", name, raw))),
        Err(_) => Ok(default),
    }
}
