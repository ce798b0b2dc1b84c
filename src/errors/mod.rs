//! Error handling module for the Bloggit client.
//!
//! Provides a single error type for every backend call and local check, with stable error codes
//! and the message shown to the user.

use reqwest::StatusCode;
use serde::Deserialize;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const REMOTE_ERROR: &str = "REMOTE_ERROR";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const IO_ERROR: &str = "IO_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
}

/// Client error type.
#[derive(Debug)]
pub enum AppError {
    /// Backend refused the request (401/403), with its message if it sent one
    Unauthorized(Option<String>),
    /// Backend has no such resource (404)
    NotFound(Option<String>),
    /// Input rejected locally before any network call
    Validation(String),
    /// Any other non-success status
    Remote {
        status: u16,
        message: Option<String>,
    },
    /// Transport failure (connect, timeout, TLS)
    Network(String),
    /// Response body did not match the expected shape
    Decode(String),
    /// Local file access failed
    Io(String),
    /// Invalid configuration
    Config(String),
}

/// Body the backend sends alongside a failed request.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

impl AppError {
    /// Map a failed HTTP status and its (possibly empty) body to an error.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_message);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            _ => AppError::Remote {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Remote { .. } => codes::REMOTE_ERROR,
            AppError::Network(_) => codes::NETWORK_ERROR,
            AppError::Decode(_) => codes::DECODE_ERROR,
            AppError::Io(_) => codes::IO_ERROR,
            AppError::Config(_) => codes::CONFIG_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) => msg.clone().unwrap_or_else(|| "Not logged in".into()),
            AppError::NotFound(msg) => msg.clone().unwrap_or_else(|| "Not found".into()),
            AppError::Validation(msg) => msg.clone(),
            AppError::Remote { status, message } => message
                .clone()
                .unwrap_or_else(|| format!("Backend returned status {}", status)),
            AppError::Network(msg) => msg.clone(),
            AppError::Decode(msg) => msg.clone(),
            AppError::Io(msg) => msg.clone(),
            AppError::Config(msg) => msg.clone(),
        }
    }

    /// The text to show the user: the backend's own message when it sent one, the local
    /// validation message, or `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Unauthorized(Some(msg))
            | AppError::NotFound(Some(msg))
            | AppError::Remote {
                message: Some(msg), ..
            } => msg.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Absence the views treat as a normal state rather than a failure.
    pub fn is_expected_absence(&self) -> bool {
        matches!(self, AppError::Unauthorized(_) | AppError::NotFound(_))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            tracing::error!("Response decode error: {:?}", err);
            return AppError::Decode(format!("Unexpected response: {}", err));
        }
        tracing::error!("HTTP error: {:?}", err);
        AppError::Network(format!("Request failed: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::Decode(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("IO error: {:?}", err);
        AppError::Io(format!("IO error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = AppError::from_status(StatusCode::UNAUTHORIZED, b"");
        assert_eq!(err.error_code(), codes::UNAUTHORIZED);
        assert!(err.is_expected_absence());

        let err = AppError::from_status(StatusCode::FORBIDDEN, b"{\"message\":\"Nope\"}");
        assert_eq!(err.error_code(), codes::UNAUTHORIZED);
        assert_eq!(err.message(), "Nope");

        let err = AppError::from_status(StatusCode::NOT_FOUND, b"not json");
        assert_eq!(err.error_code(), codes::NOT_FOUND);

        let err = AppError::from_status(StatusCode::BAD_REQUEST, b"{\"message\":\"Title too long\"}");
        assert_eq!(err.error_code(), codes::REMOTE_ERROR);
        assert!(!err.is_expected_absence());
    }

    #[test]
    fn test_user_message_prefers_backend_text() {
        let err = AppError::from_status(
            StatusCode::BAD_REQUEST,
            b"{\"message\":\"Email already registered\"}",
        );
        assert_eq!(
            err.user_message("Registration failed"),
            "Email already registered"
        );

        let err = AppError::from_status(StatusCode::INTERNAL_SERVER_ERROR, b"{\"error\":\"boom\"}");
        assert_eq!(err.user_message("Failed"), "boom");
    }

    #[test]
    fn test_user_message_falls_back() {
        let err = AppError::from_status(StatusCode::INTERNAL_SERVER_ERROR, b"{\"message\":\"  \"}");
        assert_eq!(err.user_message("Failed to save blog post"), "Failed to save blog post");

        let err = AppError::Network("connection refused".into());
        assert_eq!(err.user_message("Login failed"), "Login failed");

        let err = AppError::Validation("Comment cannot be empty.".into());
        assert_eq!(err.user_message("ignored"), "Comment cannot be empty.");
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::Remote {
            status: 502,
            message: None,
        };
        assert_eq!(err.to_string(), "REMOTE_ERROR: Backend returned status 502");
    }
}
