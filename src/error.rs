/// Unified error types for Portal Console
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when the backend cannot be reached at all
pub const UNREACHABLE_MESSAGE: &str = "Backend unreachable, check that the API server is running";

/// Message shown when the session is missing or expired
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please sign in again";

/// Generic fallback when nothing better is known
pub const GENERIC_FAILURE_MESSAGE: &str = "Operation failed, please try again";

/// Main error type for the console
#[derive(Error, Debug, Clone)]
pub enum ConsoleError {
    /// Missing, invalid or expired session (HTTP 401, domain codes 1002/1003)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Connection refused, timeout, DNS failure
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Client-side form validation failure; never reaches the network
    #[error("Validation error: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// Non-zero envelope code reported by the backend
    #[error("Server error {code}: {message}")]
    Server { code: i64, message: String },

    /// Response did not match the expected schema
    #[error("Decode error: {0}")]
    Decode(String),

    /// Bad configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session file IO
    #[error("IO error: {0}")]
    Io(String),

    /// Anything else
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

/// Coarse classification used for display and for list clearing decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    Connectivity,
    Validation,
    Server,
    Unknown,
}

/// One failed form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConsoleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsoleError::Authentication(_) => ErrorKind::Auth,
            ConsoleError::Connectivity(_) => ErrorKind::Connectivity,
            ConsoleError::Validation(_) => ErrorKind::Validation,
            ConsoleError::Server { .. } => ErrorKind::Server,
            ConsoleError::Decode(_)
            | ConsoleError::Config(_)
            | ConsoleError::Io(_)
            | ConsoleError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Operator-facing text. Server messages are shown verbatim; an empty
    /// server message falls back to the per-operation `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ConsoleError::Authentication(_) => SESSION_EXPIRED_MESSAGE.to_string(),
            ConsoleError::Connectivity(_) => UNREACHABLE_MESSAGE.to_string(),
            ConsoleError::Validation(errors) => format_field_errors(errors),
            ConsoleError::Server { message, .. } => {
                let trimmed = message.trim();
                if trimmed.is_empty() {
                    fallback.to_string()
                } else {
                    trimmed.to_string()
                }
            }
            _ => {
                if fallback.is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    fallback.to_string()
                }
            }
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() || e.is_request() {
            ConsoleError::Connectivity(e.to_string())
        } else if e.is_decode() {
            ConsoleError::Decode(e.to_string())
        } else {
            ConsoleError::Unknown(e.to_string())
        }
    }
}

impl From<std::io::Error> for ConsoleError {
    fn from(e: std::io::Error) -> Self {
        ConsoleError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(e: serde_json::Error) -> Self {
        ConsoleError::Decode(e.to_string())
    }
}

/// Result type alias for console operations
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Severity of a [`Notice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Message left behind by a manager operation instead of a propagated error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub kind: Option<ErrorKind>,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            kind: None,
            text: text.into(),
        }
    }

    pub fn from_error(error: &ConsoleError, fallback: &str) -> Self {
        Self {
            level: NoticeLevel::Error,
            kind: Some(error.kind()),
            text: error.user_message(fallback),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Result of a guarded mutating action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    /// Rejected by client-side validation; no request was sent
    Invalid(Vec<FieldError>),
    Failed(Notice),
}

impl ActionOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, ActionOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_shown_verbatim() {
        let err = ConsoleError::Server {
            code: 4001,
            message: "Email already registered".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.user_message("Create failed"), "Email already registered");
    }

    #[test]
    fn test_empty_server_message_uses_fallback() {
        let err = ConsoleError::Server {
            code: 5000,
            message: "  ".to_string(),
        };
        assert_eq!(err.user_message("Create failed"), "Create failed");
    }

    #[test]
    fn test_auth_and_connectivity_have_fixed_text() {
        let auth = ConsoleError::Authentication("code 1003".to_string());
        assert_eq!(auth.kind(), ErrorKind::Auth);
        assert_eq!(auth.user_message("Save failed"), SESSION_EXPIRED_MESSAGE);

        let down = ConsoleError::Connectivity("connection refused".to_string());
        assert_eq!(down.kind(), ErrorKind::Connectivity);
        assert_eq!(down.user_message("Save failed"), UNREACHABLE_MESSAGE);
    }

    #[test]
    fn test_unknown_errors_fall_back() {
        let err = ConsoleError::Decode("missing field `items`".to_string());
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.user_message("Load failed"), "Load failed");
        assert_eq!(err.user_message(""), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_notice_from_error() {
        let notice = Notice::from_error(
            &ConsoleError::Validation(vec![FieldError {
                field: "email".to_string(),
                message: "invalid email".to_string(),
            }]),
            "Create failed",
        );
        assert!(notice.is_error());
        assert_eq!(notice.kind, Some(ErrorKind::Validation));
        assert_eq!(notice.text, "email: invalid email");
    }
}
