use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::auth::StoreError;

/// Error type a [`Transport`](super::Transport) reports for network-level failures.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - session is no longer valid, please log in again")]
    AuthorizationRejected,

    #[error("Invalid password")]
    InvalidCredentials,

    #[error("Too many failed login attempts: {0}")]
    RateLimited(RateLimitInfo),

    #[error("Rejected: {0}")]
    ValidationRejected(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Transport(#[source] TransportError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Could not update session: {0}")]
    Session(#[from] StoreError),
}

/// What the backend reports when it refuses a login for too many attempts.
/// Values are kept exactly as sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    #[serde(default)]
    pub blocked_until: Option<String>,
    #[serde(default)]
    pub retry_after: Option<u64>,
}

impl RateLimitInfo {
    pub fn blocked_until_utc(&self) -> Option<DateTime<Utc>> {
        self.blocked_until
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl fmt::Display for RateLimitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.blocked_until, self.retry_after) {
            (Some(until), Some(secs)) => {
                write!(f, "blocked until {}, retry after {} seconds", until, secs)
            }
            (Some(until), None) => write!(f, "blocked until {}", until),
            (None, Some(secs)) => write!(f, "retry after {} seconds", secs),
            (None, None) => write!(f, "please wait before retrying"),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "message", alias = "detail")]
    error: Option<String>,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Prefer the backend's own message over the raw body.
    fn message(body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| Self::truncate_body(body))
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => ApiError::AuthorizationRejected,
            400 | 422 => ApiError::ValidationRejected(Self::message(body)),
            403 => ApiError::AccessDenied(Self::message(body)),
            404 => ApiError::NotFound(Self::message(body)),
            429 => ApiError::RateLimited(serde_json::from_str(body).unwrap_or_default()),
            500..=599 => ApiError::ServerError(Self::message(body)),
            _ => ApiError::InvalidResponse(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(ApiError::from_status(401, ""), ApiError::AuthorizationRejected));
        assert!(matches!(ApiError::from_status(403, "no"), ApiError::AccessDenied(_)));
        assert!(matches!(ApiError::from_status(404, ""), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from_status(503, ""), ApiError::ServerError(_)));
        assert!(matches!(ApiError::from_status(418, ""), ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_validation_prefers_backend_message() {
        match ApiError::from_status(400, r#"{"error": "password too weak"}"#) {
            ApiError::ValidationRejected(msg) => assert_eq!(msg, "password too weak"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rate_limit_body_is_kept_verbatim() {
        let body = r#"{"error":"blocked","blockedUntil":"2026-10-19T12:30:00Z","retryAfter":287}"#;
        match ApiError::from_status(429, body) {
            ApiError::RateLimited(info) => {
                assert_eq!(info.blocked_until.as_deref(), Some("2026-10-19T12:30:00Z"));
                assert_eq!(info.retry_after, Some(287));
                assert!(info.blocked_until_utc().is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rate_limit_without_body() {
        match ApiError::from_status(429, "") {
            ApiError::RateLimited(info) => assert_eq!(info, RateLimitInfo::default()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.contains("truncated"));
    }
}
