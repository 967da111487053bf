//! Error types for the QuizHub SDK
//!
//! Every non-2xx response is normalized into a single [`HttpError`] at the
//! executor boundary, so retry and refresh logic only ever inspect one shape.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

/// A non-2xx response, normalized
#[derive(Debug, Clone)]
pub struct HttpError {
    /// HTTP status of the response
    pub status: StatusCode,
    /// Response headers (used for `Retry-After`)
    pub headers: HeaderMap,
    /// Parsed JSON body, if the body was JSON
    pub data: Option<Value>,
    /// Human-readable message derived from the body or the status
    pub message: String,
}

impl HttpError {
    /// Build an error from a status, headers and the (possibly parsed) body
    pub fn new(status: StatusCode, headers: HeaderMap, data: Option<Value>) -> Self {
        let message = derive_message(status, data.as_ref());
        Self {
            status,
            headers,
            data,
            message,
        }
    }

    /// 401 or 403
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    }

    /// 429 or 503
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        )
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status.as_u16())
    }
}

impl std::error::Error for HttpError {}

/// Pick the message for an error body: `message`, then `error`, then `HTTP {status}`.
///
/// `error` may be a plain string or an object carrying its own `message`.
fn derive_message(status: StatusCode, data: Option<&Value>) -> String {
    let from_body = data.and_then(|body| {
        body.get("message")
            .and_then(Value::as_str)
            .or_else(|| match body.get("error") {
                Some(Value::String(s)) => Some(s.as_str()),
                Some(Value::Object(obj)) => obj.get("message").and_then(Value::as_str),
                _ => None,
            })
    });

    match from_body {
        Some(msg) if !msg.is_empty() => msg.to_string(),
        _ => format!("HTTP {}", status.as_u16()),
    }
}

/// Main error type for the SDK
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status
    #[error("{0}")]
    Http(#[from] HttpError),

    /// The request never produced a response (connection, TLS, timeout...)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The request could not be built
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The server answered 2xx but the body was not what the operation needs
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// A payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status, when the server produced a response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http(e) => Some(e.status),
            ApiError::HttpClient(e) => e.status(),
            _ => None,
        }
    }

    /// Parsed error body, when there was one
    pub fn data(&self) -> Option<&Value> {
        match self {
            ApiError::Http(e) => e.data.as_ref(),
            _ => None,
        }
    }

    /// Message suitable for mapping to user-facing text
    pub fn message(&self) -> String {
        match self {
            ApiError::Http(e) => e.message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the retry orchestrator would back off and try again
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Http(e) if e.is_retryable())
    }

    /// Whether the failure means the session must be re-established
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, ApiError::Http(e) if e.is_auth_failure())
    }

    /// Get error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Http(e) => match e.status {
                StatusCode::UNAUTHORIZED => "QUIZHUB_AUTH_ERROR",
                StatusCode::FORBIDDEN => "QUIZHUB_AUTHZ_ERROR",
                StatusCode::TOO_MANY_REQUESTS => "QUIZHUB_RATE_LIMIT",
                StatusCode::SERVICE_UNAVAILABLE => "QUIZHUB_SERVICE_UNAVAILABLE",
                StatusCode::NOT_FOUND => "QUIZHUB_NOT_FOUND",
                s if s.is_client_error() => "QUIZHUB_CLIENT_ERROR",
                _ => "QUIZHUB_SERVER_ERROR",
            },
            ApiError::HttpClient(_) => "QUIZHUB_TRANSPORT_ERROR",
            ApiError::InvalidRequest { .. } => "QUIZHUB_INVALID_REQUEST",
            ApiError::InvalidResponse { .. } => "QUIZHUB_INVALID_RESPONSE",
            ApiError::Serialization(_) => "QUIZHUB_SERIALIZATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn error_with(status: u16, data: Option<Value>) -> HttpError {
        HttpError::new(
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            data,
        )
    }

    #[test]
    fn test_message_field_preferred() {
        let err = error_with(
            400,
            Some(json!({ "message": "Quiz name is required", "error": "Bad Request" })),
        );
        assert_eq!(err.message, "Quiz name is required");
    }

    #[test]
    fn test_error_field_used_when_no_message() {
        let err = error_with(409, Some(json!({ "error": "Username taken" })));
        assert_eq!(err.message, "Username taken");
    }

    #[test]
    fn test_nested_error_object() {
        let err = error_with(
            404,
            Some(json!({ "error": { "code": "NOT_FOUND", "message": "Quiz not found" } })),
        );
        assert_eq!(err.message, "Quiz not found");
    }

    #[test]
    fn test_generic_fallback() {
        assert_eq!(error_with(502, None).message, "HTTP 502");
        assert_eq!(error_with(500, Some(json!({ "message": 42 }))).message, "HTTP 500");
        assert_eq!(error_with(500, Some(json!("oops"))).message, "HTTP 500");
    }

    #[test]
    fn test_classification() {
        assert!(error_with(401, None).is_auth_failure());
        assert!(error_with(403, None).is_auth_failure());
        assert!(!error_with(404, None).is_auth_failure());
        assert!(error_with(429, None).is_retryable());
        assert!(error_with(503, None).is_retryable());
        assert!(!error_with(500, None).is_retryable());
    }

    #[test]
    fn test_api_error_accessors() {
        let err = ApiError::from(error_with(429, Some(json!({ "message": "slow down" }))));
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(err.message(), "slow down");
        assert_eq!(err.data().unwrap()["message"], "slow down");
        assert!(err.is_retryable());
        assert!(!err.requires_reauthentication());
        assert_eq!(err.error_code(), "QUIZHUB_RATE_LIMIT");

        let invalid = ApiError::InvalidRequest {
            message: "bad header".into(),
        };
        assert!(!invalid.requires_reauthentication());
        assert_eq!(invalid.status(), None);
        assert_eq!(invalid.message(), "Invalid request: bad header");
    }
}
