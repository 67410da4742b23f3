//! Synthesis error types.

use std::fmt;

use thiserror::Error;
use tourgen_media::MediaError;

/// Result type for synthesis operations.
pub type SynthResult<T> = Result<T, SynthError>;

/// Service errors that no amount of retrying will fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalErrorClass {
    Quota,
    Permission,
    InvalidArgument,
}

impl ExternalErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalErrorClass::Quota => "quota_exceeded",
            ExternalErrorClass::Permission => "permission_denied",
            ExternalErrorClass::InvalidArgument => "invalid_argument",
        }
    }

    /// Classify a service message by the canonical status names it mentions.
    pub fn from_message(message: &str) -> Option<Self> {
        let lower = message.to_lowercase();
        if lower.contains("resource_exhausted") || lower.contains("quota") {
            Some(ExternalErrorClass::Quota)
        } else if lower.contains("permission_denied") || lower.contains("permission denied") {
            Some(ExternalErrorClass::Permission)
        } else if lower.contains("invalid_argument") || lower.contains("invalid argument") {
            Some(ExternalErrorClass::InvalidArgument)
        } else {
            None
        }
    }
}

impl fmt::Display for ExternalErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur while rendering a clip through the synthesis service.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("Synthesis service rejected the request ({class}): {message}")]
    ExternalService {
        class: ExternalErrorClass,
        message: String,
    },

    #[error("Synthesis service temporarily unavailable: {0}")]
    TransientService(String),

    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Operation did not finish after {attempts} status checks")]
    OperationTimedOut { attempts: u32 },

    #[error("Operation failed{}: {message}", .code.map(|c| format!(" (code {})", c)).unwrap_or_default())]
    OperationFailed { code: Option<i64>, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SynthError {
    pub fn external(class: ExternalErrorClass, message: impl Into<String>) -> Self {
        Self::ExternalService {
            class,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientService(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Map a non-success HTTP response to an error.
    ///
    /// The body is checked for canonical status names first so that a
    /// quota error reported with an unusual status code is still terminal.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        if status == 429 {
            return Self::external(ExternalErrorClass::Quota, body);
        }
        if let Some(class) = ExternalErrorClass::from_message(&body) {
            return Self::external(class, body);
        }
        match status {
            400 => Self::external(ExternalErrorClass::InvalidArgument, body),
            401 => Self::Auth(body),
            403 => Self::external(ExternalErrorClass::Permission, body),
            408 | 500..=599 => Self::TransientService(format!("HTTP {}: {}", status, body)),
            _ => Self::RequestFailed {
                status,
                message: body,
            },
        }
    }

    /// The terminal class of a service rejection, if this is one.
    pub fn external_class(&self) -> Option<ExternalErrorClass> {
        match self {
            SynthError::ExternalService { class, .. } => Some(*class),
            _ => None,
        }
    }

    /// Service hiccups: 5xx responses and transport failures.
    pub fn is_transient(&self) -> bool {
        matches!(self, SynthError::TransientService(_) | SynthError::Network(_))
    }

    /// Check if a submission that failed with this error may be attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SynthError::TransientService(_)
                | SynthError::Network(_)
                | SynthError::RequestFailed { .. }
                | SynthError::InvalidResponse(_)
                | SynthError::Auth(_)
                | SynthError::Json(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            SynthError::from_http_status(429, "slow down").external_class(),
            Some(ExternalErrorClass::Quota)
        );
        assert_eq!(
            SynthError::from_http_status(403, "nope").external_class(),
            Some(ExternalErrorClass::Permission)
        );
        assert_eq!(
            SynthError::from_http_status(400, "bad image").external_class(),
            Some(ExternalErrorClass::InvalidArgument)
        );
        assert!(SynthError::from_http_status(503, "unavailable").is_transient());
        assert!(matches!(
            SynthError::from_http_status(404, "missing"),
            SynthError::RequestFailed { status: 404, .. }
        ));
        assert!(matches!(SynthError::from_http_status(401, "expired"), SynthError::Auth(_)));
    }

    #[test]
    fn test_body_overrides_status() {
        let err = SynthError::from_http_status(500, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#);
        assert_eq!(err.external_class(), Some(ExternalErrorClass::Quota));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable_split() {
        for class in [
            ExternalErrorClass::Quota,
            ExternalErrorClass::Permission,
            ExternalErrorClass::InvalidArgument,
        ] {
            assert!(!SynthError::external(class, "x").is_retryable());
        }
        assert!(SynthError::transient("x").is_retryable());
        assert!(!SynthError::OperationTimedOut { attempts: 60 }.is_retryable());
        assert!(!SynthError::config("x").is_retryable());
    }

    #[test]
    fn test_operation_failed_message() {
        let err = SynthError::OperationFailed {
            code: Some(3),
            message: "unsafe content".into(),
        };
        assert_eq!(err.to_string(), "Operation failed (code 3): unsafe content");
        let err = SynthError::OperationFailed {
            code: None,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "Operation failed: boom");
    }
}
