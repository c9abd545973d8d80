//! Backend error types

use thiserror::Error;

/// Failed call to the chat backend, with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Timeout, message)
    }

    #[allow(dead_code)] // Used in tests
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::NotFound, message)
    }

    #[allow(dead_code)] // Used in tests
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::ServerError, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Decode, message)
    }

    /// 2xx response whose ack reported `success: false`
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Rejected, message)
    }

    /// Classify a non-success HTTP response
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = error_detail(body);
        let kind = match status {
            401 | 403 => BackendErrorKind::Auth,
            404 => BackendErrorKind::NotFound,
            400 | 422 => BackendErrorKind::InvalidRequest,
            429 => BackendErrorKind::RateLimit,
            500..=599 => BackendErrorKind::ServerError,
            _ => BackendErrorKind::Unknown,
        };
        Self::new(kind, format!("HTTP {status}: {detail}")).with_status(status)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        let error = if err.is_timeout() {
            Self::timeout(format!("Request timed out: {message}"))
        } else if err.is_decode() {
            Self::decode(format!("Invalid response body: {message}"))
        } else if err.is_connect() || err.is_request() {
            Self::network(message)
        } else {
            Self::new(BackendErrorKind::Unknown, message)
        };
        match err.status() {
            Some(status) => error.with_status(status.as_u16()),
            None => error,
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Connection refused, DNS, reset
    Network,
    /// No response within the configured request timeout
    Timeout,
    /// 429
    RateLimit,
    /// 5xx
    ServerError,
    /// 401, 403
    Auth,
    /// 404
    NotFound,
    /// 400, 422
    InvalidRequest,
    /// Body did not match the expected shape
    Decode,
    /// Ack with `success: false`
    Rejected,
    Unknown,
}

impl BackendErrorKind {
    /// Whether the same call may succeed if simply repeated
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimit | Self::ServerError
        )
    }
}

/// FastAPI reports errors as `{"detail": ...}`; fall back to the raw body
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| body.trim().to_string())
}
