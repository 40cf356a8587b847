//! Error types for the HTTP client layer

use crate::types::{RequestDescriptor, ResponseEnvelope};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result type alias for client operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure category, used to decide retry and reporting behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The client configuration is invalid
    Configuration,
    /// The configured client type is not one of the known variants
    UnsupportedClientType,
    /// The request never produced a response (connection, DNS, TLS)
    Transport,
    /// The request exceeded its timeout
    Timeout,
    /// The server answered with a non-2xx status
    Status,
    /// A request interceptor rejected the request
    Interceptor,
    /// The response body could not be decoded into the requested type
    Decode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::UnsupportedClientType => "unsupported client type",
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Status => "status",
            Self::Interceptor => "interceptor",
            Self::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// Machine-readable error code, either textual or numeric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    /// Numeric code
    Numeric(i64),
    /// Textual code such as `ECONNABORTED`
    Text(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(code) => write!(f, "{code}"),
            Self::Text(code) => f.write_str(code),
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        Self::Text(code.to_string())
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        Self::Numeric(code)
    }
}

/// Error returned in place of a [`ResponseEnvelope`] when a call fails
///
/// Keeps the originating request, and the received response when the failure
/// came from a non-2xx status, for diagnostics.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ApiError {
    /// Failure category
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// Optional error code
    pub code: Option<ErrorCode>,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// The received response, when the failure came from one
    pub response: Option<Box<ResponseEnvelope<Value>>>,
    /// The request that failed
    pub request: Option<Box<RequestDescriptor>>,
    /// Underlying error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ApiError {
    /// Create a new error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            status: None,
            response: None,
            request: None,
            source: None,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an unsupported client type error
    pub fn unsupported_client_type(client_type: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedClientType,
            format!("Unsupported HTTP client type: {client_type}"),
        )
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message).with_code("ERR_NETWORK")
    }

    /// Create a timeout error
    pub fn timeout(timeout: std::time::Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("timeout of {}ms exceeded", timeout.as_millis()),
        )
        .with_code("ECONNABORTED")
    }

    /// Create an error for a received non-2xx response
    pub fn status(response: ResponseEnvelope<Value>) -> Self {
        let status = response.status();
        let code = if status >= 500 {
            "ERR_BAD_RESPONSE"
        } else {
            "ERR_BAD_REQUEST"
        };
        let mut error = Self::new(
            ErrorKind::Status,
            format!("Request failed with status code {status}"),
        )
        .with_code(code);
        error.status = Some(status);
        error.response = Some(Box::new(response));
        error
    }

    /// Create an interceptor rejection error
    pub fn interceptor(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Interceptor, message)
    }

    /// Create a decode error
    pub fn decode(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Decode, format!("Failed to decode response body: {err}"))
            .with_source(err)
    }

    /// Attach an error code
    #[must_use]
    pub fn with_code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach the originating request
    #[must_use]
    pub fn with_request(mut self, request: RequestDescriptor) -> Self {
        self.request = Some(Box::new(request));
        self
    }

    /// Attach a source error
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Check if this error is worth another attempt
    ///
    /// Every dispatch failure is, non-2xx responses included; failures raised
    /// before or after dispatch are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Transport | ErrorKind::Timeout | ErrorKind::Status => true,
            ErrorKind::Configuration
            | ErrorKind::UnsupportedClientType
            | ErrorKind::Interceptor
            | ErrorKind::Decode => false,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_some_and(|s| (400..500).contains(&s))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_some_and(|s| s >= 500)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_builder() {
            ErrorKind::Configuration
        } else {
            ErrorKind::Transport
        };
        let code = match kind {
            ErrorKind::Timeout => "ECONNABORTED",
            ErrorKind::Configuration => "ERR_BAD_OPTION",
            _ => "ERR_NETWORK",
        };
        Self::new(kind, err.to_string()).with_code(code).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Headers;
    use std::time::Duration;

    fn envelope(status: u16) -> ResponseEnvelope<Value> {
        ResponseEnvelope::new(Value::Null, status, "", Headers::new())
    }

    #[test]
    fn test_status_error_keeps_response() {
        let err = ApiError::status(envelope(404));
        assert_eq!(err.kind, ErrorKind::Status);
        assert_eq!(err.status, Some(404));
        assert_eq!(err.code, Some(ErrorCode::from("ERR_BAD_REQUEST")));
        assert_eq!(err.response.as_ref().map(|r| r.status()), Some(404));
        assert_eq!(err.to_string(), "Request failed with status code 404");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::status(envelope(503)).is_retryable());
        assert!(ApiError::status(envelope(429)).is_retryable());
        assert!(ApiError::status(envelope(404)).is_retryable());
        assert!(ApiError::status(envelope(400)).is_retryable());
        assert!(ApiError::timeout(Duration::from_millis(10)).is_retryable());
        assert!(ApiError::transport("connection refused").is_retryable());
        assert!(!ApiError::interceptor("no token").is_retryable());
        assert!(!ApiError::configuration("bad header").is_retryable());
        assert!(!ApiError::unsupported_client_type("Axios").is_retryable());
        let decode = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        assert!(!ApiError::decode(decode).is_retryable());
    }

    #[test]
    fn test_client_and_server_error() {
        assert!(ApiError::status(envelope(401)).is_client_error());
        assert!(ApiError::status(envelope(502)).is_server_error());
        assert!(!ApiError::transport("reset").is_server_error());
    }

    #[test]
    fn test_error_code_forms() {
        assert_eq!(ErrorCode::from(42_i64).to_string(), "42");
        assert_eq!(
            serde_json::to_value(ErrorCode::from("ECONNABORTED")).unwrap(),
            serde_json::json!("ECONNABORTED")
        );
    }
}
