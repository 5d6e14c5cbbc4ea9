//! Error types for gateway operations.
//!
//! Every call to the estate API can fail at the transport level, return a body
//! that does not decode, or be misconfigured. Errors carry a structured
//! [`ErrorContext`] so logs show which endpoint and operation failed.

use std::fmt;

use serde_json::Value;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Fallback shown to operators when a failure carries no usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Unable to process gate pass. Please try again.";

/// Structured context for gateway errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "check_in", "list_visitors")
    pub operation: Option<String>,
    /// Upstream path involved
    pub endpoint: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether this error is retryable
    pub retryable: bool,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the upstream endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Mark this error as retryable.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref endpoint) = self.endpoint {
            parts.push(format!("endpoint={}", endpoint));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for gateway operations
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network failure or non-2xx HTTP response. `body` keeps the decoded JSON
    /// error body, when there was one.
    #[error("Transport error: {message} {context}")]
    Transport {
        message: String,
        status: Option<u16>,
        body: Option<Value>,
        context: ErrorContext,
    },

    /// Response arrived but did not match the expected contract.
    #[error("Decode error: {message} {context}")]
    Decode {
        message: String,
        context: ErrorContext,
    },

    /// Requested entity was not found.
    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// Configuration or initialization error.
    #[error("Configuration error: {message} {context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// Timeout waiting for the upstream.
    #[error("Timeout error: {message} {context}")]
    Timeout {
        message: String,
        context: ErrorContext,
    },

    /// Internal/unexpected errors.
    #[error("Internal error: {message} {context}")]
    Internal {
        message: String,
        context: ErrorContext,
    },
}

impl GatewayError {
    /// Create a transport error from an HTTP status and optional JSON body.
    pub fn transport(message: impl Into<String>, status: Option<u16>, body: Option<Value>) -> Self {
        let context = match status {
            Some(code) if code >= 500 => ErrorContext::default().retryable(),
            None => ErrorContext::default().retryable(),
            _ => ErrorContext::default(),
        };
        Self::Transport {
            message: message.into(),
            status,
            body,
            context,
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    /// HTTP status of the failed call, when there was a response.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Transport { context, .. }
            | Self::Decode { context, .. }
            | Self::NotFound { context, .. }
            | Self::Configuration { context, .. }
            | Self::Timeout { context, .. }
            | Self::Internal { context, .. } => context,
        }
    }

    /// Add or update the operation and endpoint in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>, endpoint: &str) -> Self {
        match &mut self {
            Self::Transport { context, .. }
            | Self::Decode { context, .. }
            | Self::NotFound { context, .. }
            | Self::Configuration { context, .. }
            | Self::Timeout { context, .. }
            | Self::Internal { context, .. } => {
                context.operation = Some(operation.into());
                context.endpoint = Some(endpoint.to_string());
            }
        }
        self
    }

    /// Message to show an operator for this failure.
    ///
    /// Prefers the error body's `detail`, then its `message`, then the generic
    /// fallback. Internal error text is never surfaced.
    pub fn operator_message(&self) -> String {
        let body = match self {
            Self::Transport { body: Some(body), .. } => Some(body),
            _ => None,
        };

        body.and_then(|b| text_field(b, "detail").or_else(|| text_field(b, "message")))
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
    }
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::decode(err.to_string())
    }
}

#[cfg(feature = "http-gateway")]
impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::timeout(err.to_string())
        } else if err.is_decode() {
            GatewayError::decode(err.to_string())
        } else {
            GatewayError::transport(err.to_string(), err.status().map(|s| s.as_u16()), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_message_prefers_detail() {
        let err = GatewayError::transport(
            "400 Bad Request",
            Some(400),
            Some(json!({"detail": "Pass revoked", "message": "Bad request"})),
        );
        assert_eq!(err.operator_message(), "Pass revoked");
    }

    #[test]
    fn test_operator_message_falls_back_to_message() {
        let err = GatewayError::transport("422", Some(422), Some(json!({"message": "Invalid code"})));
        assert_eq!(err.operator_message(), "Invalid code");
    }

    #[test]
    fn test_operator_message_generic_fallback() {
        let err = GatewayError::transport("connection refused", None, None);
        assert_eq!(err.operator_message(), GENERIC_FAILURE_MESSAGE);

        let err = GatewayError::transport("500", Some(500), Some(json!({"detail": "   "})));
        assert_eq!(err.operator_message(), GENERIC_FAILURE_MESSAGE);

        let err = GatewayError::decode("expected value at line 1");
        assert_eq!(err.operator_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_retryable_by_status() {
        assert!(GatewayError::transport("down", Some(503), None).is_retryable());
        assert!(!GatewayError::transport("bad", Some(400), None).is_retryable());
        assert!(GatewayError::timeout("slow").is_retryable());
    }

    #[test]
    fn test_context_display() {
        let err = GatewayError::not_found("no visitor").with_operation("fetch_gate_statuses", "/admin/visitors/v1");
        let text = err.to_string();
        assert!(text.contains("operation=fetch_gate_statuses"));
        assert!(text.contains("endpoint=/admin/visitors/v1"));
        assert_eq!(err.http_status(), Some(404));
    }
}
