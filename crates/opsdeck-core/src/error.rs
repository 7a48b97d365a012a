//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure error types organized by layer
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Signal handler error: {message}")]
    Signal { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    // ─────────────────────────────────────────────────────────────
    // Operation Errors
    // ─────────────────────────────────────────────────────────────
    #[error(transparent)]
    Operation(#[from] OperationError),
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn signal(message: impl Into<String>) -> Self {
        Self::Signal {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Operation(_) | Error::ChannelSend { .. } | Error::Signal { .. }
        )
    }

    /// Check if this error should trigger application exit
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::LoggingInit(_) | Error::ConfigInvalid { .. } | Error::ChannelClosed
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Operation Errors
// ─────────────────────────────────────────────────────────────────

/// Failure of a single operator-issued request.
///
/// Cloneable so it can travel inside TEA messages. The `Display` text is the
/// operator-facing message stored in `OperationState::last_error`. None of
/// these are retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// Local precondition failed; the backend was never contacted.
    #[error("{message}")]
    Validation { message: String },

    /// No response was obtained (connect, DNS, TLS, or read failure).
    #[error("Network error: {message}")]
    Network { message: String },

    /// A response arrived with a status outside 2xx.
    #[error("HTTP error! status: {code}")]
    HttpStatus { code: u16 },

    /// A 2xx response whose body did not match the expected shape.
    #[error("Unexpected response from backend: {message}")]
    Protocol { message: String },
}

impl OperationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// True when the failure happened before any network call.
    pub fn is_local(&self) -> bool {
        matches!(self, OperationError::Validation { .. })
    }

    /// Short machine-readable category, used in headless output.
    pub fn category(&self) -> &'static str {
        match self {
            OperationError::Validation { .. } => "validation",
            OperationError::Network { .. } => "network",
            OperationError::HttpStatus { .. } => "http_status",
            OperationError::Protocol { .. } => "protocol",
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::config("missing [backend] section");
        assert_eq!(
            err.to_string(),
            "Configuration error: missing [backend] section"
        );

        let err = Error::ChannelClosed;
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(Error::ChannelClosed.is_fatal());
        assert!(Error::config_invalid("bad url").is_fatal());
        assert!(!Error::channel_send("test").is_fatal());
    }

    #[test]
    fn test_operation_errors_are_recoverable_not_fatal() {
        let err: Error = OperationError::HttpStatus { code: 500 }.into();
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_operation_error_messages() {
        assert_eq!(
            OperationError::HttpStatus { code: 502 }.to_string(),
            "HTTP error! status: 502"
        );
        assert_eq!(
            OperationError::validation("Please enter a command").to_string(),
            "Please enter a command"
        );
        assert!(OperationError::network("connection refused")
            .to_string()
            .contains("connection refused"));
    }

    #[test]
    fn test_only_validation_is_local() {
        assert!(OperationError::validation("x").is_local());
        assert!(!OperationError::network("x").is_local());
        assert!(!OperationError::HttpStatus { code: 404 }.is_local());
        assert!(!OperationError::protocol("x").is_local());
    }

    #[test]
    fn test_operation_error_categories_are_distinct() {
        let categories = [
            OperationError::validation("a").category(),
            OperationError::network("b").category(),
            OperationError::HttpStatus { code: 500 }.category(),
            OperationError::protocol("c").category(),
        ];
        for (i, a) in categories.iter().enumerate() {
            for b in categories.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
