//! Global error types for the life assistant.
//!
//! All error categories across the workspace are unified into a single
//! `LaError` enum with conversions from underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using LaError.
pub type LaResult<T> = Result<T, LaError>;

/// Unified error type covering all error categories.
#[derive(Error, Debug)]
pub enum LaError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// One or more required configuration values are missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Database errors --
    /// SQLite database error.
    #[error("database error: {0}")]
    Database(String),

    /// Database migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// Database connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Database integrity check failed.
    #[error("database integrity check failed: {0}")]
    IntegrityCheck(String),

    // -- Network errors --
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(String),

    /// HTTP request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Remote API returned an error response.
    #[error("server error (status {status}): {message}")]
    ServerError {
        /// HTTP status code (or API error code).
        status: u16,
        /// Error description from the remote side.
        message: String,
    },

    /// Authentication with a remote API failed.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    // -- Domain errors --
    /// User input was rejected.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A value could not be parsed (dates, amounts, API payloads).
    #[error("parse error: {0}")]
    Parse(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Service errors --
    /// A service failed to initialize.
    #[error("service init error: {0}")]
    ServiceInit(String),

    /// A service operation failed.
    #[error("service error: {0}")]
    Service(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for LaError {
    fn from(e: serde_json::Error) -> Self {
        LaError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for LaError {
    fn from(e: toml::de::Error) -> Self {
        LaError::Config(e.to_string())
    }
}

impl LaError {
    /// Whether the error was caused by bad user input rather than a fault.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            LaError::Validation(_) | LaError::NotFound(_) | LaError::Parse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_la_error_display() {
        let err = LaError::Config("bad value".to_string());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn test_server_error_display() {
        let err = LaError::ServerError {
            status: 400,
            message: "chat not found".into(),
        };
        assert_eq!(err.to_string(), "server error (status 400): chat not found");
    }

    #[test]
    fn test_user_error_classification() {
        assert!(LaError::Validation("amount".into()).is_user_error());
        assert!(LaError::NotFound("reminder 3".into()).is_user_error());
        assert!(!LaError::Database("locked".into()).is_user_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: LaError = e.into();
        assert!(matches!(err, LaError::Serialization(_)));
    }
}
