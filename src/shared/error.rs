//! Shared Error Types
//!
//! Failure taxonomy for the synchronization engine. These errors never cross
//! the boundary of the remote client, the connectivity probe or the local
//! store: each of those converts them to a neutral value (`false`, an empty
//! list, an absent key) and logs the cause.
//!
//! # Error Categories
//!
//! - `Timeout` - a network call exceeded its bound
//! - `NetworkFailure` - connection refused, DNS, non-success status
//! - `MalformedResponse` - payload is not a list or misses required fields
//! - `SerializationFailure` - local JSON encode/decode failed
//! - `Storage` - local persistence read/write failed
//!
//! # Usage
//!
//! ```rust
//! use nutrisync::shared::error::SyncError;
//!
//! let error = SyncError::malformed("/online-users", "expected a JSON array");
//! assert!(error.to_string().contains("/online-users"));
//! ```
use thiserror::Error;

/// Errors produced inside the sync engine's I/O boundaries
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Network call did not complete within its bound
    #[error("Timeout after {millis} ms: {operation}")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Configured bound in milliseconds
        millis: u128,
    },

    /// Connection refused, DNS failure, or non-success status
    #[error("Network failure: {message}")]
    NetworkFailure {
        /// Human-readable error message
        message: String,
    },

    /// Response body was not the expected shape
    #[error("Malformed response from {endpoint}: {message}")]
    MalformedResponse {
        /// Endpoint that produced the payload
        endpoint: String,
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationFailure {
        /// Human-readable error message
        message: String,
    },

    /// Local persistence error
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error message
        message: String,
    },
}

impl SyncError {
    /// Create a new timeout error
    pub fn timeout(operation: impl Into<String>, bound: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            millis: bound.as_millis(),
        }
    }

    /// Create a new network failure
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            message: message.into(),
        }
    }

    /// Create a new malformed-response error
    pub fn malformed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationFailure {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Whether this error came from exceeding a time bound
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                operation: err
                    .url()
                    .map(|url| url.path().to_string())
                    .unwrap_or_else(|| "request".to_string()),
                millis: 0,
            };
        }
        if err.is_decode() {
            let endpoint = err
                .url()
                .map(|url| url.path().to_string())
                .unwrap_or_default();
            return Self::malformed(endpoint, err.to_string());
        }
        Self::network(err.to_string())
    }
}

/// Result alias for engine-internal fallible operations
pub type SyncResult<T> = Result<T, SyncError>;
