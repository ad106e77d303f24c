//! Error types for the control-plane client

use std::path::PathBuf;

use thiserror::Error;
use vmforge_core::domain::object::ObjectRef;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the control plane
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The control plane rejected the call
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse a response body
    #[error("failed to parse response: {0}")]
    ParseError(String),

    /// A disk import ended with the disk only partially created.
    ///
    /// The reference points at the orphan the caller should delete.
    #[error("disk import did not complete: {message}")]
    ImportIncomplete { disk: ObjectRef, message: String },

    /// The local image file could not be read for upload
    #[error("failed to read local image {path}: {source}")]
    LocalRead {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Whether retrying the call may succeed.
    ///
    /// Connection and timeout failures plus 5xx/429 responses are
    /// transient; everything else is a permanent rejection.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(e) => e.is_timeout() || e.is_connect(),
            Self::ApiError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Check if this error is a client-side rejection (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        assert!(ClientError::api_error(503, "busy").is_transient());
        assert!(ClientError::api_error(429, "slow down").is_transient());
    }

    #[test]
    fn client_rejections_are_permanent() {
        let err = ClientError::api_error(404, "no such sr");
        assert!(!err.is_transient());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
    }

    #[test]
    fn import_incomplete_is_permanent() {
        let err = ClientError::ImportIncomplete {
            disk: ObjectRef::new("vdi-1"),
            message: "connection reset during upload".to_string(),
        };
        assert!(!err.is_transient());
    }
}
