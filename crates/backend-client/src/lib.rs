//! Backend client library
//!
//! This crate provides typed access to the hosted backend the app delegates to:
//! authentication, document storage, file storage and federated (Google) login.
//! Each concern is a trait so the rest of the workspace can run against the
//! REST implementation or the in-memory one.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod documents;
pub mod federated;
pub mod files;
pub mod memory;
pub mod rest;
pub mod types;

pub use auth::{AuthBackend, AuthStateCallback};
pub use documents::DocumentStore;
pub use federated::{FederatedLogin, FederatedOutcome, GoogleAuthConfig};
pub use files::{avatar_path, FileStorage};
pub use memory::{FederatedScript, MemoryBackend};
pub use rest::{RestClient, RestClientConfig};
pub use types::{Credential, Fields, Persistence, Uid, UserDocument, USERS_COLLECTION};

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes reported by the backend
///
/// Wire codes look like `auth/operation-not-allowed` or `not-found`; anything
/// unrecognized is kept verbatim in [`ErrorCode::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// The requested sign-in method is disabled for this project
    OperationNotAllowed,
    /// The referenced document or file does not exist
    NotFound,
    /// The caller is not allowed to perform the operation
    PermissionDenied,
    /// The backend is temporarily unreachable
    Unavailable,
    /// Any other code
    Other(String),
}

impl ErrorCode {
    /// Parse a wire error code
    pub fn parse(code: &str) -> Self {
        match code {
            "auth/operation-not-allowed" => ErrorCode::OperationNotAllowed,
            "not-found" | "storage/object-not-found" => ErrorCode::NotFound,
            "permission-denied" | "storage/unauthorized" => ErrorCode::PermissionDenied,
            "unavailable" | "auth/network-request-failed" => ErrorCode::Unavailable,
            other => ErrorCode::Other(other.to_string()),
        }
    }

    /// Wire representation of this code
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::OperationNotAllowed => "auth/operation-not-allowed",
            ErrorCode::NotFound => "not-found",
            ErrorCode::PermissionDenied => "permission-denied",
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::Other(code) => code,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for backend operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reported by the backend
    #[error("API error ({status}) {code}: {message}")]
    Api {
        /// HTTP status code (0 for non-HTTP backends)
        status: u16,
        /// Backend error code
        code: ErrorCode,
        /// Error message from the backend
        message: String,
    },

    /// A payload from the backend is missing required fields or has the wrong shape
    #[error("Malformed document {id}: {reason}")]
    MalformedDocument {
        /// Document id
        id: String,
        /// What was wrong with it
        reason: String,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create an API error without an HTTP status
    pub fn api(code: ErrorCode, message: impl Into<String>) -> Self {
        Error::Api { status: 0, code, message: message.into() }
    }

    /// The backend error code, if this is an API error
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            Error::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether this error reports that anonymous sign-in is disabled
    pub fn is_operation_not_allowed(&self) -> bool {
        matches!(self.code(), Some(ErrorCode::OperationNotAllowed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_parse() {
        assert_eq!(
            ErrorCode::parse("auth/operation-not-allowed"),
            ErrorCode::OperationNotAllowed
        );
        assert_eq!(ErrorCode::parse("not-found"), ErrorCode::NotFound);
        assert_eq!(
            ErrorCode::parse("auth/weird"),
            ErrorCode::Other("auth/weird".to_string())
        );
        assert_eq!(ErrorCode::parse("auth/weird").as_str(), "auth/weird");
    }

    #[test]
    fn test_error_types() {
        let err = Error::InvalidInput("test".to_string());
        assert!(err.to_string().contains("Invalid input"));

        let err = Error::api(ErrorCode::OperationNotAllowed, "disabled");
        assert!(err.is_operation_not_allowed());
        assert!(err.to_string().contains("auth/operation-not-allowed"));
    }
}
