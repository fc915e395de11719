//! Domain Errors
//!
//! Every failure coming back from the identity service or the row store
//! ends up as a [`DomainError`].

use thiserror::Error;

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Network-or-service failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Network(String),
    /// The service answered with a non-success status
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },
    /// The response body did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Not authenticated")]
    NotAuthenticated,
    /// Session persistence failed (browser storage unavailable or full)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        DomainError::Service {
            status,
            message: message.into(),
        }
    }

    /// HTTP status for service errors
    pub fn status(&self) -> Option<u16> {
        match self {
            DomainError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DomainError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DomainError::Decode(err.to_string())
        } else {
            DomainError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for DomainError {
    fn from(err: url::ParseError) -> Self {
        DomainError::InvalidConfig(err.to_string())
    }
}
