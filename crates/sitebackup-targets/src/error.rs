//! Storage error taxonomy

use std::fmt;
use thiserror::Error;

/// Broad class of a storage failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorKind {
    /// Credentials missing or rejected
    Authentication,
    /// Endpoint unreachable, DNS failure or timeout
    Connectivity,
    /// TLS handshake or certificate failure
    Tls,
    /// Any other error answered by the service
    Api,
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageErrorKind::Authentication => "authentication",
            StorageErrorKind::Connectivity => "connectivity",
            StorageErrorKind::Tls => "TLS",
            StorageErrorKind::Api => "API",
        };
        f.write_str(name)
    }
}

/// Failure of a storage operation; never retried internally
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Storage {kind} error during {operation}: {message}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub operation: String,
    pub message: String,
}

impl StorageError {
    pub fn new(
        kind: StorageErrorKind,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn api(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Api, operation, message)
    }

    pub fn authentication(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Authentication, operation, message)
    }

    pub fn connectivity(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Connectivity, operation, message)
    }

    pub fn tls(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Tls, operation, message)
    }

    /// Local I/O failure while preparing a transfer
    pub fn io(operation: impl Into<String>, err: &std::io::Error) -> Self {
        Self::api(operation, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = StorageError::authentication("list_objects_v2", "InvalidAccessKeyId");
        assert_eq!(
            err.to_string(),
            "Storage authentication error during list_objects_v2: InvalidAccessKeyId"
        );
        assert_eq!(err.kind, StorageErrorKind::Authentication);
    }
}
