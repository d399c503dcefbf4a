//! Error types and result aliases for miso operations.
//!
//! Provides a unified error type covering storage access and configuration
//! failures. Registry handlers never classify storage errors further: every
//! storage variant is surfaced to the HTTP layer as-is.

use std::fmt;
use thiserror::Error;

/// Object-store operation that produced an [`MisoError::ObjectAccess`] error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOperation {
    List,
    Read,
    Write,
    Delete,
    Sign,
}

impl fmt::Display for StorageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            StorageOperation::List => "list",
            StorageOperation::Read => "read",
            StorageOperation::Write => "write",
            StorageOperation::Delete => "delete",
            StorageOperation::Sign => "sign",
        };
        f.write_str(verb)
    }
}

/// Unified error type for all miso operations
#[derive(Error, Debug)]
pub enum MisoError {
    // Storage errors
    #[error("Object storage unavailable: {message}")]
    StorageUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to {operation} '{key}': {message}")]
    ObjectAccess {
        operation: StorageOperation,
        key: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Config errors
    #[error("Failed to parse {path}: {message}")]
    TomlParse { path: String, message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("No config.toml found in any of: {searched}")]
    ConfigNotFound { searched: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for miso operations
pub type MisoResult<T> = Result<T, MisoError>;

impl MisoError {
    /// Create a storage-unavailable error from any transport error
    pub fn storage_unavailable<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StorageUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an object-access error carrying the failing key
    pub fn object_access<E>(
        operation: StorageOperation,
        key: impl Into<String>,
        message: impl Into<String>,
        source: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ObjectAccess {
            operation,
            key: key.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error for a configuration field
    pub fn config_validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error came from the object store
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            MisoError::StorageUnavailable { .. } | MisoError::ObjectAccess { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            MisoError::StorageUnavailable { .. } => {
                Some("Check the S3 endpoint, region and credentials")
            }
            MisoError::ConfigNotFound { .. } => {
                Some("Create config/config.toml or pass --config-dir")
            }
            MisoError::ConfigValidation { .. } | MisoError::TomlParse { .. } => {
                Some("Fix the configuration file or the MISO_* environment overrides")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_access_message_names_key() {
        let err = MisoError::object_access(
            StorageOperation::Sign,
            "modules/ns/m/p/1.0.0/module.zip",
            "credentials expired",
            std::io::Error::new(std::io::ErrorKind::Other, "expired"),
        );

        assert_eq!(
            err.to_string(),
            "Failed to sign 'modules/ns/m/p/1.0.0/module.zip': credentials expired"
        );
        assert!(err.is_storage());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_errors_are_not_storage_errors() {
        let err = MisoError::config_validation("s3.bucket", "must not be empty");
        assert!(!err.is_storage());
        assert!(err.suggestion().is_some());
    }
}
