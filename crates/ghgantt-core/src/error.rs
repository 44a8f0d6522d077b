//! Error types for the synchronization library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors of pull, push, view and validate runs.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The working file holds invalid data; every problem is listed
    #[error("{0}")]
    Validation(ValidationErrors),

    /// Network or authentication failure; fatal to the whole run
    #[error("Transport error: {0}")]
    Transport(RemoteError),

    /// Non-transport failure while reading the remote snapshot
    #[error("Remote error: {0}")]
    Remote(RemoteError),

    /// Reading or writing a local file failed
    #[error("Cannot access '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed YAML in a working file or configuration file
    #[error("YAML error in '{path}': {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// Spreadsheet could not be read or written
    #[error("Spreadsheet error in '{path}': {message}")]
    Spreadsheet { path: PathBuf, message: String },

    /// A setting or argument is out of range
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Missing configuration, token or runtime setup
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Failure reported by the remote gateway for a single call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Connectivity or authentication problem
    #[error("{0}")]
    Transport(String),

    /// The addressed issue, project or item does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The Project lacks a field the operation needs
    #[error("project field '{0}' is missing")]
    FieldMissing(String),

    /// The remote throttled the request
    #[error("rate limited{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<u64> },

    /// The remote refused the request
    #[error("rejected: {0}")]
    Rejected(String),
}

fn retry_hint(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(seconds) => format!(", retry after {seconds}s"),
        None => String::new(),
    }
}

impl RemoteError {
    /// Whether the failure affects every call rather than a single operation.
    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Transport(_))
    }
}

impl From<RemoteError> for SyncError {
    fn from(error: RemoteError) -> Self {
        if error.is_transport() {
            SyncError::Transport(error)
        } else {
            SyncError::Remote(error)
        }
    }
}

impl From<ValidationErrors> for SyncError {
    fn from(errors: ValidationErrors) -> Self {
        SyncError::Validation(errors)
    }
}

/// Names the offending field of an [`SyncError::InvalidInput`].
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn with_reason(self, reason: impl Into<String>) -> SyncError {
        SyncError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl SyncError {
    /// `SyncError::invalid_input("repo").with_reason("expected 'owner/name'")`
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Wraps an I/O error with the path it happened at.
    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::FileSystem {
            path: path.into(),
            source,
        }
    }

    pub fn spreadsheet(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        SyncError::Spreadsheet {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether the run failed because the remote could not be reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }
}

/// Extension trait attaching a path to I/O results.
pub trait IoResultExt<T> {
    fn at_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn at_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| SyncError::file_system(path, source))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_routes_by_kind() {
        let transport: SyncError = RemoteError::Transport("connection reset".into()).into();
        assert!(transport.is_transport());

        let semantic: SyncError = RemoteError::NotFound("project 3".into()).into();
        assert!(matches!(semantic, SyncError::Remote(_)));
    }

    #[test]
    fn test_rate_limit_message_carries_hint() {
        let error = RemoteError::RateLimited {
            retry_after: Some(30),
        };
        assert_eq!(error.to_string(), "rate limited, retry after 30s");
        assert_eq!(
            RemoteError::RateLimited { retry_after: None }.to_string(),
            "rate limited"
        );
    }

    #[test]
    fn test_invalid_input_builder() {
        let error = SyncError::invalid_input("repo").with_reason("expected owner/name");
        assert_eq!(
            error.to_string(),
            "Invalid repo: expected owner/name"
        );
    }
}
