//! Shared error types for the collaborators around the analysis core.
//!
//! The analysis core itself never fails: malformed records, empty inputs and
//! unclassifiable content all produce well-typed (possibly empty) results.
//! Everything that touches the network or the file system reports through
//! [`Error`] instead, and commands wrap it with `anyhow` context.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for caseforge I/O and service operations
#[derive(Debug, Error)]
pub enum Error {
    /// File system related errors
    #[error("File system error: {message}")]
    FileSystem {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A remote service answered with a non-success status
    #[error("{service} API error ({status}): {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// A requested remote entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport-level HTTP errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Glob pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

impl Error {
    /// Create a file system error with path context
    pub fn file_system(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: Some(path.into()),
            source: None,
        }
    }

    /// Wrap an `std::io::Error` with the path it concerns
    pub fn io_at(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::FileSystem {
            message: format!("{}: {}", path.display(), source),
            path: Some(path),
            source: Some(source),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether the error came from the remote side rather than from us
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Http(_) | Self::NotFound(_))
    }
}

/// Result type alias using our error
pub type Result<T> = std::result::Result<T, Error>;
