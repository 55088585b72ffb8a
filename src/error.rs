//! Centralized error types for smsmime.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the smsmime library.
///
/// Row-level data problems never show up here: unattributable rows are
/// skipped and malformed fields degrade. These variants cover the files
/// and services around the conversion core.
#[derive(Error, Debug)]
pub enum SmsMimeError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The row dump could not be decoded.
    #[error("Invalid message rows in '{path}': {reason}")]
    InvalidRows { path: PathBuf, reason: String },

    /// The contact directory file could not be decoded.
    #[error("Invalid contact directory '{path}': {reason}")]
    InvalidDirectory { path: PathBuf, reason: String },

    /// A directory lookup failed. Callers in the core treat this as "no match".
    #[error("Directory lookup failed: {0}")]
    Directory(String),
}

/// Convenience alias for `Result<T, SmsMimeError>`.
pub type Result<T> = std::result::Result<T, SmsMimeError>;

impl SmsMimeError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `SmsMimeError::io`).
impl From<std::io::Error> for SmsMimeError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
