//! Central error types for capcheck.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic
//! `Display` and `From` implementations. Two layers are distinguished:
//! [`CapError`] for conditions that are fatal for a run or a file, and
//! [`ResolveError`] for per-call resolution outcomes that are swallowed
//! (after logging) without aborting analysis of the rest of the file.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum CapError {
    /// IO operation failed (without path context - prefer IoWithPath when path is available)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IO operation failed with path context for better error messages
    #[error("IO error at {path}: {error}")]
    IoWithPath {
        error: std::io::Error,
        path: PathBuf,
    },

    /// Failed to parse a Go source file
    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Tree-sitter grammar/runtime error
    #[error("tree-sitter error: {0}")]
    TreeSitter(String),

    /// Unknown log level given on the command line. Fatal at startup,
    /// before any analysis runs.
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Convenience type alias for Results using CapError.
pub type Result<T> = std::result::Result<T, CapError>;

impl CapError {
    /// Create an IO error with path context.
    ///
    /// Use this when reading files so the message names the path that failed.
    #[inline]
    pub fn io_with_path(error: std::io::Error, path: impl AsRef<Path>) -> Self {
        CapError::IoWithPath {
            error,
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Outcome of resolving one receiver chain or type chain.
///
/// None of these abort analysis: the affected call is dropped and the walk
/// continues with the next one. `Skip` is an intentional abstention for
/// receiver shapes the analysis does not cover (indexing, call results) and
/// is not logged as an error.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// The oracle has no selection information for the selector.
    #[error("no type information for selector")]
    NoTypeInfo,

    /// A selector target was neither an identifier nor a further chain.
    #[error("unexpected expression kind {0} for selector target")]
    UnexpectedExpr(String),

    /// Receiver shape deliberately not analyzed (documented limitation).
    #[error("receiver shape not analyzed: {0}")]
    Skip(&'static str),
}

impl ResolveError {
    /// True for the intentional-abstention case.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, ResolveError::Skip(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_classification() {
        assert!(ResolveError::Skip("indexed receiver").is_skip());
        assert!(!ResolveError::NoTypeInfo.is_skip());
        assert!(!ResolveError::UnexpectedExpr("binary_expression".into()).is_skip());
    }

    #[test]
    fn test_io_with_path_mentions_path() {
        let err = CapError::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "/tmp/x.go",
        );
        assert!(err.to_string().contains("/tmp/x.go"));
    }
}
