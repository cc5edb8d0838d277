//! Error types for smatch.

use thiserror::Error;

/// Result alias for smatch operations.
pub type SmatchResult<T> = std::result::Result<T, SmatchError>;

/// Errors that can occur when running smatch operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SmatchError {
    /// `nside` was zero, a catalog was empty, or two parallel arrays disagreed in length.
    #[error("bad input: {reason}")]
    BadInput { reason: String },
    /// Parallel arrays had mismatched lengths.
    #[error("size mismatch: {context} expected len={expected} got={got}")]
    SizeMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    /// A primary catalog was constructed from zero points.
    #[error("empty catalog: a primary catalog must contain at least one point")]
    EmptyCatalog,
    /// A non-finite value was encountered while converting a coordinate.
    #[error("bad coordinate: {context} ra={ra} dec={dec}")]
    BadCoordinate {
        context: &'static str,
        ra: f64,
        dec: f64,
    },
    /// Reading, writing, or opening a match file failed.
    #[error("io error: {context}: {reason}")]
    IoError { context: String, reason: String },
    /// A line in a loaded match file had fewer than three whitespace-separated fields.
    #[error("parse error at line {line}: {reason}")]
    ParseError { line: usize, reason: String },
}

impl SmatchError {
    pub(crate) fn io(context: impl Into<String>, err: std::io::Error) -> Self {
        SmatchError::IoError {
            context: context.into(),
            reason: err.to_string(),
        }
    }
}
