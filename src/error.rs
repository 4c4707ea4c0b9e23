//! Error types for the HGS engine.
//!
//! Two families of failures exist:
//!
//! - **Recoverable** input problems (unreadable files, malformed solution
//!   files, inconsistent instance data, invalid configuration). They are
//!   returned to the caller, which reports them and carries on.
//! - **Invariant violations**: logic errors inside the population engine
//!   (e.g. evicting the last member of a subpopulation). These abort the
//!   current run and are never retried.

use thiserror::Error;

/// Result type alias for HGS operations.
pub type HgsResult<T> = Result<T, HgsError>;

/// Unified error type for the HGS engine.
#[derive(Debug, Error)]
pub enum HgsError {
    // ===== Input Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed solution file.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number of the offending line.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// Search-progress export failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid algorithm parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Inconsistent instance data (matrix shape, demands, capacity).
    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    // ===== Fatal Errors =====
    /// Internal invariant broken; the run cannot continue.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl HgsError {
    /// Returns `true` for errors that indicate a bug in the engine.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HgsError::InvariantViolation(_))
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        HgsError::Parse {
            line,
            message: message.into(),
        }
    }
}
