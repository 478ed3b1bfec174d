use core::fmt;
use std::path::PathBuf;

/// Errors surfaced by I/O, configuration and the regularization driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A delimited text record could not be parsed. `line` is 1-based.
    MalformedRecord { line: usize, message: String },
    /// The QP solver reported an infeasible or numerically degenerate
    /// problem; the affected segments keep their pre-pass geometry.
    RegularizationFailed { reason: String },
    /// File-system failure while reading or writing `path`.
    Io { path: PathBuf, message: String },
    /// Invalid or unreadable configuration.
    Config { message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRecord { line, message } => {
                write!(f, "malformed record at line {line}: {message}")
            }
            Self::RegularizationFailed { reason } => {
                write!(f, "regularization failed: {reason}")
            }
            Self::Io { path, message } => {
                write!(f, "i/o error on {}: {message}", path.display())
            }
            Self::Config { message } => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl std::error::Error for Error {}
