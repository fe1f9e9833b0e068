//! Error types shared by the reader, the aggregators and the cache writer.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for rollup operations
pub type Result<T> = std::result::Result<T, RollupError>;

/// The kind of input file a directory is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Logs,
    Grades,
    Cache,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Logs => write!(f, "logs"),
            InputKind::Grades => write!(f, "grades"),
            InputKind::Cache => write!(f, "input"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RollupError {
    /// An expected spreadsheet or cache file does not exist
    #[error("missing {kind} file: {}", path.display())]
    MissingInput { kind: InputKind, path: PathBuf },

    /// A required header is absent from a spreadsheet
    #[error("column '{column}' not found in {}", path.display())]
    MissingColumn { column: String, path: PathBuf },

    /// None of the configured final-grade columns is present
    #[error("no grade column (expected one of {expected:?}) in {}", path.display())]
    MissingGradeColumn { expected: Vec<String>, path: PathBuf },

    #[error("no worksheet with data in {}", path.display())]
    EmptySheet { path: PathBuf },

    #[error("failed to read spreadsheet {}: {source}", path.display())]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// A cache file exists but does not have the expected layout
    #[error("malformed cache file {}: {reason}", path.display())]
    MalformedCache { path: PathBuf, reason: String },

    /// A module or course directory holds nothing to aggregate
    #[error("no subdirectories in {}", path.display())]
    NoSubdirectories { path: PathBuf },

    /// The course pre-check found a missing input; nothing was written
    #[error("course check failed for {}: {missing}", path.display())]
    CheckFailed {
        path: PathBuf,
        #[source]
        missing: Box<RollupError>,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to persist cache file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl RollupError {
    pub fn missing(kind: InputKind, path: impl Into<PathBuf>) -> Self {
        Self::MissingInput {
            kind,
            path: path.into(),
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedCache {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` when the error only signals an absent input file.
    pub fn is_missing_input(&self) -> bool {
        matches!(self, RollupError::MissingInput { .. })
    }
}
