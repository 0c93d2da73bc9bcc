//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// This enum encapsulates all possible errors that can occur during
/// core operations like searching, tree loading, spreadsheet parsing and export.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// Represents an error that occurred when a Tokio task was joined.
    /// This is often due to a task panicking or being cancelled.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Represents an error while building the exclude pattern matcher.
    #[error("Invalid exclude pattern: {0}")]
    Pattern(#[from] ignore::Error),

    /// The spreadsheet could not be opened or read.
    #[error("Failed to read spreadsheet {1}: {0}")]
    Spreadsheet(String, PathBuf),

    /// A CSV file could not be parsed.
    #[error("Failed to read CSV file: {0}")]
    Csv(#[from] csv::Error),

    /// The spreadsheet header row lacks one or more required columns.
    #[error("Spreadsheet is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A user supplied file or folder name is not usable.
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// The target of a create/rename operation already exists.
    #[error("Path already exists: {0}")]
    AlreadyExists(PathBuf),

    /// The path an operation refers to does not exist.
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    /// Represents a user-initiated cancellation of an operation.
    #[error("Operation was cancelled by the user")]
    Cancelled,
}

impl CoreError {
    /// Wraps an `io::Error` together with the path it concerns.
    pub fn io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        CoreError::Io(err, path.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
