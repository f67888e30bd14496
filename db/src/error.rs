//! Error types for database file operations.
//!
//! Covers everything that happens to the database *file* outside the
//! rewrite transaction: locating it, loading configuration, and backing it
//! up.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while locating, configuring, or backing up a database file.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Neither a database directory nor a database file was given.
    #[error("provide --db-dir or --db-file")]
    MissingLocation,

    /// The resolved database path does not exist or is not a file.
    #[error("could not find {}", .0.display())]
    DatabaseNotFound(PathBuf),

    /// A backup copy does not match its source.
    #[error("backup verification failed for {}: {reason}", .path.display())]
    BackupVerification { path: PathBuf, reason: String },

    /// Configuration is syntactically valid but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
