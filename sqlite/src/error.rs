//! Error types for the rewrite engine.
//!
//! Only failures that end a run early surface here. Problems confined to a
//! single table or column are reported as [`Step::Skipped`] and recorded in
//! the run result instead.
//!
//! [`Step::Skipped`]: path_rewrite_core::Step::Skipped

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a rewrite run.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// SQLite failure outside any per-column operation (open, begin, commit, catalog read).
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Copying the database for a dry-run preview failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The database file does not exist. The engine never creates one.
    #[error("database file not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),
}

/// Convenience alias for results with [`RewriteError`].
pub type Result<T> = std::result::Result<T, RewriteError>;
