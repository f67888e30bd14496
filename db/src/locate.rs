//! Resolving which database file a run operates on.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DatabaseError, Result};

/// Where the operator said the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// A directory holding the conventionally-named database file.
    Directory(PathBuf),
    /// An explicit database file path.
    File(PathBuf),
}

impl DatabaseLocation {
    /// Picks a location from the two optional CLI arguments. An explicit file
    /// wins over a directory.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::MissingLocation`] when both are `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use path_rewrite_db::DatabaseLocation;
    ///
    /// let location = DatabaseLocation::from_args(
    ///     Some(PathBuf::from("Databases")),
    ///     Some(PathBuf::from("other/library.db")),
    /// )
    /// .unwrap();
    /// assert_eq!(location, DatabaseLocation::File(PathBuf::from("other/library.db")));
    ///
    /// assert!(DatabaseLocation::from_args(None, None).is_err());
    /// ```
    pub fn from_args(dir: Option<PathBuf>, file: Option<PathBuf>) -> Result<Self> {
        match (file, dir) {
            (Some(file), _) => Ok(Self::File(file)),
            (None, Some(dir)) => Ok(Self::Directory(dir)),
            (None, None) => Err(DatabaseError::MissingLocation),
        }
    }

    /// Returns the path of an existing database file.
    ///
    /// `database_file` is the file name looked up inside a
    /// [`Directory`](Self::Directory) location.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DatabaseNotFound`] if the path is not an
    /// existing regular file.
    pub fn resolve(&self, database_file: &str) -> Result<PathBuf> {
        let path = match self {
            Self::Directory(dir) => dir.join(database_file),
            Self::File(file) => file.clone(),
        };
        ensure_file(&path)?;
        debug!(path = %path.display(), "Resolved database file");
        Ok(path)
    }
}

fn ensure_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DatabaseError::DatabaseNotFound(path.to_path_buf()))
    }
}
