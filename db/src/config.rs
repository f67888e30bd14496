//! Rewrite configuration.
//!
//! Defines the YAML-serializable settings that control which database file
//! is targeted inside a directory, where backups go, and which column names
//! are eligible for rewriting.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! database_file: com.plexapp.plugins.library.db
//! backup_dir: backups
//! candidate_columns:
//!   - root_path
//!   - file
//!   - path
//! ```
//!
//! Every field is optional; missing fields take the defaults above.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use path_rewrite_core::ColumnAllowList;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Database file name looked up inside `--db-dir`.
pub const DEFAULT_DATABASE_FILE: &str = "com.plexapp.plugins.library.db";

/// Directory, next to the database, that receives backup copies.
pub const DEFAULT_BACKUP_DIR: &str = "backups";

const CONFIG_VERSION: &str = "1.0";

/// Top-level rewrite configuration.
///
/// # Examples
///
/// ```
/// use path_rewrite_db::RewriteConfig;
///
/// let config: RewriteConfig = serde_yaml::from_str("candidate_columns: [file]").unwrap();
/// assert!(config.candidate_columns.contains("file"));
/// assert!(!config.candidate_columns.contains("root_path"));
/// assert_eq!(config.database_file, "com.plexapp.plugins.library.db");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// File name of the database inside a database directory.
    pub database_file: String,
    /// Backup directory name, relative to the database's parent directory.
    pub backup_dir: String,
    /// Column names that may be rewritten.
    pub candidate_columns: ColumnAllowList,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            backup_dir: DEFAULT_BACKUP_DIR.to_string(),
            candidate_columns: ColumnAllowList::default(),
        }
    }
}

impl RewriteConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be read, [`YamlError`](crate::DatabaseError::YamlError) if parsing
    /// fails (including an empty `candidate_columns` list), or
    /// [`InvalidConfig`](crate::DatabaseError::InvalidConfig) if a file or
    /// directory name is blank.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks the fields serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.database_file.trim().is_empty() {
            return Err(crate::DatabaseError::InvalidConfig(
                "database_file cannot be empty".to_string(),
            ));
        }
        if self.backup_dir.trim().is_empty() {
            return Err(crate::DatabaseError::InvalidConfig(
                "backup_dir cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
