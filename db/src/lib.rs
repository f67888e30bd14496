//! Database file handling for path rewrites.
//!
//! Everything that touches the database *file* rather than its contents:
//!
//! - [`DatabaseLocation`]: resolving `--db-dir` / `--db-file` to an
//!   existing file.
//! - [`RewriteConfig`]: YAML configuration (database file name, backup
//!   directory, column allow-list).
//! - [`backup_database`]: timestamped, checksum-verified copies of the file
//!   and its `-wal`/`-shm` sidecars.
//!
//! # Quick start
//!
//! ```no_run
//! use path_rewrite_db::{DatabaseLocation, RewriteConfig, backup_database};
//!
//! let config = RewriteConfig::default();
//! let location = DatabaseLocation::from_args(Some("Databases".into()), None).unwrap();
//! let db_path = location.resolve(&config.database_file).unwrap();
//!
//! let backup = backup_database(&db_path, &config.backup_dir).unwrap();
//! for path in backup.destinations() {
//!     println!("  {}", path.display());
//! }
//! ```

mod backup;
mod config;
mod error;
mod locate;

pub use backup::{
    BackupCopy, BackupSet, SNAPSHOT_SUFFIXES, backup_database, backup_database_at, file_checksum,
    sidecar_path,
};
pub use config::{DEFAULT_BACKUP_DIR, DEFAULT_DATABASE_FILE, RewriteConfig};
pub use error::{DatabaseError, Result};
pub use locate::DatabaseLocation;
