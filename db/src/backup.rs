//! Timestamped backups of a database file and its sidecars.
//!
//! A backup is a plain file copy of the database plus any `-wal`/`-shm`
//! sidecar files, written to a sibling backup directory. Backups are
//! strictly additive: an existing backup file is never overwritten, and the
//! originals are only read.
//!
//! Each copy is verified by comparing SHA-256 digests of source and
//! destination, so a truncated copy is reported before the rewrite starts.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{DatabaseError, Result};

/// Suffixes of the files that make up one consistent database snapshot.
pub const SNAPSHOT_SUFFIXES: &[&str] = &["", "-wal", "-shm"];

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// One verified file copy.
#[derive(Debug, Clone, Serialize)]
pub struct BackupCopy {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
    /// Hex SHA-256 digest shared by source and destination.
    pub sha256: String,
}

/// All copies made for one backup.
#[derive(Debug, Clone, Serialize)]
pub struct BackupSet {
    pub directory: PathBuf,
    /// Timestamp tag embedded in every file name of this set.
    pub tag: String,
    pub copies: Vec<BackupCopy>,
}

impl BackupSet {
    /// Destination paths, in snapshot order.
    pub fn destinations(&self) -> impl Iterator<Item = &Path> {
        self.copies.iter().map(|copy| copy.destination.as_path())
    }
}

/// Backs up `db_path` and its sidecars into `<parent>/<backup_dir>/`, tagged
/// with the current local time.
pub fn backup_database(db_path: &Path, backup_dir: &str) -> Result<BackupSet> {
    backup_database_at(db_path, backup_dir, Local::now())
}

/// Like [`backup_database`] with an explicit timestamp.
///
/// Files are named `<file><suffix>.<YYYYmmdd-HHMMSS>.bak`. If any of those
/// names is already taken, a counter is appended to the tag
/// (`<YYYYmmdd-HHMMSS>-1`, `-2`, ...) so earlier backups stay untouched.
///
/// # Errors
///
/// Returns [`DatabaseError::DatabaseNotFound`] if `db_path` is missing,
/// [`DatabaseError::IoError`] if a copy fails, and
/// [`DatabaseError::BackupVerification`] if a copy's digest differs from
/// its source.
pub fn backup_database_at(
    db_path: &Path,
    backup_dir: &str,
    now: DateTime<Local>,
) -> Result<BackupSet> {
    if !db_path.is_file() {
        return Err(DatabaseError::DatabaseNotFound(db_path.to_path_buf()));
    }
    let file_name = db_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| DatabaseError::DatabaseNotFound(db_path.to_path_buf()))?;
    let directory = db_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(backup_dir);
    std::fs::create_dir_all(&directory)?;

    let sources: Vec<(PathBuf, &str)> = SNAPSHOT_SUFFIXES
        .iter()
        .map(|suffix| (sidecar_path(db_path, suffix), *suffix))
        .filter(|(path, _)| path.exists())
        .collect();

    let base_tag = now.format(TIMESTAMP_FORMAT).to_string();
    let tag = free_tag(&directory, &file_name, &base_tag, &sources);

    let mut copies = Vec::with_capacity(sources.len());
    for (source, suffix) in &sources {
        let destination = directory.join(format!("{file_name}{suffix}.{tag}.bak"));
        let copy = copy_verified(source, &destination)?;
        debug!(
            source = %copy.source.display(),
            destination = %copy.destination.display(),
            bytes = copy.bytes,
            "Backup copy verified"
        );
        copies.push(copy);
    }

    info!(directory = %directory.display(), files = copies.len(), "Backup complete");
    Ok(BackupSet {
        directory,
        tag,
        copies,
    })
}

/// Returns `<db_path><suffix>`, e.g. `library.db-wal`.
pub fn sidecar_path(db_path: &Path, suffix: &str) -> PathBuf {
    let mut raw = db_path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Computes the hex SHA-256 digest of a file without loading it into memory.
pub fn file_checksum(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

fn free_tag(directory: &Path, file_name: &str, base_tag: &str, sources: &[(PathBuf, &str)]) -> String {
    let taken = |tag: &str| {
        sources.iter().any(|(_, suffix)| {
            directory
                .join(format!("{file_name}{suffix}.{tag}.bak"))
                .exists()
        })
    };
    if !taken(base_tag) {
        return base_tag.to_string();
    }
    let mut counter = 1u32;
    loop {
        let candidate = format!("{base_tag}-{counter}");
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn copy_verified(source: &Path, destination: &Path) -> Result<BackupCopy> {
    let bytes = std::fs::copy(source, destination)?;
    let expected = file_checksum(source)?;
    let actual = file_checksum(destination)?;
    if expected != actual {
        return Err(DatabaseError::BackupVerification {
            path: destination.to_path_buf(),
            reason: format!("expected sha256 {expected}, found {actual}"),
        });
    }
    Ok(BackupCopy {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        bytes,
        sha256: actual,
    })
}
