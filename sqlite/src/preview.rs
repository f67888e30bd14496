//! Side-effect-free connections for dry runs.
//!
//! A plain read-only connection is not enough: on a WAL database SQLite
//! creates `-wal` and `-shm` files on first read and keeps rewriting the
//! shared-memory index while it reads. Two strategies avoid that.
//!
//! When no `-wal` or `-journal` file exists, the main file already holds
//! every committed page, so it is opened with `immutable=1`. SQLite then
//! takes no locks and opens no sidecar at all.
//!
//! When a journal is present, the main file and that journal are copied into
//! a temporary directory and the preview reads the copy. SQLite recovers the
//! copy as it would the original, and the original files are never opened.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::Result;

/// Sidecars holding pages that may not be in the main file yet.
pub(crate) const JOURNAL_SIDECARS: &[&str] = &["-wal", "-journal"];

/// An open connection plus the temporary copy it reads from, if any.
///
/// Field order matters: the connection closes before the copy is removed.
pub(crate) struct Session {
    pub(crate) conn: Connection,
    _snapshot: Option<TempDir>,
}

impl Session {
    /// Wraps a connection to the live file.
    pub(crate) fn direct(conn: Connection) -> Self {
        Self {
            conn,
            _snapshot: None,
        }
    }
}

/// Opens `db_path` for a dry run without writing to it or its sidecars.
pub(crate) fn open_preview(db_path: &Path) -> Result<Session> {
    let journals: Vec<&str> = JOURNAL_SIDECARS
        .iter()
        .copied()
        .filter(|suffix| sidecar_path(db_path, suffix).exists())
        .collect();

    match (journals.is_empty(), immutable_uri(db_path)) {
        (true, Some(uri)) => {
            debug!(uri = %uri, "Opening immutable preview connection");
            let conn = Connection::open_with_flags(
                &uri,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            Ok(Session::direct(conn))
        }
        _ => open_snapshot(db_path, &journals),
    }
}

fn open_snapshot(db_path: &Path, journals: &[&str]) -> Result<Session> {
    let dir = tempfile::Builder::new()
        .prefix("path-rewrite-preview")
        .tempdir()?;
    let file_name = db_path
        .file_name()
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| OsString::from("library.db"));
    let copy = dir.path().join(&file_name);

    std::fs::copy(db_path, &copy)?;
    for suffix in journals {
        std::fs::copy(sidecar_path(db_path, suffix), sidecar_path(&copy, suffix))?;
    }
    info!(
        source = %db_path.display(),
        journals = ?journals,
        "Previewing a temporary copy; the live journal holds uncheckpointed pages"
    );

    let conn = Connection::open_with_flags(
        &copy,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(Session {
        conn,
        _snapshot: Some(dir),
    })
}

/// `db_path` with `suffix` appended to its file name.
pub(crate) fn sidecar_path(db_path: &Path, suffix: &str) -> PathBuf {
    let mut name = db_path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// `file:` URI opening `db_path` read-only and immutable.
///
/// `None` when the path is not valid UTF-8.
fn immutable_uri(db_path: &Path) -> Option<String> {
    let path = db_path.to_str()?;
    let mut uri = String::with_capacity(path.len() + 32);
    uri.push_str("file:");
    for ch in path.chars() {
        match ch {
            '%' => uri.push_str("%25"),
            '?' => uri.push_str("%3f"),
            '#' => uri.push_str("%23"),
            _ => uri.push(ch),
        }
    }
    uri.push_str("?mode=ro&immutable=1");
    Some(uri)
}
