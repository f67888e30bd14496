//! Post-commit compaction.

use std::path::Path;

use path_rewrite_core::CompactionStatus;
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

/// Runs `VACUUM` on `db_path` through a brand-new connection.
///
/// Must only be called after the rewrite transaction has committed and its
/// connection has been closed. Failures (unsupported module, locked file,
/// ...) are reported as [`CompactionStatus::Skipped`]; the committed rewrite
/// is already durable either way.
pub fn compact(db_path: &Path) -> CompactionStatus {
    let conn = match Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    ) {
        Ok(conn) => conn,
        Err(err) => {
            warn!(path = %db_path.display(), error = %err, "Could not open database for VACUUM");
            return CompactionStatus::Skipped(err.to_string());
        }
    };

    match conn.execute_batch("VACUUM;") {
        Ok(()) => {
            info!(path = %db_path.display(), "VACUUM complete");
            CompactionStatus::Completed
        }
        Err(err) => {
            warn!(path = %db_path.display(), error = %err, "VACUUM skipped");
            CompactionStatus::Skipped(err.to_string())
        }
    }
}
