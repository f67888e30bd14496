//! Post-rewrite consistency check.
//!
//! [`PragmaIntegrityCheck`] runs `PRAGMA integrity_check` on the open
//! transaction, so it sees the uncommitted rewrites. When the check cannot
//! run because the database depends on an optional capability this build
//! does not have (a custom FTS tokenizer, a collation, a module such as
//! `spellfix1`), the result is [`IntegrityStatus::Skipped`]: a missing
//! capability is not evidence of corruption. Every other error raised while
//! running the check (corruption, I/O, busy, out of memory) is
//! [`IntegrityStatus::Failed`].

use path_rewrite_core::IntegrityStatus;
use rusqlite::Connection;

/// Decides whether the rewritten database is consistent enough to commit.
pub trait IntegrityValidator {
    fn check(&self, conn: &Connection) -> IntegrityStatus;
}

impl<F> IntegrityValidator for F
where
    F: Fn(&Connection) -> IntegrityStatus,
{
    fn check(&self, conn: &Connection) -> IntegrityStatus {
        self(conn)
    }
}

/// The default validator: SQLite's full `integrity_check` pragma.
#[derive(Debug, Clone, Copy, Default)]
pub struct PragmaIntegrityCheck;

impl IntegrityValidator for PragmaIntegrityCheck {
    fn check(&self, conn: &Connection) -> IntegrityStatus {
        check_integrity(conn)
    }
}

/// Runs `PRAGMA integrity_check` and classifies the outcome.
pub fn check_integrity(conn: &Connection) -> IntegrityStatus {
    match integrity_lines(conn) {
        Ok(lines) => classify_lines(lines),
        Err(err) => classify_error(&err),
    }
}

fn integrity_lines(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
    let lines = stmt.query_map([], |row| row.get::<_, String>(0))?;
    lines.collect()
}

fn classify_lines(lines: Vec<String>) -> IntegrityStatus {
    match lines.as_slice() {
        [] => IntegrityStatus::Failed("unknown".to_string()),
        [only] if only == "ok" => IntegrityStatus::Ok,
        _ => IntegrityStatus::Failed(lines.join("; ")),
    }
}

/// Engine messages meaning an optional capability is not available.
const MISSING_CAPABILITY: &[&str] = &[
    "no such module",
    "no such collation",
    "no such function",
    "unknown function",
    "unknown tokenizer",
    "no such tokenizer",
];

fn classify_error(err: &rusqlite::Error) -> IntegrityStatus {
    let message = err.to_string();
    let generic_error = matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.extended_code & 0xff == rusqlite::ffi::SQLITE_ERROR
    );
    if generic_error && MISSING_CAPABILITY.iter().any(|needle| message.contains(needle)) {
        IntegrityStatus::Skipped(message)
    } else {
        IntegrityStatus::Failed(message)
    }
}
