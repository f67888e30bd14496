//! Applying the substitution to one column.

use path_rewrite_core::{Step, TargetColumn};
use rusqlite::{Connection, params};

use crate::schema::quote_ident;

/// Replaces every occurrence of `old` with `new` in `target`, touching only
/// rows that currently contain `old`.
///
/// Runs on whatever transaction is open on `conn`; nothing here commits.
/// All occurrences within a value are replaced, not just the first.
///
/// A column-level engine error (constraint violation, missing collation,
/// ...) is returned as [`Step::Skipped`]. SQLite undoes the failed statement
/// but normally keeps the surrounding transaction; callers should check
/// [`Connection::is_autocommit`] to detect the rare errors that discard it.
pub fn apply_substitution(
    conn: &Connection,
    target: &TargetColumn,
    old: &str,
    new: &str,
) -> Step<u64> {
    let column = quote_ident(&target.column);
    let sql = format!(
        "UPDATE {table} SET {column} = REPLACE({column}, ?1, ?2) WHERE INSTR({column}, ?1) > 0",
        table = quote_ident(&target.table),
    );
    match conn.execute(&sql, params![old, new]) {
        Ok(rows) => Step::Success(rows as u64),
        Err(err) => Step::Skipped(err.to_string()),
    }
}
