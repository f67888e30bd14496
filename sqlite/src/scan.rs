//! Counting rows that contain the search text.

use path_rewrite_core::{Step, TargetColumn};
use rusqlite::Connection;

use crate::schema::quote_ident;

/// Counts rows of `target` whose value contains `needle`.
///
/// Matching is a case-sensitive literal substring test (`INSTR(...) > 0`);
/// `NULL` values never match. `needle` must be non-empty, which
/// [`RewriteRequest`](path_rewrite_core::RewriteRequest) guarantees.
///
/// An engine error for this column (missing collation, unreadable table,
/// ...) is returned as [`Step::Skipped`] so the caller can move on to the
/// next column.
pub fn count_matches(conn: &Connection, target: &TargetColumn, needle: &str) -> Step<u64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE INSTR({}, ?1) > 0",
        quote_ident(&target.table),
        quote_ident(&target.column)
    );
    match conn.query_row(&sql, [needle], |row| row.get::<_, i64>(0)) {
        Ok(count) => Step::Success(count.max(0) as u64),
        Err(err) => Step::Skipped(err.to_string()),
    }
}
