//! Schema inspection: which tables and columns may be rewritten.
//!
//! Only ordinary tables are eligible. A table is excluded when its
//! `CREATE` statement declares a virtual table or binds a storage module
//! (`USING fts4(...)`, `USING spellfix1`, ...), because such tables can
//! raise engine errors on plain introspection or reads when the module is
//! not loaded. SQLite's own `sqlite_*` tables are excluded as well.
//!
//! Candidate columns are the intersection of the table's real columns with
//! the configured [`ColumnAllowList`], recomputed on every call.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use path_rewrite_core::{ColumnAllowList, Step, TargetColumn};
use regex::Regex;
use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;

static MODULE_BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bvirtual\s+table\b|\busing\s+[a-z_]").expect("static regex must compile")
});

/// Returns `true` if a `CREATE` statement declares a virtual table or binds
/// a storage module.
///
/// The check is deliberately broad: a false positive only means a table is
/// left alone.
///
/// # Examples
///
/// ```
/// use path_rewrite_sqlite::is_module_backed;
///
/// assert!(is_module_backed("CREATE VIRTUAL TABLE fts4_tag_titles USING fts4(tag)"));
/// assert!(is_module_backed("create virtual table spellfix_titles using spellfix1"));
/// assert!(!is_module_backed("CREATE TABLE media_parts (id INTEGER PRIMARY KEY, file TEXT)"));
/// ```
pub fn is_module_backed(create_sql: &str) -> bool {
    MODULE_BINDING.is_match(create_sql)
}

/// Quotes an identifier for interpolation into SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Read-only view of the live schema, filtered through a column allow-list.
pub struct SchemaInspector<'a> {
    conn: &'a Connection,
    allow_list: &'a ColumnAllowList,
}

impl<'a> SchemaInspector<'a> {
    pub fn new(conn: &'a Connection, allow_list: &'a ColumnAllowList) -> Self {
        Self { conn, allow_list }
    }

    /// Lists ordinary, non-internal tables, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error only if the catalog itself cannot be read.
    pub fn list_rewritable_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, COALESCE(sql, '') FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut tables = Vec::new();
        for row in rows {
            let (name, sql) = row?;
            if name.starts_with("sqlite_") {
                continue;
            }
            if is_module_backed(&sql) {
                debug!(table = %name, "Skipping module-backed table");
                continue;
            }
            tables.push(name);
        }
        Ok(tables)
    }

    /// Allow-listed columns present in `table`, sorted by name.
    ///
    /// Returns [`Step::Skipped`] with the engine message if the table cannot
    /// be introspected.
    pub fn candidate_columns(&self, table: &str) -> Step<Vec<TargetColumn>> {
        match self.try_columns_of(table) {
            Ok(columns) => Step::Success(
                self.allow_list
                    .intersect(columns.iter().map(String::as_str))
                    .into_iter()
                    .map(|column| TargetColumn::new(table, column))
                    .collect(),
            ),
            Err(err) => Step::Skipped(err.to_string()),
        }
    }

    fn try_columns_of(&self, table: &str) -> rusqlite::Result<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1)")?;
        let names = stmt.query_map([table], |row| row.get::<_, String>(0))?;
        names.collect()
    }
}
