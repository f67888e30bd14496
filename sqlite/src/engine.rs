//! Transaction orchestration for a rewrite run.
//!
//! A run moves through a fixed sequence and never reorders it:
//!
//! 1. open one connection and begin one transaction;
//! 2. scan every candidate column of every rewritable table;
//! 3. dry run: roll back unconditionally and stop;
//! 4. rewrite every column with at least one match;
//! 5. validate once, after all rewrites;
//! 6. commit if validation is acceptable, otherwise roll back;
//! 7. after a commit, close the connection and compact through a new one.
//!
//! The transactional connection and transaction are scoped values: any
//! early return or `?` drops them, and dropping an unfinished
//! [`rusqlite::Transaction`] rolls it back.
//!
//! # Example
//!
//! ```no_run
//! use path_rewrite_core::{ColumnAllowList, RewriteRequest, RunMode};
//! use path_rewrite_sqlite::RewriteEngine;
//!
//! let engine = RewriteEngine::new("com.plexapp.plugins.library.db", ColumnAllowList::default());
//! let request = RewriteRequest::new("/archive-media/", "/media/", RunMode::DryRun).unwrap();
//! let result = engine.run(&request).unwrap();
//! println!("{} row(s) would change", result.total_matched());
//! ```

use std::path::PathBuf;

use path_rewrite_core::{
    ColumnAllowList, ColumnSkip, MatchReport, RewriteOutcome, RewriteRequest, RunMode, RunResult,
    RunStatus, SkipStage, Step, TargetColumn,
};
use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::compact::compact;
use crate::error::{Result, RewriteError};
use crate::integrity::{IntegrityValidator, PragmaIntegrityCheck};
use crate::preview::{Session, open_preview};
use crate::rewrite::apply_substitution;
use crate::scan::count_matches;
use crate::schema::SchemaInspector;

/// Drives one rewrite run against a database file.
///
/// The engine holds no connection between runs; every [`run`](Self::run)
/// rediscovers the schema from scratch.
pub struct RewriteEngine<V = PragmaIntegrityCheck> {
    db_path: PathBuf,
    allow_list: ColumnAllowList,
    validator: V,
}

/// How the rewrite phase ended.
enum RewritePhase {
    Completed,
    /// SQLite discarded the whole transaction after a column failure.
    TransactionLost,
}

impl RewriteEngine<PragmaIntegrityCheck> {
    /// Creates an engine that validates with `PRAGMA integrity_check`.
    pub fn new(db_path: impl Into<PathBuf>, allow_list: ColumnAllowList) -> Self {
        Self {
            db_path: db_path.into(),
            allow_list,
            validator: PragmaIntegrityCheck,
        }
    }
}

impl<V: IntegrityValidator> RewriteEngine<V> {
    /// Replaces the integrity validator.
    pub fn with_validator<W: IntegrityValidator>(self, validator: W) -> RewriteEngine<W> {
        RewriteEngine {
            db_path: self.db_path,
            allow_list: self.allow_list,
            validator,
        }
    }

    /// Executes one run.
    ///
    /// Per-table and per-column failures are recorded in
    /// [`RunResult::skips`]; an integrity failure or a transaction discarded
    /// by the engine is reported through [`RunResult::status`].
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::DatabaseNotFound`] if the file does not exist
    /// and [`RewriteError::DatabaseError`] if the database cannot be opened,
    /// the catalog cannot be read, or the transaction cannot begin, roll
    /// back, or commit. In every error case nothing has been committed.
    pub fn run(&self, request: &RewriteRequest) -> Result<RunResult> {
        if !self.db_path.is_file() {
            return Err(RewriteError::DatabaseNotFound(self.db_path.clone()));
        }

        let mut result = RunResult::new(request.clone());
        info!(
            path = %self.db_path.display(),
            mode = ?request.mode(),
            "Starting rewrite run"
        );

        {
            let mut session = self.open_transactional(request.mode())?;
            let behavior = match request.mode() {
                RunMode::DryRun => TransactionBehavior::Deferred,
                RunMode::Apply => TransactionBehavior::Immediate,
            };
            let tx = session.conn.transaction_with_behavior(behavior)?;

            self.scan(&tx, request, &mut result)?;

            if request.is_dry_run() {
                tx.rollback()?;
                result.status = RunStatus::Previewed;
                info!(matched = result.total_matched(), "Dry run rolled back");
                return Ok(result);
            }

            if let RewritePhase::TransactionLost = self.rewrite(&tx, request, &mut result) {
                warn!("Transaction was discarded by SQLite; nothing was committed");
                result.status = RunStatus::Aborted;
                return Ok(result);
            }

            let integrity = self.validator.check(&tx);
            info!(status = %integrity, "Integrity check finished");
            let acceptable = integrity.is_acceptable();
            result.integrity = Some(integrity);

            if !acceptable {
                tx.rollback()?;
                result.status = RunStatus::RolledBack;
                warn!("Integrity check failed; rewrite rolled back");
                return Ok(result);
            }

            tx.commit()?;
            info!(updated = result.total_updated(), "Rewrite committed");
        }

        result.compaction = compact(&self.db_path);
        result.status = RunStatus::Committed;
        Ok(result)
    }

    /// Opens the connection for the transactional phase.
    ///
    /// Dry runs go through `open_preview`, which never writes the file or
    /// its sidecars. Real runs open read-write (never create), turn off
    /// foreign-key enforcement, and switch to a rollback journal.
    fn open_transactional(&self, mode: RunMode) -> Result<Session> {
        match mode {
            RunMode::DryRun => open_preview(&self.db_path),
            RunMode::Apply => {
                let conn = Connection::open_with_flags(
                    &self.db_path,
                    OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )?;
                conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
                let journal: String =
                    conn.query_row("PRAGMA journal_mode = DELETE", [], |row| row.get(0))?;
                debug!(journal_mode = %journal, "Configured connection for rewrite");
                Ok(Session::direct(conn))
            }
        }
    }

    fn scan(
        &self,
        conn: &Connection,
        request: &RewriteRequest,
        result: &mut RunResult,
    ) -> Result<()> {
        let inspector = SchemaInspector::new(conn, &self.allow_list);

        for table in inspector.list_rewritable_tables()? {
            let targets = match inspector.candidate_columns(&table) {
                Step::Success(targets) => targets,
                Step::Skipped(reason) => {
                    warn!(table = %table, error = %reason, "Skipping table");
                    result
                        .skips
                        .push(ColumnSkip::table(table, SkipStage::Inspect, reason));
                    continue;
                }
            };

            for target in targets {
                match count_matches(conn, &target, request.old()) {
                    Step::Success(hits) => {
                        debug!(target = %target, hits, "Scanned column");
                        result.matches.push(MatchReport { target, hits });
                    }
                    Step::Skipped(reason) => {
                        warn!(target = %target, error = %reason, "Skipping column");
                        result
                            .skips
                            .push(ColumnSkip::column(&target, SkipStage::Scan, reason));
                    }
                }
            }
        }
        Ok(())
    }

    fn rewrite(
        &self,
        conn: &Connection,
        request: &RewriteRequest,
        result: &mut RunResult,
    ) -> RewritePhase {
        let pending: Vec<TargetColumn> = result
            .touched()
            .map(|report| report.target.clone())
            .collect();

        for target in pending {
            match apply_substitution(conn, &target, request.old(), request.new_text()) {
                Step::Success(rows_updated) => {
                    let matched = result.hits_for(&target).unwrap_or_default();
                    if rows_updated != matched {
                        warn!(
                            target = %target,
                            matched,
                            updated = rows_updated,
                            "Updated row count differs from matched row count"
                        );
                    }
                    debug!(target = %target, rows_updated, "Rewrote column");
                    result.rewrites.push(RewriteOutcome {
                        target,
                        rows_updated,
                    });
                }
                Step::Skipped(reason) => {
                    warn!(target = %target, error = %reason, "Failed updating column");
                    result
                        .skips
                        .push(ColumnSkip::column(&target, SkipStage::Rewrite, reason));
                    if conn.is_autocommit() {
                        return RewritePhase::TransactionLost;
                    }
                }
            }
        }
        RewritePhase::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use path_rewrite_core::{CompactionStatus, IntegrityStatus};

    fn fixture(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("library.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
CREATE TABLE media_parts (id INTEGER PRIMARY KEY, file TEXT);
INSERT INTO media_parts (file) VALUES
    ('/archive-media/movies/a.mkv'),
    ('/archive-media/movies/b.mkv'),
    ('/tv/c.mkv');
"#,
        )
        .unwrap();
        path
    }

    fn request(mode: RunMode) -> RewriteRequest {
        RewriteRequest::new("/archive-media/", "/media/", mode).unwrap()
    }

    #[test]
    fn test_missing_database_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let engine = RewriteEngine::new(&path, ColumnAllowList::default());
        assert!(matches!(
            engine.run(&request(RunMode::DryRun)),
            Err(RewriteError::DatabaseNotFound(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_dry_run_is_previewed() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RewriteEngine::new(fixture(&dir), ColumnAllowList::default());
        let result = engine.run(&request(RunMode::DryRun)).unwrap();

        assert_eq!(result.status, RunStatus::Previewed);
        assert_eq!(result.total_matched(), 2);
        assert!(result.rewrites.is_empty());
        assert_eq!(result.integrity, None);
        assert_eq!(result.compaction, CompactionStatus::NotRun);
    }

    #[test]
    fn test_apply_commits_and_compacts() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RewriteEngine::new(fixture(&dir), ColumnAllowList::default());
        let result = engine.run(&request(RunMode::Apply)).unwrap();

        assert_eq!(result.status, RunStatus::Committed);
        assert_eq!(result.total_updated(), 2);
        assert_eq!(result.integrity, Some(IntegrityStatus::Ok));
        assert_eq!(result.compaction, CompactionStatus::Completed);
    }

    #[test]
    fn test_skipped_integrity_still_commits() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RewriteEngine::new(fixture(&dir), ColumnAllowList::default())
            .with_validator(|_: &Connection| {
                IntegrityStatus::Skipped("unknown tokenizer: collating".into())
            });
        let result = engine.run(&request(RunMode::Apply)).unwrap();
        assert_eq!(result.status, RunStatus::Committed);
    }

    #[test]
    fn test_validator_runs_once_after_all_rewrites() {
        use std::cell::Cell;

        let dir = tempfile::tempdir().unwrap();
        let path = fixture(&dir);
        Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TABLE section_locations (id INTEGER PRIMARY KEY, root_path TEXT);
                 INSERT INTO section_locations (root_path) VALUES ('/archive-media/movies');",
            )
            .unwrap();

        let calls = Cell::new(0);
        let engine = RewriteEngine::new(&path, ColumnAllowList::default()).with_validator(
            |conn: &Connection| {
                calls.set(calls.get() + 1);
                let remaining: i64 = conn
                    .query_row(
                        "SELECT (SELECT COUNT(*) FROM media_parts WHERE INSTR(file, '/archive-media/') > 0)
                              + (SELECT COUNT(*) FROM section_locations WHERE INSTR(root_path, '/archive-media/') > 0)",
                        [],
                        |row| row.get(0),
                    )
                    .unwrap();
                assert_eq!(remaining, 0, "validator ran before every column was rewritten");
                IntegrityStatus::Ok
            },
        );
        let result = engine.run(&request(RunMode::Apply)).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(result.total_updated(), 3);
    }
}
