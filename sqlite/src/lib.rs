//! Transactional, schema-agnostic text rewrite engine for SQLite.
//!
//! This crate replaces a literal substring in every eligible text column of
//! a SQLite database inside a single transaction, validates the result, and
//! only then commits. It is built for databases whose schema is not known in
//! advance and may contain virtual tables backed by modules that are not
//! available at runtime.
//!
//! # Architecture
//!
//! The crate is organized into leaf modules driven by one orchestrator:
//!
//! - **`schema`**, [`SchemaInspector`]: rewritable tables and candidate columns
//! - **`scan`**, [`count_matches`]: rows containing the search text
//! - **`rewrite`**, [`apply_substitution`]: in-transaction `REPLACE`
//! - **`integrity`**, [`IntegrityValidator`]: post-rewrite consistency check
//! - **`compact`**, [`compact`]: `VACUUM` through a fresh connection
//! - **`engine`**, [`RewriteEngine`]: scan → rewrite → validate → commit
//!
//! Per-table and per-column failures never abort a run. They come back as
//! [`Step::Skipped`](path_rewrite_core::Step::Skipped) and are collected in
//! [`RunResult::skips`](path_rewrite_core::RunResult::skips).
//!
//! # Quick start
//!
//! ```no_run
//! use path_rewrite_core::{ColumnAllowList, RewriteRequest, RunMode, RunStatus};
//! use path_rewrite_sqlite::RewriteEngine;
//!
//! let engine = RewriteEngine::new("library.db", ColumnAllowList::default());
//!
//! let preview = RewriteRequest::new("/archive-media/", "/media/", RunMode::DryRun).unwrap();
//! let result = engine.run(&preview).unwrap();
//! for report in result.touched() {
//!     println!("{}: {} row(s)", report.target, report.hits);
//! }
//!
//! let apply = RewriteRequest::new("/archive-media/", "/media/", RunMode::Apply).unwrap();
//! let result = engine.run(&apply).unwrap();
//! assert_eq!(result.status, RunStatus::Committed);
//! ```

mod compact;
mod engine;
mod error;
mod integrity;
mod preview;
mod rewrite;
mod scan;
mod schema;

pub use compact::compact;
pub use engine::RewriteEngine;
pub use error::{Result, RewriteError};
pub use integrity::{IntegrityValidator, PragmaIntegrityCheck, check_integrity};
pub use rewrite::apply_substitution;
pub use scan::count_matches;
pub use schema::{SchemaInspector, is_module_backed};
