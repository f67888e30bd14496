//! Core types, validation, and reporting for transactional path rewrites.
//!
//! This crate defines the values that flow through a rewrite run:
//!
//! - [`TargetColumn`]: one `(table, column)` location that may be rewritten.
//! - [`MatchReport`] / [`RewriteOutcome`]: per-column hit and update counts.
//! - [`Step`]: success-or-skipped result of a per-table/per-column operation.
//! - [`IntegrityStatus`] / [`CompactionStatus`]: post-rewrite check outcomes.
//! - [`RunResult`]: the aggregate a run reports and then discards.
//! - [`ColumnAllowList`]: the configured set of path-bearing column names.
//!
//! Validation ([`RewriteRequest::new`], [`substitution_warnings`]) rejects
//! or flags requests before any database is opened, and [`render_text`]
//! formats a finished run for the console.
//!
//! # Example
//!
//! ```
//! use path_rewrite_core::*;
//!
//! let request = RewriteRequest::new("/archive-media/", "/media/", RunMode::DryRun).unwrap();
//! let mut result = RunResult::new(request);
//! result.matches.push(MatchReport {
//!     target: TargetColumn::new("media_parts", "file"),
//!     hits: 2,
//! });
//!
//! assert_eq!(result.total_matched(), 2);
//! assert!(render_text(&result).contains("media_parts.file: 2 row(s)"));
//! ```

mod report;
mod types;
mod validate;

pub use report::{render_header, render_text};
pub use types::*;
pub use validate::{SubstitutionWarning, ValidationError, substitution_warnings};
