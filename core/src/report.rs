//! Human-readable console report.
//!
//! The report is meant for an operator reading a terminal, not for
//! machines; `--format json` serializes [`RunResult`] directly instead.

use std::fmt::Write;

use crate::{CompactionStatus, RewriteRequest, RunResult, SkipStage};

/// Renders the lines printed before any work is done.
pub fn render_header(database: &str, request: &RewriteRequest) -> String {
    let mut out = String::new();
    if request.is_dry_run() {
        out.push_str("== DRY RUN ==\n");
    }
    let _ = writeln!(out, "DB: {database}");
    let _ = writeln!(
        out,
        "Replacing occurrences of '{}' → '{}'",
        request.old(),
        request.new_text()
    );
    out
}

/// Renders skipped tables/columns, matches, totals, and the validation and
/// compaction results of a finished run.
pub fn render_text(result: &RunResult) -> String {
    let mut out = String::new();

    for skip in &result.skips {
        let _ = match skip.stage {
            SkipStage::Inspect | SkipStage::Scan => writeln!(
                out,
                "Skipping {} due to error: {}",
                skip.location(),
                skip.reason
            ),
            SkipStage::Rewrite => {
                writeln!(out, "Failed updating {}: {}", skip.location(), skip.reason)
            }
        };
    }

    let touched: Vec<_> = result.touched().collect();

    if result.request.is_dry_run() {
        if touched.is_empty() {
            out.push_str("\nNo matches found.\n");
        } else {
            out.push_str("\nWould touch the following columns:\n");
            for report in &touched {
                let _ = writeln!(out, "  {}: {} row(s)", report.target, report.hits);
            }
        }
        let _ = writeln!(
            out,
            "\nTotal rows containing '{}': {}",
            result.request.old(),
            result.total_matched()
        );
        return out;
    }

    if touched.is_empty() {
        out.push_str("\nNo matches updated.\n");
    } else {
        out.push_str("\nUpdated columns:\n");
        for report in &touched {
            let _ = writeln!(out, "  {}: {} row(s) matched", report.target, report.hits);
        }
    }
    let _ = writeln!(out, "\nTotal rows updated: {}", result.total_updated());

    if let Some(integrity) = &result.integrity {
        let _ = writeln!(out, "\nPRAGMA integrity_check: {integrity}");
    }

    match &result.compaction {
        CompactionStatus::NotRun => {}
        CompactionStatus::Completed => out.push_str("VACUUM complete.\n"),
        CompactionStatus::Skipped(reason) => {
            let _ = writeln!(out, "VACUUM skipped ({reason}).");
        }
    }

    out
}
