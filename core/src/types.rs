//! Data model for a rewrite run.
//!
//! Requests, per-column scan and rewrite results, skip records, and the
//! aggregate [`RunResult`]. Every reportable type derives [`serde`] traits
//! so the CLI can print it as JSON.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Column names that commonly carry filesystem paths in media library databases.
pub const DEFAULT_CANDIDATE_COLUMNS: &[&str] = &["root_path", "file", "path"];

/// A rewritable location: one column of one ordinary table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetColumn {
    /// Table name as stored in `sqlite_master`.
    pub table: String,
    /// Column name as reported by table introspection.
    pub column: String,
}

impl TargetColumn {
    /// Creates a target for `table.column`.
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for TargetColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Number of rows in a column that currently contain the search text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub target: TargetColumn,
    pub hits: u64,
}

/// Number of rows a substitution actually changed in one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteOutcome {
    pub target: TargetColumn,
    pub rows_updated: u64,
}

/// Result of a single per-table or per-column engine operation.
///
/// Engine-level failures that only concern one table or column are carried
/// as [`Step::Skipped`] so the caller can record them and move on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    /// The operation completed and produced a value.
    Success(T),
    /// The operation failed for this table/column only; the reason is the
    /// underlying engine message.
    Skipped(String),
}

/// Phase of the run in which a table or column was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipStage {
    /// Table introspection failed.
    Inspect,
    /// Counting matches failed.
    Scan,
    /// Applying the substitution failed.
    Rewrite,
}

/// A table or column left untouched because the engine rejected an operation on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSkip {
    pub table: String,
    /// `None` when the whole table was skipped during inspection.
    pub column: Option<String>,
    pub stage: SkipStage,
    pub reason: String,
}

impl ColumnSkip {
    /// Records a skip for one column.
    pub fn column(target: &TargetColumn, stage: SkipStage, reason: impl Into<String>) -> Self {
        Self {
            table: target.table.clone(),
            column: Some(target.column.clone()),
            stage,
            reason: reason.into(),
        }
    }

    /// Records a skip for a whole table.
    pub fn table(table: impl Into<String>, stage: SkipStage, reason: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: None,
            stage,
            reason: reason.into(),
        }
    }

    /// `table.column`, or just `table` for table-level skips.
    pub fn location(&self) -> String {
        match &self.column {
            Some(column) => format!("{}.{}", self.table, column),
            None => self.table.clone(),
        }
    }
}

/// Outcome of the post-rewrite consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum IntegrityStatus {
    /// The check ran and reported no problems.
    Ok,
    /// The check could not run because an optional engine capability is
    /// missing (collation, tokenizer, module). Not evidence of corruption.
    Skipped(String),
    /// The check ran (or the engine reported corruption) and found problems.
    Failed(String),
}

impl IntegrityStatus {
    /// Whether a commit may proceed with this status.
    pub fn is_acceptable(&self) -> bool {
        !matches!(self, IntegrityStatus::Failed(_))
    }
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityStatus::Ok => f.write_str("ok"),
            IntegrityStatus::Skipped(reason) => write!(f, "skipped ({reason})"),
            IntegrityStatus::Failed(description) => f.write_str(description),
        }
    }
}

/// Outcome of the post-commit compaction pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum CompactionStatus {
    /// Compaction only runs after a real commit.
    #[default]
    NotRun,
    Completed,
    /// Compaction failed; the committed rewrite is unaffected.
    Skipped(String),
}

/// Whether a run previews or applies the substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    DryRun,
    Apply,
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Dry run: the transaction was rolled back unconditionally.
    Previewed,
    /// All rewrites were committed.
    Committed,
    /// Integrity validation failed and every rewrite was rolled back.
    RolledBack,
    /// The engine discarded the transaction mid-run; nothing was committed.
    Aborted,
}

impl RunStatus {
    /// Whether the run ended in a state the operator should treat as success.
    pub fn is_success(self) -> bool {
        matches!(self, RunStatus::Previewed | RunStatus::Committed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Previewed => "previewed",
            RunStatus::Committed => "committed",
            RunStatus::RolledBack => "rolled back",
            RunStatus::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Fixed set of column names that are allowed to be rewritten.
///
/// Matching is by exact name. Columns with other names are never touched,
/// even if they hold paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ColumnAllowList(BTreeSet<String>);

impl ColumnAllowList {
    /// Builds an allow-list from column names.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyAllowList`] when no names are given and
    /// [`ValidationError::EmptyColumnName`] for blank names.
    pub fn new<I, S>(names: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for name in names {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyColumnName);
            }
            set.insert(name);
        }
        if set.is_empty() {
            return Err(ValidationError::EmptyAllowList);
        }
        Ok(Self(set))
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the allowed names that are present in `columns`, sorted.
    pub fn intersect<'a>(&self, columns: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let present: BTreeSet<&str> = columns.into_iter().collect();
        self.0
            .iter()
            .filter(|name| present.contains(name.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for ColumnAllowList {
    fn default() -> Self {
        Self(
            DEFAULT_CANDIDATE_COLUMNS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        )
    }
}

impl TryFrom<Vec<String>> for ColumnAllowList {
    type Error = ValidationError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<ColumnAllowList> for Vec<String> {
    fn from(list: ColumnAllowList) -> Self {
        list.0.into_iter().collect()
    }
}

/// A validated substitution request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteRequest {
    old: String,
    new: String,
    mode: RunMode,
}

impl RewriteRequest {
    /// Creates a request to replace every occurrence of `old` with `new`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyNeedle`] if `old` is empty.
    pub fn new(
        old: impl Into<String>,
        new: impl Into<String>,
        mode: RunMode,
    ) -> Result<Self, ValidationError> {
        let old = old.into();
        if old.is_empty() {
            return Err(ValidationError::EmptyNeedle);
        }
        Ok(Self {
            old,
            new: new.into(),
            mode,
        })
    }

    pub fn old(&self) -> &str {
        &self.old
    }

    pub fn new_text(&self) -> &str {
        &self.new
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn is_dry_run(&self) -> bool {
        self.mode == RunMode::DryRun
    }
}

/// Everything a single run found and did.
///
/// Built up by the orchestrator and discarded after it is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub request: RewriteRequest,
    pub matches: Vec<MatchReport>,
    pub rewrites: Vec<RewriteOutcome>,
    pub skips: Vec<ColumnSkip>,
    /// Only present for runs that reached validation.
    pub integrity: Option<IntegrityStatus>,
    pub compaction: CompactionStatus,
    pub status: RunStatus,
}

impl RunResult {
    /// Starts an empty result for `request`. The status is provisional until
    /// the orchestrator reaches a terminal state.
    pub fn new(request: RewriteRequest) -> Self {
        let status = if request.is_dry_run() {
            RunStatus::Previewed
        } else {
            RunStatus::Aborted
        };
        Self {
            request,
            matches: Vec::new(),
            rewrites: Vec::new(),
            skips: Vec::new(),
            integrity: None,
            compaction: CompactionStatus::NotRun,
            status,
        }
    }

    /// Matches with at least one hit, in scan order.
    pub fn touched(&self) -> impl Iterator<Item = &MatchReport> {
        self.matches.iter().filter(|report| report.hits > 0)
    }

    /// Sum of hits across all scanned columns.
    pub fn total_matched(&self) -> u64 {
        self.matches.iter().map(|report| report.hits).sum()
    }

    /// Sum of rows updated across all successfully rewritten columns.
    pub fn total_updated(&self) -> u64 {
        self.rewrites.iter().map(|outcome| outcome.rows_updated).sum()
    }

    /// Hits recorded for `target`, if it was scanned successfully.
    pub fn hits_for(&self, target: &TargetColumn) -> Option<u64> {
        self.matches
            .iter()
            .find(|report| &report.target == target)
            .map(|report| report.hits)
    }
}
