//! Request validation.
//!
//! Hard errors ([`ValidationError`]) stop a run before any database
//! connection is opened. Warnings ([`SubstitutionWarning`]) describe
//! requests that are legal but probably not what the operator intended.
//!
//! # Examples
//!
//! ```
//! use path_rewrite_core::*;
//!
//! let request = RewriteRequest::new("/archive-media/", "/media/", RunMode::DryRun).unwrap();
//! assert!(substitution_warnings(&request).is_empty());
//!
//! // Replacement contains the search text: a second run would match again.
//! let request = RewriteRequest::new("media", "/mnt/media", RunMode::DryRun).unwrap();
//! assert_eq!(
//!     substitution_warnings(&request),
//!     vec![SubstitutionWarning::ReplacementContainsNeedle]
//! );
//! ```

use thiserror::Error;

use crate::RewriteRequest;

/// Request/configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The text to search for is empty.
    #[error("the text to replace cannot be empty")]
    EmptyNeedle,
    /// The column allow-list has no entries.
    #[error("column allow-list cannot be empty")]
    EmptyAllowList,
    /// A column allow-list entry is empty or whitespace-only.
    #[error("column names in the allow-list cannot be empty")]
    EmptyColumnName,
}

/// Legal but suspicious substitutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubstitutionWarning {
    /// `old` and `new` are identical; matching rows would be rewritten to themselves.
    #[error("old and new text are identical; the run will not change any values")]
    IdenticalText,
    /// `new` contains `old`, so repeating the run would match the rewritten rows again.
    #[error("the replacement contains the text being replaced; running again will rewrite the same rows")]
    ReplacementContainsNeedle,
}

/// Returns warnings for a validated request.
pub fn substitution_warnings(request: &RewriteRequest) -> Vec<SubstitutionWarning> {
    let mut warnings = Vec::new();
    if request.old() == request.new_text() {
        warnings.push(SubstitutionWarning::IdenticalText);
    } else if request.new_text().contains(request.old()) {
        warnings.push(SubstitutionWarning::ReplacementContainsNeedle);
    }
    warnings
}
