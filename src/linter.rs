//! Running ytt-lint on a document and turning its report into findings.

pub mod executable;
pub mod invoker;
pub mod runs;

pub use invoker::{LintRequest, Linter, LinterError, RunOutcome, SCHEMA_PATH_VAR};
pub use runs::RunRegistry;

use std::path::Path;

use crate::position::LineIndex;
use crate::report::{self, ParsedReport};

/// Language ids that are linted automatically.
pub const ELIGIBLE_LANGUAGES: &[&str] = &["yaml", "ytt"];

pub fn is_eligible(language_id: &str) -> bool {
    ELIGIBLE_LANGUAGES.contains(&language_id)
}

/// Guess a language id from a file extension, for callers without an editor.
pub fn language_for_path(path: &Path) -> Option<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("yaml") | Some("yml") => Some("yaml"),
        Some("ytt") => Some("ytt"),
        _ => None,
    }
}

/// Run the linter for `request` and resolve its report against the request text.
///
/// Returns `Ok(None)` for documents that are not linted.
pub async fn lint(
    linter: &Linter,
    request: &LintRequest,
) -> Result<Option<ParsedReport>, LinterError> {
    let raw = match linter.run(request).await? {
        RunOutcome::Ineligible => return Ok(None),
        RunOutcome::Report(raw) => raw,
    };

    let index = LineIndex::new(&request.text);
    let parsed = report::parse(raw, &request.source_path, &request.document_uri, &index);

    log::debug!(
        "Lint run {} for {}: {} finding(s), {} without line, {} invalid",
        request.sequence,
        request.source_path,
        parsed.findings.len(),
        parsed.locationless.len(),
        parsed.errors.len()
    );

    Ok(Some(parsed))
}
