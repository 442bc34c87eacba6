//! Decoding ytt-lint's JSON report into positioned findings.
//!
//! `ytt-lint -o json` prints an array of `{"pos": "...", "msg": "...", "code": "..."}`
//! records. `pos` is `"<path>:<line>"`, or just `"<path>"` when the linter could
//! not locate the problem. A single invocation may report problems in other
//! files (imported libraries, overlays); only records for the linted document
//! become findings.

use serde::Deserialize;

use crate::position::{LineIndex, LineRange, PositionError};

/// Source tag attached to every finding.
pub const SOURCE: &str = "ytt-lint";

/// One record of the linter's JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawFinding {
    pub pos: String,
    pub msg: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// A linter finding resolved against the document it was reported for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub document_uri: String,
    pub range: LineRange,
    pub message: String,
    pub code: Option<String>,
    pub source: &'static str,
}

/// A finding for the linted document that carries no line information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationlessFinding {
    pub path: String,
    pub message: String,
}

impl LocationlessFinding {
    /// Message shown to the user. A missing line is a defect in ytt-lint.
    pub fn user_message(&self) -> String {
        format!(
            "ytt-lint reported \"{}\" for {} without line information. Please report this upstream.",
            self.message, self.path
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// The line component of `pos` is not a positive integer
    InvalidLine { pos: String, token: String },
    /// The line does not exist in the linted document
    LineOutOfRange { pos: String, source: PositionError },
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLine { pos, token } => {
                write!(f, "invalid line number '{}' in position '{}'", token, pos)
            }
            Self::LineOutOfRange { pos, source } => {
                write!(f, "position '{}' does not resolve: {}", pos, source)
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidLine { .. } => None,
            Self::LineOutOfRange { source, .. } => Some(source),
        }
    }
}

/// Result of parsing one run's report.
///
/// Problems are contained per record: a bad record lands in `locationless` or
/// `errors` and the remaining records are still converted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedReport {
    pub findings: Vec<Finding>,
    pub locationless: Vec<LocationlessFinding>,
    pub errors: Vec<ReportError>,
}

/// Decode the linter's stdout. `null` (an empty Go slice) decodes as no records.
pub fn decode(stdout: &str) -> Result<Vec<RawFinding>, serde_json::Error> {
    let records: Option<Vec<RawFinding>> = serde_json::from_str(stdout)?;
    Ok(records.unwrap_or_default())
}

/// Split `pos` into its path and optional line token.
fn split_pos<'a>(pos: &'a str, expected_path: &str) -> (&'a str, Option<&'a str>) {
    // Checked first so a bare Windows path like `C:\x.yaml` is not split on its drive colon
    if pos == expected_path {
        return (pos, None);
    }
    match pos.rsplit_once(':') {
        Some((path, line)) => (path, Some(line)),
        None => (pos, None),
    }
}

/// Convert raw records into findings for the document at `expected_path`.
pub fn parse(
    raw: Vec<RawFinding>,
    expected_path: &str,
    document_uri: &str,
    index: &LineIndex<'_>,
) -> ParsedReport {
    let mut report = ParsedReport::default();

    for record in raw {
        let (path, line_token) = split_pos(&record.pos, expected_path);
        if path != expected_path {
            log::debug!("Dropping finding for other file: {}", record.pos);
            continue;
        }

        let Some(token) = line_token else {
            report.locationless.push(LocationlessFinding {
                path: path.to_string(),
                message: record.msg,
            });
            continue;
        };

        let line = match token.parse::<usize>() {
            Ok(line) if line > 0 => line,
            _ => {
                report.errors.push(ReportError::InvalidLine {
                    pos: record.pos.clone(),
                    token: token.to_string(),
                });
                continue;
            }
        };

        let range = match index.resolve(line - 1) {
            Ok(range) => range,
            Err(source) => {
                report.errors.push(ReportError::LineOutOfRange {
                    pos: record.pos.clone(),
                    source,
                });
                continue;
            }
        };

        report.findings.push(Finding {
            document_uri: document_uri.to_string(),
            range,
            message: record.msg,
            code: record.code.filter(|code| !code.is_empty()),
            source: SOURCE,
        });
    }

    report
}
