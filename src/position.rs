//! Mapping linter line numbers onto document-relative highlight ranges.
//!
//! ytt-lint only reports a line number per finding. The highlighted span starts
//! after the line's leading spaces and tabs and ends at the end of the line,
//! so indentation is never underlined. Columns are counted in UTF-16
//! code units, which is what LSP clients expect.

/// A single-line highlight range (0-based line, UTF-16 columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    pub line: u32,
    pub start_character: u32,
    pub end_character: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// Requested line is not in `[0, line_count)`
    LineOutOfRange { line: usize, line_count: usize },
}

impl std::fmt::Display for PositionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LineOutOfRange { line, line_count } => write!(
                f,
                "line index {} is outside the document ({} lines)",
                line, line_count
            ),
        }
    }
}

impl std::error::Error for PositionError {}

/// Line table over a document snapshot.
///
/// Lines are split on `\n` with a trailing `\r` stripped, so a document ending
/// in a newline has a final empty line, matching how editors count lines.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    lines: Vec<&'a str>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        Self { lines }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Resolve a 0-based line index into its highlight range.
    pub fn resolve(&self, line: usize) -> Result<LineRange, PositionError> {
        let text = self
            .lines
            .get(line)
            .ok_or(PositionError::LineOutOfRange {
                line,
                line_count: self.lines.len(),
            })?;

        let end = utf16_len(text);
        let start = text
            .char_indices()
            .find(|(_, ch)| !matches!(ch, ' ' | '\t'))
            .map(|(idx, _)| utf16_len(&text[..idx]))
            .unwrap_or(end);

        Ok(LineRange {
            line: line as u32,
            start_character: start,
            end_character: end,
        })
    }
}

fn utf16_len(s: &str) -> u32 {
    s.chars().map(|c| c.len_utf16()).sum::<usize>() as u32
}
