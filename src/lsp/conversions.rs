use tower_lsp_server::ls_types::*;

use crate::report::Finding;

/// Convert an LSP position (UTF-16 columns) to a byte offset in `text`.
///
/// Columns past the end of a line clamp to the line end. Returns `None`
/// when the line does not exist.
pub(crate) fn position_to_offset(text: &str, position: Position) -> Option<usize> {
    let mut offset = 0;

    for (index, line) in text.split('\n').enumerate() {
        if index == position.line as usize {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let mut utf16_offset = 0;
            for (byte_idx, ch) in line.char_indices() {
                if utf16_offset >= position.character as usize {
                    return Some(offset + byte_idx);
                }
                utf16_offset += ch.len_utf16();
            }
            return Some(offset + line.len());
        }
        // +1 for the newline
        offset += line.len() + 1;
    }

    None
}

/// Apply a single content change to text
pub(crate) fn apply_content_change(text: &str, change: &TextDocumentContentChangeEvent) -> String {
    match &change.range {
        Some(range) => {
            let start_offset = position_to_offset(text, range.start).unwrap_or(text.len());
            let end_offset = position_to_offset(text, range.end)
                .unwrap_or(text.len())
                .max(start_offset);

            let mut result =
                String::with_capacity(text.len() - (end_offset - start_offset) + change.text.len());
            result.push_str(&text[..start_offset]);
            result.push_str(&change.text);
            result.push_str(&text[end_offset..]);
            result
        }
        None => change.text.clone(),
    }
}

/// Convert a finding to an LSP diagnostic. ytt-lint only reports errors.
pub(crate) fn finding_to_diagnostic(finding: &Finding) -> Diagnostic {
    let range = Range {
        start: Position {
            line: finding.range.line,
            character: finding.range.start_character,
        },
        end: Position {
            line: finding.range.line,
            character: finding.range.end_character,
        },
    };

    Diagnostic {
        range,
        severity: Some(DiagnosticSeverity::ERROR),
        code: finding.code.clone().map(NumberOrString::String),
        source: Some(finding.source.to_string()),
        message: finding.message.clone(),
        ..Default::default()
    }
}
