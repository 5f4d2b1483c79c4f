/// Diagnostic formatting for parse failures
///
/// Turns a [`ParseError`] into a Rust-style report with:
/// - the file name, line and column
/// - the offending source line
/// - a caret under the failing token
use crate::error::ParseError;

/// Convert byte offset to (line, column), both 1-indexed
pub fn byte_to_line_col(source: &str, byte_offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    let mut pos = 0;

    for ch in source.chars() {
        if pos >= byte_offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
        pos += ch.len_utf8();
    }

    (line, col)
}

/// Format a parse error with a filename header and source context.
///
/// A failure at the end of input past the last line points one column past
/// the end of that line.
pub fn format_syntax_error(filename: &str, error: &ParseError, source: &str) -> String {
    let offset = error.offset().min(source.len());
    let (mut line, mut col) = byte_to_line_col(source, offset);
    let mut source_line = source.lines().nth(line.saturating_sub(1));

    // Offsets at the final newline land on an empty line that `lines` skips
    if source_line.is_none() && line > 1 {
        line -= 1;
        source_line = source.lines().nth(line - 1);
        col = source_line.map_or(0, |text| text.chars().count()) + 1;
    }
    let source_line = source_line.unwrap_or("");

    format!(
        "error: failed to parse `{}`\n\nerror: {}\n  --> {}:{}:{}\n   |\n{:3} | {}\n   | {}^\n",
        filename,
        error,
        filename,
        line,
        col,
        line,
        source_line,
        " ".repeat(col.saturating_sub(1))
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parse_module;

    #[test]
    fn test_byte_to_line_col_first_line() {
        let source = "hello world";
        assert_eq!(byte_to_line_col(source, 0), (1, 1));
        assert_eq!(byte_to_line_col(source, 6), (1, 7));
    }

    #[test]
    fn test_byte_to_line_col_multiline() {
        let source = "line1\nline2\nline3";
        assert_eq!(byte_to_line_col(source, 6), (2, 1));
        assert_eq!(byte_to_line_col(source, 14), (3, 3));
    }

    #[test]
    fn test_caret_points_at_failing_token() {
        let source = "x = 1\ny = )\n";
        let err = parse_module(source).unwrap_err();
        let report = format_syntax_error("demo.py", &err, source);
        assert!(report.starts_with("error: failed to parse `demo.py`"));
        assert!(report.contains("  --> demo.py:2:"));
        assert!(report.contains("  2 | y = )"));
        let caret = report.lines().last().unwrap();
        assert!(caret.ends_with('^'));
    }

    #[test]
    fn test_location_matches_offset() {
        let source = "x = 1\nif y:\n    z = )\n";
        let err = parse_module(source).unwrap_err();
        assert_eq!(err.location(), byte_to_line_col(source, err.offset()));
    }

    #[test]
    fn test_failure_at_end_of_input_stays_on_last_line() {
        let source = "while x\n";
        let err = parse_module(source).unwrap_err();
        let report = format_syntax_error("loop.py", &err, source);
        assert!(report.contains("  1 | while x"));
    }

    #[test]
    fn test_lex_errors_are_reported_too() {
        let source = "s = 'open\n";
        let err = parse_module(source).unwrap_err();
        let report = format_syntax_error("<stdin>", &err, source);
        assert!(report.contains("Lex error"));
        assert!(report.contains("<stdin>:1:"));
    }
}
