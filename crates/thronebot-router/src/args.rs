//! Command argument tokenizer.
//!
//! Commands are split with CSV quoting rules where the field delimiter is a
//! single space:
//!
//! - `a b c` splits into `a`, `b`, `c`;
//! - `"a b" c` keeps the quoted space: `a b`, `c`;
//! - inside quotes a doubled quote is a literal quote: `"say ""hi"""` is
//!   `say "hi"`;
//! - consecutive spaces produce empty arguments.
//!
//! Only the first record (line) of the input is read. If the quoting is
//! malformed the tokenizer degrades to a naive split on single spaces, so
//! tokenization never fails and an unparsable command still reaches the router
//! for a "not found" answer.

use std::fmt;
use std::ops::Deref;

use thiserror::Error;
use tracing::trace;

/// Field delimiter used both for parsing and for re-joining arguments.
pub const SEPARATOR: &str = " ";

// ============================================================================
// Args
// ============================================================================

/// An ordered list of command arguments.
///
/// Dereferences to `[String]`, so slice methods (`len`, `iter`, indexing) are
/// available directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(Vec<String>);

impl Args {
    pub fn new(args: Vec<String>) -> Self {
        Self(args)
    }

    /// Returns the n-th argument, or `""` when out of range.
    pub fn get(&self, n: usize) -> &str {
        self.0.get(n).map(String::as_str).unwrap_or("")
    }

    /// Joins every argument from `n` onwards with single spaces.
    ///
    /// Returns `""` when `n` is out of range.
    pub fn after(&self, n: usize) -> String {
        match self.0.get(n..) {
            Some(rest) if !rest.is_empty() => rest.join(SEPARATOR),
            _ => String::new(),
        }
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for Args {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<String>> for Args {
    fn from(args: Vec<String>) -> Self {
        Self(args)
    }
}

impl<S: Into<String>> FromIterator<S> for Args {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.after(0))
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Splits a raw command string into arguments.
///
/// Empty input has no record to read, so it takes the fallback path and
/// yields a single empty argument.
pub fn parse_args(content: &str) -> Args {
    match read_record(content) {
        Ok(fields) => Args(fields),
        Err(err) => {
            trace!(error = %err, "structured argument parse failed, splitting on spaces");
            Args(content.split(SEPARATOR).map(str::to_owned).collect())
        }
    }
}

/// Why a structured parse was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
enum CsvError {
    #[error("input contains no record")]
    NoRecord,
    #[error("bare \" in non-quoted field")]
    BareQuote,
    #[error("extraneous or missing \" in quoted field")]
    Quote,
}

/// Yields the input line by line, newline included.
///
/// A trailing `\r\n` is normalised to `\n`; a `\r` right before end of input is
/// dropped.
struct Lines<'a> {
    rest: &'a str,
}

impl<'a> Lines<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn next_line(&mut self) -> Option<String> {
        if self.rest.is_empty() {
            return None;
        }
        let (line, rest) = match self.rest.find('\n') {
            Some(i) => self.rest.split_at(i + 1),
            None => (self.rest, ""),
        };
        self.rest = rest;

        let line = if let Some(body) = line.strip_suffix("\r\n") {
            format!("{body}\n")
        } else if let Some(body) = line.strip_suffix('\r').filter(|_| rest.is_empty()) {
            body.to_owned()
        } else {
            line.to_owned()
        };
        Some(line)
    }
}

fn is_line_end(s: &str) -> bool {
    s.is_empty() || s == "\n"
}

/// Reads the first non-blank record of `input`.
fn read_record(input: &str) -> Result<Vec<String>, CsvError> {
    let mut lines = Lines::new(input);
    let mut line = loop {
        match lines.next_line() {
            None => return Err(CsvError::NoRecord),
            Some(line) if line == "\n" => continue,
            Some(line) => break line,
        }
    };

    let mut fields = Vec::new();
    let mut pos = 0;

    'fields: loop {
        let rest = &line[pos..];

        if !rest.starts_with('"') {
            let (field, next) = match rest.find(SEPARATOR) {
                Some(i) => (&rest[..i], Some(pos + i + SEPARATOR.len())),
                None => (rest.strip_suffix('\n').unwrap_or(rest), None),
            };
            if field.contains('"') {
                return Err(CsvError::BareQuote);
            }
            fields.push(field.to_owned());
            match next {
                Some(next) => {
                    pos = next;
                    continue 'fields;
                }
                None => break 'fields,
            }
        }

        // Quoted field; may continue over several lines.
        pos += 1;
        let mut field = String::new();
        loop {
            let rest = &line[pos..];
            if let Some(i) = rest.find('"') {
                field.push_str(&rest[..i]);
                pos += i + 1;
                let after = &line[pos..];
                if after.starts_with('"') {
                    field.push('"');
                    pos += 1;
                } else if after.starts_with(SEPARATOR) {
                    pos += SEPARATOR.len();
                    fields.push(field);
                    continue 'fields;
                } else if is_line_end(after) {
                    fields.push(field);
                    break 'fields;
                } else {
                    return Err(CsvError::Quote);
                }
            } else if !rest.is_empty() {
                field.push_str(rest);
                match lines.next_line() {
                    Some(next) => {
                        line = next;
                        pos = 0;
                    }
                    None => return Err(CsvError::Quote),
                }
            } else {
                return Err(CsvError::Quote);
            }
        }
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Vec<String> {
        parse_args(s).into_inner()
    }

    #[test]
    fn test_parse_simple() {
        assert_eq!(parse("a b c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_quoted_keeps_space() {
        assert_eq!(parse(r#""a b" c"#), vec!["a b", "c"]);
    }

    #[test]
    fn test_parse_escaped_quote() {
        assert_eq!(parse(r#"say "he said ""hi""""#), vec!["say", r#"he said "hi""#]);
    }

    #[test]
    fn test_parse_consecutive_spaces_keep_empty_fields() {
        assert_eq!(parse("a  b"), vec!["a", "", "b"]);
        assert_eq!(parse("a b "), vec!["a", "b", ""]);
    }

    #[test]
    fn test_parse_unterminated_quote_falls_back() {
        assert_eq!(parse(r#""a b c"#), vec![r#""a"#, "b", "c"]);
    }

    #[test]
    fn test_parse_bare_quote_falls_back() {
        assert_eq!(parse(r#"ab"c d"#), vec![r#"ab"c"#, "d"]);
    }

    #[test]
    fn test_parse_text_after_closing_quote_falls_back() {
        assert_eq!(parse(r#""a"b c"#), vec![r#""a"b"#, "c"]);
    }

    #[test]
    fn test_parse_empty_yields_single_empty_token() {
        assert_eq!(parse(""), vec![""]);
    }

    #[test]
    fn test_parse_reads_first_line_only() {
        assert_eq!(parse("a b\nc d"), vec!["a", "b"]);
        assert_eq!(parse("a b\r\nc"), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_skips_leading_blank_lines() {
        assert_eq!(parse("\n\r\nweekly banned"), vec!["weekly", "banned"]);
    }

    #[test]
    fn test_parse_quoted_field_spans_lines() {
        assert_eq!(parse("note \"line one\nline two\" end"), vec![
            "note",
            "line one\nline two",
            "end"
        ]);
    }

    #[test]
    fn test_parse_trailing_carriage_return_dropped() {
        assert_eq!(parse("ping\r"), vec!["ping"]);
    }

    #[test]
    fn test_unquoted_round_trip_by_join() {
        let raw = "weekly ban add crown crown of blood";
        assert_eq!(parse_args(raw).after(0), raw);
    }

    #[test]
    fn test_args_get_and_after() {
        let args: Args = ["weekly ban", "add", "crown", "crown", "of", "blood"]
            .into_iter()
            .collect();
        assert_eq!(args.get(1), "add");
        assert_eq!(args.get(42), "");
        assert_eq!(args.after(3), "crown of blood");
        assert_eq!(args.after(6), "");
        assert_eq!(args.len(), 6);
    }
}
