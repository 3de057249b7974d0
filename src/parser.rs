//! The single-pass parser turning a text buffer into row and cell spans.
//!
//! Fields are tracked as `(start, len)` pairs into the buffer. An unquoted field only
//! ever grows by one byte at a time, so no field text is ever copied or concatenated.

use memchr::{memchr, memchr3};
use tracing::{debug, trace};

use crate::error::*;

const FIELD_DELIMITER: u8 = b',';
const ROW_TERMINATOR: u8 = b'\n';
const QUOTE: u8 = b'"';
const ESCAPE: u8 = b'\\';

// characters of the offending line kept in a `MalformedQuotedField` error
const CONTEXT_CHARS: usize = 64;

/// A byte range of the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) start: usize,
    pub(crate) len: usize,
}

impl Span {
    fn empty_at(start: usize) -> Span {
        Span { start, len: 0 }
    }

    pub(crate) fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellSpan {
    pub(crate) span: Span,
    /// The field was enclosed in quotes (which `span` excludes).
    pub(crate) quoted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RowSpan {
    /// Raw line text, terminator excluded.
    pub(crate) source: Span,
    /// Index of the row's first cell in `Parsed::cells`.
    pub(crate) first_cell: usize,
    pub(crate) n_cells: usize,
    /// 1-based line number in the buffer.
    pub(crate) line: usize,
}

/// Output of a successful parse. Cells of all rows are stored back to back.
#[derive(Debug, Default)]
pub(crate) struct Parsed {
    pub(crate) rows: Vec<RowSpan>,
    pub(crate) cells: Vec<CellSpan>,
}

/// Parses `text` in one pass. `label` only appears in errors.
pub(crate) fn parse(text: &str, label: &str) -> Result<Parsed> {
    let mut parser = Parser::new(text, label);
    parser.run()?;
    debug!(
        label,
        rows = parser.out.rows.len(),
        cells = parser.out.cells.len(),
        "parsed table"
    );
    Ok(parser.out)
}

struct Parser<'a> {
    text: &'a str,
    buf: &'a [u8],
    label: &'a str,
    out: Parsed,

    // in-progress unquoted field
    field: Option<Span>,
    // the last thing closed on this row was a field followed by a delimiter
    after_delimiter: bool,
    row_first_cell: usize,
    row_start: usize,
    last_width: usize,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, label: &'a str) -> Parser<'a> {
        Parser {
            text,
            buf: text.as_bytes(),
            label,
            out: Parsed::default(),
            field: None,
            after_delimiter: false,
            row_first_cell: 0,
            row_start: 0,
            last_width: 0,
            line: 1,
        }
    }

    fn run(&mut self) -> Result<()> {
        let mut pos = 0;
        while pos < self.buf.len() {
            pos = match self.buf[pos] {
                ROW_TERMINATOR => {
                    self.end_row(pos);
                    pos + 1
                }
                FIELD_DELIMITER => {
                    self.close_field(pos);
                    pos + 1
                }
                QUOTE if self.field.is_none() => self.quoted_field(pos)?,
                _ => {
                    self.extend_field(pos);
                    pos + 1
                }
            };
        }
        // last line without a terminator
        if self.row_start < self.buf.len() {
            self.end_row(self.buf.len());
        }
        Ok(())
    }

    fn push_cell(&mut self, span: Span, quoted: bool) {
        self.out.cells.push(CellSpan { span, quoted });
    }

    fn extend_field(&mut self, pos: usize) {
        match self.field {
            Some(ref mut span) => span.len += 1,
            None => self.field = Some(Span { start: pos, len: 1 }),
        }
        self.after_delimiter = false;
    }

    // `pos` is the delimiter's position
    fn close_field(&mut self, pos: usize) {
        let span = self.field.take().unwrap_or(Span::empty_at(pos));
        self.push_cell(span, false);
        self.after_delimiter = true;
    }

    // `pos` is the terminator's position, or the buffer length
    fn end_row(&mut self, pos: usize) {
        if let Some(span) = self.field.take() {
            self.push_cell(span, false);
        } else if self.after_delimiter {
            self.push_cell(Span::empty_at(pos), false);
        }
        self.after_delimiter = false;

        let n_cells = self.out.cells.len() - self.row_first_cell;
        if n_cells > 0 {
            self.out.rows.push(RowSpan {
                source: Span { start: self.row_start, len: pos - self.row_start },
                first_cell: self.row_first_cell,
                n_cells,
                line: self.line,
            });
            self.last_width = n_cells;
        } else {
            trace!(label = self.label, line = self.line, "skipping blank line");
        }

        self.out.cells.reserve(self.last_width);
        self.row_first_cell = self.out.cells.len();
        self.row_start = pos + 1;
        self.line += 1;
    }

    // `open` is the position of the opening quote; returns the position to resume at
    fn quoted_field(&mut self, open: usize) -> Result<usize> {
        let start = open + 1;
        let mut cursor = start;
        let close = loop {
            let at = match memchr3(QUOTE, ESCAPE, ROW_TERMINATOR, &self.buf[cursor..]) {
                Some(offset) => cursor + offset,
                None => return Err(self.malformed(QuoteFault::Unterminated)),
            };
            match self.buf[at] {
                ESCAPE if self.buf.get(at + 1) == Some(&QUOTE) => cursor = at + 2,
                ESCAPE => cursor = at + 1,
                ROW_TERMINATOR => return Err(self.malformed(QuoteFault::Unterminated)),
                _ => break at,
            }
        };
        self.push_cell(Span { start, len: close - start }, true);
        self.after_delimiter = false;

        let next = close + 1;
        match self.buf.get(next) {
            Some(&FIELD_DELIMITER) => {
                self.after_delimiter = true;
                Ok(next + 1)
            }
            Some(&ROW_TERMINATOR) | None => Ok(next),
            Some(&byte) => Err(self.malformed(QuoteFault::UnexpectedByte(byte))),
        }
    }

    fn malformed(&self, fault: QuoteFault) -> Error {
        let rest = &self.text[self.row_start..];
        let end = memchr(ROW_TERMINATOR, rest.as_bytes()).unwrap_or(rest.len());
        Error::MalformedQuotedField {
            label: self.label.to_string(),
            line: self.line,
            fault,
            context: rest[..end].chars().take(CONTEXT_CHARS).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(text: &str) -> Vec<Vec<&str>> {
        let parsed = parse(text, "test").unwrap();
        parsed
            .rows
            .iter()
            .map(|row| {
                parsed.cells[row.first_cell..row.first_cell + row.n_cells]
                    .iter()
                    .map(|cell| &text[cell.span.start..cell.span.end()])
                    .collect()
            })
            .collect()
    }

    fn fault(text: &str) -> (usize, QuoteFault) {
        match parse(text, "test").unwrap_err() {
            Error::MalformedQuotedField { line, fault, .. } => (line, fault),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn unquoted() {
        assert_eq!(cells("1,2\n3,4\n"), vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn empty_buffer() {
        let parsed = parse("", "test").unwrap();
        assert!(parsed.rows.is_empty());
        assert!(parsed.cells.is_empty());
    }

    #[test]
    fn empty_fields() {
        assert_eq!(cells(",a,,b\n"), vec![vec!["", "a", "", "b"]]);
        assert_eq!(cells(",\n"), vec![vec!["", ""]]);
    }

    #[test]
    fn trailing_delimiter() {
        assert_eq!(cells("1,2,\n3,4,"), vec![vec!["1", "2", ""], vec!["3", "4", ""]]);
    }

    #[test]
    fn blank_lines_dropped() {
        let parsed = parse("\n1,2\n\n\n3,4\n\n", "test").unwrap();
        let lines: Vec<usize> = parsed.rows.iter().map(|row| row.line).collect();
        assert_eq!(lines, vec![2, 5]);
    }

    #[test]
    fn row_storage_follows_kept_rows() {
        // storage is grown from the rows actually kept, not sized from the line count
        let text = format!("1,2\n{}3,4\n", "\n".repeat(200));
        let parsed = parse(&text, "test").unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert!(parsed.rows.capacity() < 16);
        assert_eq!(parsed.rows[1].line, 202);
    }

    #[test]
    fn row_sources() {
        let text = "a,\"b\"\n\nc,d";
        let parsed = parse(text, "test").unwrap();
        let sources: Vec<&str> = parsed
            .rows
            .iter()
            .map(|row| &text[row.source.start..row.source.end()])
            .collect();
        assert_eq!(sources, vec!["a,\"b\"", "c,d"]);
    }

    #[test]
    fn quoted() {
        assert_eq!(
            cells("3,\"hello\",\n\"there\",2\n"),
            vec![vec!["3", "hello", ""], vec!["there", "2"]]
        );
        let parsed = parse("\"a\",b\n", "test").unwrap();
        assert!(parsed.cells[0].quoted);
        assert!(!parsed.cells[1].quoted);
    }

    #[test]
    fn quoted_at_row_end() {
        assert_eq!(cells("1,\"x\"\n2,\"y\""), vec![vec!["1", "x"], vec!["2", "y"]]);
    }

    #[test]
    fn quoted_keeps_delimiters() {
        assert_eq!(cells("\"a,b\",c\n"), vec![vec!["a,b", "c"]]);
        assert_eq!(cells("\"\",x\n"), vec![vec!["", "x"]]);
    }

    #[test]
    fn escaped_quote_stays_raw() {
        assert_eq!(cells("\"a\\\"b\",1\n"), vec![vec!["a\\\"b", "1"]]);
        assert_eq!(cells("\"\\\"\"\n"), vec![vec!["\\\""]]);
        // a lone backslash is an ordinary byte
        assert_eq!(cells("\"a\\b\"\n"), vec![vec!["a\\b"]]);
    }

    #[test]
    fn quote_mid_field_is_ordinary() {
        assert_eq!(cells("ab\"c,d\"\n"), vec![vec!["ab\"c", "d\""]]);
    }

    #[test]
    fn junk_after_closing_quote() {
        assert_eq!(fault("1,2\n\"hello\"x,2\n"), (2, QuoteFault::UnexpectedByte(b'x')));
        assert_eq!(fault("\n\n\"a\" ,b"), (3, QuoteFault::UnexpectedByte(b' ')));
    }

    #[test]
    fn unterminated_quote() {
        assert_eq!(fault("a\n\"open,b\nc\n"), (2, QuoteFault::Unterminated));
        assert_eq!(fault("\"open"), (1, QuoteFault::Unterminated));
        assert_eq!(fault("\"ends with escape\\\""), (1, QuoteFault::Unterminated));
    }

    #[test]
    fn error_context_is_the_line() {
        match parse("ok\n\"a\"b,c\nnext\n", "f.csv").unwrap_err() {
            Error::MalformedQuotedField { label, context, .. } => {
                assert_eq!(label, "f.csv");
                assert_eq!(context, "\"a\"b,c");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn error_context_is_truncated() {
        let text = format!("\"a\"b{}\n", "x".repeat(100));
        match parse(&text, "test").unwrap_err() {
            Error::MalformedQuotedField { context, .. } => {
                assert_eq!(context.chars().count(), CONTEXT_CHARS)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
