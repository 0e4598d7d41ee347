//! Cell and row model over a UTF-8 source buffer.
//!
//! The reader indexes the source once into rows of cell spans; decoding to
//! strings happens on demand. Spans keep their surrounding quotes so that
//! both the quoted and the unquoted view stay available.

use std::borrow::Cow;

use tabcast_helpers::IndexMap;

use crate::encoding::char_count;
use crate::errors::{Result, TabError};

/// How cell views are trimmed. Trimming operates on the view, never on the
/// source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimPolicy {
    /// Strip trailing carriage returns only (CRLF robustness).
    #[default]
    CrOnly,
    /// Additionally strip whitespace following the delimiter
    /// (`-S/--skipinitialspace`).
    InitSpace,
}

/// A field: a byte range into the source buffer. Whether the view strips the
/// surrounding quotes is decided at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub delimiter: u8,
    pub quote: u8,
    pub trim: TrimPolicy,
    /// Maximum field length in UTF-8 scalar values.
    pub max_field_size: Option<usize>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            delimiter: b',',
            quote: b'"',
            trim: TrimPolicy::CrOnly,
            max_field_size: None,
        }
    }
}

#[derive(Debug)]
pub struct Reader<'a> {
    src: &'a str,
    rows: Vec<Vec<CellSpan>>,
    cursor: usize,
    quote: u8,
    trim: TrimPolicy,
}

impl<'a> Reader<'a> {
    pub fn new(src: &'a str, options: &ReaderOptions) -> Result<Self> {
        let rows = split_rows(src, options.delimiter, options.quote);
        let reader = Reader {
            src,
            rows,
            cursor: 0,
            quote: options.quote,
            trim: options.trim,
        };
        if let Some(limit) = options.max_field_size {
            reader.check_field_sizes(limit)?;
        }
        Ok(reader)
    }

    /// Total number of rows in the source, regardless of the cursor.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column count as declared by the first row at the cursor.
    pub fn col_count(&self) -> usize {
        self.rows.get(self.cursor).map_or(0, Vec::len)
    }

    /// Reposition the cursor to the `n`th row of the source. Positions past
    /// the end leave nothing to read.
    pub fn skip_rows(&mut self, n: usize) {
        self.cursor = n.min(self.rows.len());
    }

    /// Advance the cursor by `n` rows.
    pub fn advance(&mut self, n: usize) {
        self.cursor = (self.cursor + n).min(self.rows.len());
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The first row at the cursor, i.e. the header row when the input has
    /// one.
    pub fn header_row(&self) -> Option<&[CellSpan]> {
        self.rows.get(self.cursor).map(Vec::as_slice)
    }

    /// Rows from the cursor to the end, in input order.
    pub fn remaining_rows(&self) -> &[Vec<CellSpan>] {
        &self.rows[self.cursor..]
    }

    /// Single-pass visitation of every row from the cursor.
    pub fn run_rows<F: FnMut(&[CellSpan]) -> Result<()>>(&self, mut visitor: F) -> Result<()> {
        for row in self.remaining_rows() {
            visitor(row)?;
        }
        Ok(())
    }

    /// Decoded view of a cell: outer quotes stripped, doubled quotes
    /// collapsed, trim policy applied.
    pub fn decoded(&self, span: CellSpan) -> Cow<'a, str> {
        decode_cell(&self.src[span.start..span.end], self.quote, self.trim)
    }

    /// Raw view of a cell with only the trim policy applied; quotes stay.
    pub fn raw(&self, span: CellSpan) -> &'a str {
        trim_view(&self.src[span.start..span.end], self.trim)
    }

    /// Quick matrix integrity check: every row must have the same number of
    /// columns. `line_offset` shifts reported line numbers by the number of
    /// lines skipped before the cursor.
    pub fn shape_check(&self, line_offset: usize) -> Result<()> {
        let mut arities: IndexMap<usize, usize> = IndexMap::default();
        for (i, row) in self.remaining_rows().iter().enumerate() {
            arities.entry(row.len()).or_insert(i + 1 + line_offset);
        }
        if arities.len() <= 1 {
            return Ok(());
        }
        let mut cols: Vec<String> = arities.keys().map(usize::to_string).collect();
        cols.sort();
        let rows: Vec<String> = arities.values().map(usize::to_string).collect();
        Err(TabError::Shape(format!(
            "The document has different numbers of columns: {} at least at rows: {}.\n\
             Either use the -K option for alignment, or use the clean command to fix it.",
            cols.join(" "),
            rows.join(" ")
        )))
    }

    fn check_field_sizes(&self, limit: usize) -> Result<()> {
        for (i, row) in self.rows.iter().enumerate() {
            for span in row {
                if char_count(&self.decoded(*span)) > limit {
                    return Err(TabError::FieldSizeLimit { limit, row: i + 1 });
                }
            }
        }
        Ok(())
    }
}

fn trim_view(raw: &str, trim: TrimPolicy) -> &str {
    match trim {
        TrimPolicy::CrOnly => raw.trim_end_matches('\r'),
        TrimPolicy::InitSpace => raw
            .trim_start_matches([' ', '\t', '\r'])
            .trim_end_matches('\r'),
    }
}

fn decode_cell<'a>(raw: &'a str, quote: u8, trim: TrimPolicy) -> Cow<'a, str> {
    let trimmed = trim_view(raw, trim);
    let q = quote as char;
    let quoted = trimmed.len() >= 2 && trimmed.starts_with(q) && trimmed.ends_with(q);
    if quoted {
        let inner = &trimmed[1..trimmed.len() - 1];
        let doubled: String = [q, q].iter().collect();
        if inner.contains(&doubled) {
            Cow::Owned(inner.replace(&doubled, &q.to_string()))
        } else {
            Cow::Borrowed(inner)
        }
    } else {
        Cow::Borrowed(trimmed)
    }
}

/// Split the source into rows of cell spans. Quoted fields may contain the
/// delimiter and embedded line breaks; two quote chars inside a quoted field
/// are one literal quote. LF, CR and CRLF all end a row.
fn split_rows(src: &str, delimiter: u8, quote: u8) -> Vec<Vec<CellSpan>> {
    let bytes = src.as_bytes();
    let mut rows = Vec::new();
    let mut row: Vec<CellSpan> = Vec::new();
    let mut field_start = 0usize;
    let mut in_quotes = false;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if b == quote {
            in_quotes = !in_quotes;
            i += 1;
        } else if !in_quotes && b == delimiter {
            row.push(CellSpan {
                start: field_start,
                end: i,
            });
            i += 1;
            field_start = i;
        } else if !in_quotes && (b == b'\n' || b == b'\r') {
            row.push(CellSpan {
                start: field_start,
                end: i,
            });
            rows.push(std::mem::take(&mut row));
            if b == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
                i += 2;
            } else {
                i += 1;
            }
            field_start = i;
        } else {
            i += 1;
        }
    }
    if field_start < bytes.len() || !row.is_empty() {
        row.push(CellSpan {
            start: field_start,
            end: bytes.len(),
        });
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn all_decoded(src: &str) -> Vec<Vec<String>> {
        let reader = Reader::new(src, &ReaderOptions::default()).unwrap();
        reader
            .remaining_rows()
            .iter()
            .map(|row| row.iter().map(|s| reader.decoded(*s).into_owned()).collect())
            .collect()
    }

    #[test]
    fn plain_rows() {
        assert_eq!(
            all_decoded("a,b,c\n1,2,3\n"),
            vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]
        );
    }

    #[test]
    fn crlf_and_bare_cr_line_breaks() {
        assert_eq!(all_decoded("a,b\r\n1,2\r3,4"), vec![
            vec!["a", "b"],
            vec!["1", "2"],
            vec!["3", "4"],
        ]);
    }

    #[test]
    fn quoted_field_with_delimiter_and_newline() {
        assert_eq!(
            all_decoded("a,\"x,y\nz\",c\n"),
            vec![vec!["a".to_string(), "x,y\nz".to_string(), "c".to_string()]]
        );
    }

    #[test]
    fn doubled_quotes_collapse_on_decode() {
        let src = "\"he said \"\"hi\"\"\"\n";
        assert_eq!(all_decoded(src), vec![vec!["he said \"hi\""]]);
        // the raw view keeps them
        let reader = Reader::new(src, &ReaderOptions::default()).unwrap();
        let span = reader.remaining_rows()[0][0];
        assert_eq!(reader.raw(span), "\"he said \"\"hi\"\"\"");
    }

    #[test]
    fn empty_line_is_a_single_empty_cell() {
        assert_eq!(all_decoded("h3\n\nghi"), vec![
            vec!["h3"],
            vec![""],
            vec!["ghi"],
        ]);
    }

    #[test]
    fn skip_initial_space_trims_the_view() {
        let opts = ReaderOptions {
            trim: TrimPolicy::InitSpace,
            ..Default::default()
        };
        let reader = Reader::new("a, b,  \"c\"\n", &opts).unwrap();
        let row = &reader.remaining_rows()[0];
        let decoded: Vec<String> = row.iter().map(|s| reader.decoded(*s).into_owned()).collect();
        assert_eq!(decoded, vec!["a", "b", "c"]);
    }

    #[test]
    fn run_rows_visits_from_the_cursor() {
        let mut reader = Reader::new("h\n1\n2\n", &ReaderOptions::default()).unwrap();
        reader.advance(1);
        let mut seen = Vec::new();
        reader
            .run_rows(|row| {
                seen.push(reader.decoded(row[0]).into_owned());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec!["1", "2"]);
    }

    #[test]
    fn cursor_repositioning() {
        let mut reader = Reader::new("a\nb\nc\n", &ReaderOptions::default()).unwrap();
        reader.skip_rows(2);
        assert_eq!(reader.remaining_rows().len(), 1);
        reader.skip_rows(0);
        assert_eq!(reader.remaining_rows().len(), 3);
        // skipping past the end leaves nothing
        reader.skip_rows(10);
        assert!(reader.remaining_rows().is_empty());
    }

    #[test]
    fn field_size_limit_carries_the_row() {
        let opts = ReaderOptions {
            max_field_size: Some(3),
            ..Default::default()
        };
        let err = Reader::new("ab,cd\nabcd,e\n", &opts).unwrap_err();
        match err {
            TabError::FieldSizeLimit { limit, row } => {
                assert_eq!((limit, row), (3, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn field_size_counts_scalars_not_bytes() {
        let opts = ReaderOptions {
            max_field_size: Some(3),
            ..Default::default()
        };
        // three scalars, nine bytes
        assert!(Reader::new("日本語\n", &opts).is_ok());
    }

    #[test]
    fn shape_check_reports_arity_mix() {
        let reader = Reader::new("a,b,c\n1,2\n", &ReaderOptions::default()).unwrap();
        let err = reader.shape_check(0).unwrap_err();
        assert!(err.to_string().contains("different numbers of columns"));
        let ok = Reader::new("a,b\n1,2\n", &ReaderOptions::default()).unwrap();
        assert!(ok.shape_check(0).is_ok());
    }
}
