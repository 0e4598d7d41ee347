//! Materialised tables: a header plus row-major decoded cells.

use crate::errors::{Result, TabError};
use crate::reader::Reader;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Table {
        Table { header, rows }
    }

    /// Materialise a table from the reader's cursor. With `no_header`,
    /// generated column names (`a`, `b`, …) are used and every row is data.
    ///
    /// Every row must match the header arity.
    pub fn from_reader(reader: &Reader, no_header: bool) -> Result<Table> {
        let first = reader
            .header_row()
            .ok_or_else(|| TabError::Shape("Header is empty: no data anymore.".into()))?;
        let header = if no_header {
            letter_names(first.len())
        } else {
            mangle_duplicates(
                first
                    .iter()
                    .map(|s| reader.decoded(*s).into_owned())
                    .collect(),
            )
        };

        let body = reader.remaining_rows();
        let body = if no_header { body } else { &body[1..] };
        let mut rows = Vec::with_capacity(body.len());
        for row in body {
            if row.len() != header.len() {
                return Err(TabError::Shape(
                    "The number of header and data columns do not match. Use -K option to align."
                        .into(),
                ));
            }
            rows.push(row.iter().map(|s| reader.decoded(*s).into_owned()).collect());
        }
        Ok(Table::new(header, rows))
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }
}

/// Rename duplicate column names by appending `_<k>` with the smallest
/// `k >= 2` that makes the result unique.
pub fn mangle_duplicates(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name) {
            out.push(name);
            continue;
        }
        let mut k = 2usize;
        loop {
            let candidate = format!("{name}_{k}");
            if !out.contains(&candidate) {
                out.push(candidate);
                break;
            }
            k += 1;
        }
    }
    out
}

/// Substitute column names for headerless input: `a`..`z`, then doubled
/// letters.
pub fn letter_names(n: usize) -> Vec<String> {
    (0..n).map(letter_name).collect()
}

fn letter_name(mut column: usize) -> String {
    const LETTERS: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";
    let mut s = String::new();
    while column >= LETTERS.len() {
        s.push(LETTERS[column % LETTERS.len()] as char);
        column -= LETTERS.len();
    }
    s.push(LETTERS[column] as char);
    s
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::reader::ReaderOptions;

    #[test]
    fn header_and_body() {
        let reader = Reader::new("a,b\n1,2\n3,4\n", &ReaderOptions::default()).unwrap();
        let table = Table::from_reader(&reader, false).unwrap();
        assert_eq!(table.header, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn no_header_generates_names() {
        let reader = Reader::new("1,2,3\n", &ReaderOptions::default()).unwrap();
        let table = Table::from_reader(&reader, true).unwrap();
        assert_eq!(table.header, vec!["a", "b", "c"]);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn ragged_row_is_a_shape_error() {
        let reader = Reader::new("a,b\n1,2,3\n", &ReaderOptions::default()).unwrap();
        assert!(Table::from_reader(&reader, false).is_err());
    }

    #[test]
    fn duplicate_headers_are_mangled() {
        let names = vec!["id".to_string(), "id".to_string(), "id_2".to_string()];
        assert_eq!(mangle_duplicates(names), vec!["id", "id_2", "id_3"]);
    }

    #[test]
    fn letter_names_wrap_after_z() {
        let names = letter_names(28);
        assert_eq!(names[0], "a");
        assert_eq!(names[25], "z");
        assert_eq!(names[26], "aa");
    }
}
