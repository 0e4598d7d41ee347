//! Input acquisition shared by every operation: read a file or stdin to
//! bytes, recode to UTF-8, and construct the reader at the right row.

use std::io::Read;
use std::path::Path;

use tabcast_lib_core::encoding;
use tabcast_lib_core::errors::{Result, TabError};
use tabcast_lib_core::reader::{Reader, ReaderOptions, TrimPolicy};
use tabcast_lib_core::table::Table;

#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub encoding: String,
    pub skip_init_space: bool,
    pub no_header: bool,
    pub skip_lines: usize,
    pub max_field_size: Option<usize>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        SourceOptions {
            encoding: "UTF-8".into(),
            skip_init_space: false,
            no_header: false,
            skip_lines: 0,
            max_field_size: None,
        }
    }
}

impl SourceOptions {
    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            trim: if self.skip_init_space {
                TrimPolicy::InitSpace
            } else {
                TrimPolicy::CrOnly
            },
            max_field_size: self.max_field_size,
            ..Default::default()
        }
    }
}

/// Read the whole source. `None` or `-` means stdin.
pub fn load_bytes(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(p) if p.as_os_str() != "-" => {
            std::fs::read(p).map_err(|e| TabError::io_path(p, e))
        }
        _ => {
            let mut buf = Vec::new();
            std::io::stdin().lock().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Load a source and recode it to UTF-8 under the configured encoding.
pub fn load_text(path: Option<&Path>, options: &SourceOptions) -> Result<String> {
    let bytes = load_bytes(path)?;
    encoding::recode(&bytes, &options.encoding)
}

/// Build a reader over recoded text, positioned past `--skip-lines`.
pub fn open_reader<'a>(text: &'a str, options: &SourceOptions) -> Result<Reader<'a>> {
    let mut reader = Reader::new(text, &options.reader_options())?;
    reader.skip_rows(options.skip_lines);
    Ok(reader)
}

/// Materialise a table from recoded text: skip lines, check the shape,
/// split off the header.
pub fn read_table(text: &str, options: &SourceOptions) -> Result<Table> {
    let reader = open_reader(text, options)?;
    Table::from_reader(&reader, options.no_header)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn skip_lines_positions_the_header() {
        let options = SourceOptions {
            skip_lines: 2,
            ..Default::default()
        };
        let table = read_table("junk\nmore junk\na,b\n1,2\n", &options).unwrap();
        assert_eq!(table.header, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1", "2"]]);
    }

    #[test]
    fn encoded_source_is_recoded() {
        let options = SourceOptions {
            encoding: "latin1".into(),
            ..Default::default()
        };
        let text = tabcast_lib_core::encoding::recode(b"name\ncaf\xe9\n", &options.encoding).unwrap();
        let table = read_table(&text, &options).unwrap();
        assert_eq!(table.rows, vec![vec!["café"]]);
    }
}
