//! Fixed-width to CSV.
//!
//! The schema is itself a CSV with required columns `column`, `start` and
//! `length` (extras are ignored). Widths are measured in UTF-8 scalar
//! values, so extraction walks characters, never bytes.

use tabcast_lib_core::errors::{Result, TabError};
use tabcast_lib_core::reader::{Reader, ReaderOptions};
use tabcast_lib_core::table::Table;

use crate::writer::write_row;

struct FixedSchema {
    names: Vec<String>,
    starts: Vec<usize>,
    lengths: Vec<usize>,
}

fn parse_schema(schema_text: &str) -> Result<FixedSchema> {
    let reader = Reader::new(schema_text, &ReaderOptions::default())?;
    let table = Table::from_reader(&reader, false)?;

    let col = |name: &str| -> Result<usize> {
        table.header.iter().position(|h| h == name).ok_or_else(|| {
            TabError::Value(format!(
                "A column named \"{name}\" must exist in the schema file."
            ))
        })
    };
    let (name_col, start_col, length_col) = (col("column")?, col("start")?, col("length")?);

    let mut names = Vec::with_capacity(table.rows.len());
    let mut starts = Vec::with_capacity(table.rows.len());
    let mut lengths = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        names.push(row[name_col].clone());
        starts.push(parse_offset(&row[start_col], "start")?);
        lengths.push(parse_offset(&row[length_col], "length")?);
    }

    // a schema whose smallest start is 1 is 1-based throughout
    if starts.iter().min() == Some(&1) {
        for s in &mut starts {
            *s -= 1;
        }
    }
    Ok(FixedSchema {
        names,
        starts,
        lengths,
    })
}

fn parse_offset(value: &str, what: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        TabError::Value(format!(
            "A value of unsupported type '{value}' for {what}."
        ))
    })
}

/// Translate a fixed-width file into CSV bytes. `skip_lines` applies to the
/// data file; the schema was read separately.
pub fn convert_fixed(data_text: &str, schema_text: &str, skip_lines: usize) -> Result<Vec<u8>> {
    let schema = parse_schema(schema_text)?;
    let mut out = Vec::new();
    write_row(&mut out, schema.names.iter())?;

    for line in data_text.lines().skip(skip_lines) {
        let line = line.trim_end_matches('\r');
        let fields: Vec<String> = schema
            .starts
            .iter()
            .zip(&schema.lengths)
            .map(|(&start, &length)| {
                // short rows pad with blanks, long rows truncate
                line.chars()
                    .skip(start)
                    .take(length)
                    .collect::<String>()
                    .trim()
                    .to_owned()
            })
            .collect();
        write_row(&mut out, fields.iter())?;
    }
    Ok(out)
}
