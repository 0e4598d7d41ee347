//! Fix common CSV shape errors.
//!
//! Rows whose arity matches the header go to `<base>_out.csv`; the rest go
//! to `<base>_err.csv` together with a `line_number,msg` diagnostic pair.
//! Dry-run mode prints the diagnostics to the given sink (stderr in the
//! CLI) and writes nothing.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tabcast_lib_core::errors::Result;
use tabcast_lib_core::table::{letter_names, mangle_duplicates};

use crate::source::{open_reader, SourceOptions};
use crate::writer::write_row;

#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    pub dry_run: bool,
    pub line_numbers: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CleanReport {
    pub good_rows: usize,
    pub bad_rows: usize,
    pub out_path: Option<PathBuf>,
    pub err_path: Option<PathBuf>,
}

impl CleanReport {
    pub fn summary(&self) -> String {
        if self.bad_rows == 0 {
            "No errors.".into()
        } else {
            format!(
                "{} error{} logged to {}",
                self.bad_rows,
                if self.bad_rows == 1 { "" } else { "s" },
                self.err_path
                    .as_ref()
                    .map_or_else(String::new, |p| p.display().to_string())
            )
        }
    }
}

/// Split `text` into conforming and malformed rows. `base` names the output
/// files (`<base>_out.csv` / `<base>_err.csv` inside `out_dir`).
pub fn clean<W: Write>(
    text: &str,
    source: &SourceOptions,
    options: &CleanOptions,
    out_dir: &Path,
    base: &str,
    diagnostics: &mut W,
) -> Result<CleanReport> {
    let reader = open_reader(text, source)?;
    let first = reader.header_row().unwrap_or_default();
    let header: Vec<String> = if source.no_header {
        letter_names(first.len())
    } else {
        mangle_duplicates(first.iter().map(|s| reader.decoded(*s).into_owned()).collect())
    };
    let columns = header.len();
    let body = reader.remaining_rows();
    let body = if source.no_header || body.is_empty() {
        body
    } else {
        &body[1..]
    };

    let mut good_rows = 0usize;
    let mut bad_rows = 0usize;

    let mut out_file: Option<BufWriter<File>> = None;
    let mut err_file: Option<BufWriter<File>> = None;
    let out_path = out_dir.join(format!("{base}_out.csv"));
    let err_path = out_dir.join(format!("{base}_err.csv"));

    if !options.dry_run {
        let mut out = BufWriter::new(File::create(&out_path)?);
        write_header(&mut out, &header, options.line_numbers, false)?;
        out_file = Some(out);
    }

    for (i, row) in body.iter().enumerate() {
        let line = i + 1;
        let cells: Vec<String> = row.iter().map(|s| reader.decoded(*s).into_owned()).collect();
        if cells.len() == columns {
            good_rows += 1;
            if let Some(out) = out_file.as_mut() {
                let mut fields: Vec<String> = Vec::with_capacity(columns + 1);
                if options.line_numbers {
                    fields.push(good_rows.to_string());
                }
                fields.extend(cells);
                write_row(out, fields.iter())?;
            }
        } else {
            bad_rows += 1;
            let msg = format!("Expected {columns} columns, found {} columns", cells.len());
            if options.dry_run {
                writeln!(diagnostics, "Line {line}: {msg}")?;
            } else {
                if err_file.is_none() {
                    let mut err = BufWriter::new(File::create(&err_path)?);
                    write_header(&mut err, &header, options.line_numbers, true)?;
                    err_file = Some(err);
                }
                if let Some(err) = err_file.as_mut() {
                    let mut fields: Vec<String> = Vec::with_capacity(columns + 3);
                    if options.line_numbers {
                        fields.push(bad_rows.to_string());
                    }
                    fields.push(line.to_string());
                    fields.push(msg);
                    fields.extend(cells);
                    write_row(err, fields.iter())?;
                }
            }
        }
    }

    if let Some(mut out) = out_file.take() {
        out.flush()?;
    }
    if let Some(mut err) = err_file.take() {
        err.flush()?;
    }

    Ok(CleanReport {
        good_rows,
        bad_rows,
        out_path: (!options.dry_run).then_some(out_path),
        err_path: (!options.dry_run && bad_rows > 0).then_some(err_path),
    })
}

fn write_header<W: Write>(
    out: &mut W,
    header: &[String],
    line_numbers: bool,
    erroneous: bool,
) -> Result<()> {
    let mut fields: Vec<&str> = Vec::with_capacity(header.len() + 3);
    if line_numbers {
        fields.push("line_number");
    }
    if erroneous {
        fields.push("line_number");
        fields.push("msg");
    }
    fields.extend(header.iter().map(String::as_str));
    write_row(out, fields)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const INPUT: &str = "a,b,c\n1,2,3\n1,2\n1,2,3,4\n";

    #[test]
    fn splits_good_and_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut diag = Vec::new();
        let report = clean(
            INPUT,
            &SourceOptions::default(),
            &CleanOptions::default(),
            dir.path(),
            "sample",
            &mut diag,
        )
        .unwrap();

        assert_eq!(report.good_rows, 1);
        assert_eq!(report.bad_rows, 2);
        assert!(diag.is_empty());

        let out = std::fs::read_to_string(report.out_path.unwrap()).unwrap();
        assert_eq!(out, "a,b,c\n1,2,3\n");
        let err = std::fs::read_to_string(report.err_path.unwrap()).unwrap();
        assert_eq!(
            err,
            "line_number,msg,a,b,c\n\
             2,\"Expected 3 columns, found 2 columns\",1,2\n\
             3,\"Expected 3 columns, found 4 columns\",1,2,3,4\n"
        );
    }

    #[test]
    fn conservation_of_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut diag = Vec::new();
        let report = clean(
            INPUT,
            &SourceOptions::default(),
            &CleanOptions::default(),
            dir.path(),
            "sample",
            &mut diag,
        )
        .unwrap();
        // header excluded: 3 data rows in total
        assert_eq!(report.good_rows + report.bad_rows, 3);
    }

    #[test]
    fn dry_run_writes_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut diag = Vec::new();
        let report = clean(
            INPUT,
            &SourceOptions::default(),
            &CleanOptions {
                dry_run: true,
                line_numbers: false,
            },
            dir.path(),
            "sample",
            &mut diag,
        )
        .unwrap();
        assert_eq!(report.out_path, None);
        assert_eq!(report.err_path, None);
        assert!(!dir.path().join("sample_out.csv").exists());
        let text = String::from_utf8(diag).unwrap();
        assert_eq!(
            text,
            "Line 2: Expected 3 columns, found 2 columns\n\
             Line 3: Expected 3 columns, found 4 columns\n"
        );
    }

    #[test]
    fn line_number_mode_prepends_counters() {
        let dir = tempfile::tempdir().unwrap();
        let mut diag = Vec::new();
        let report = clean(
            INPUT,
            &SourceOptions::default(),
            &CleanOptions {
                dry_run: false,
                line_numbers: true,
            },
            dir.path(),
            "sample",
            &mut diag,
        )
        .unwrap();
        let out = std::fs::read_to_string(report.out_path.unwrap()).unwrap();
        assert_eq!(out, "line_number,a,b,c\n1,1,2,3\n");
        let err = std::fs::read_to_string(report.err_path.unwrap()).unwrap();
        assert!(err.starts_with("line_number,line_number,msg,a,b,c\n1,2,"));
    }

    #[test]
    fn clean_input_reports_no_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut diag = Vec::new();
        let report = clean(
            "a,b\n1,2\n",
            &SourceOptions::default(),
            &CleanOptions::default(),
            dir.path(),
            "ok",
            &mut diag,
        )
        .unwrap();
        assert_eq!(report.summary(), "No errors.");
        assert_eq!(report.err_path, None);
    }
}
