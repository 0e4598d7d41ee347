//! XLS/XLSX to CSV through calamine's sheet ranges.
//!
//! The translator materialises the selected sheet as CSV and leaves typing
//! to the shared pipeline. Numeric cells carrying Excel serial dates stay
//! numeric here; `d_excel`/`dt_excel` project the named columns through the
//! 1900/1904 epochs afterwards.

use std::io::Cursor;
use std::io::Read as _;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::NaiveDate;
use tabcast_lib_core::columns::parse_column_ids;
use tabcast_lib_core::context::ParseContext;
use tabcast_lib_core::datetime::{format_date, format_datetime};
use tabcast_lib_core::errors::{Result, TabError};
use tabcast_lib_core::table::Table;

use super::ConvertOptions;
use crate::writer::write_row;

fn open(path: Option<&Path>) -> Result<Sheets<Cursor<Vec<u8>>>> {
    let bytes = match path {
        Some(p) if p.as_os_str() != "-" => {
            std::fs::read(p).map_err(|e| TabError::io_path(p, e))?
        }
        _ => {
            let mut bytes = Vec::new();
            std::io::stdin().lock().read_to_end(&mut bytes)?;
            bytes
        }
    };
    open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| TabError::Format(format!("cannot open workbook: {e}")))
}

/// Sheet names of the workbook, for the `--names` listing.
pub fn sheet_names(path: Option<&Path>) -> Result<Vec<String>> {
    Ok(open(path)?.sheet_names())
}

/// Translate one sheet (the first, when unnamed) into CSV bytes.
pub fn convert_excel(path: Option<&Path>, sheet: Option<&str>) -> Result<Vec<u8>> {
    let mut workbook = open(path)?;
    let name = match sheet.filter(|s| !s.is_empty()) {
        Some(name) => name.to_owned(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| TabError::Format("the workbook has no sheets".into()))?,
    };
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| TabError::Format(format!("cannot read sheet {name:?}: {e}")))?;
    range_to_csv(&range)
}

/// Write the selected sheets (`-` for all) to `sheets_<i>.csv`, or
/// `sheets_<name>.csv` with `use_sheet_names`. Returns the paths written.
pub fn write_sheets(
    path: Option<&Path>,
    which: &str,
    use_sheet_names: bool,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut workbook = open(path)?;
    let all = workbook.sheet_names();
    let selected: Vec<String> = if which == "-" {
        all.to_vec()
    } else {
        let wanted: Vec<&str> = which.split(',').map(str::trim).collect();
        for name in &wanted {
            if !all.iter().any(|s| s == name) {
                return Err(TabError::Format(format!("no sheet named {name:?}")));
            }
        }
        wanted.into_iter().map(str::to_owned).collect()
    };

    let mut written = Vec::with_capacity(selected.len());
    for (i, name) in selected.iter().enumerate() {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| TabError::Format(format!("cannot read sheet {name:?}: {e}")))?;
        let csv = range_to_csv(&range)?;
        let file_name = if use_sheet_names {
            format!("sheets_{name}.csv")
        } else {
            format!("sheets_{i}.csv")
        };
        let out_path = out_dir.join(file_name);
        std::fs::write(&out_path, csv).map_err(|e| TabError::io_path(&out_path, e))?;
        written.push(out_path);
    }
    Ok(written)
}

fn range_to_csv(range: &Range<Data>) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for row in range.rows() {
        let fields: Vec<String> = row.iter().map(render_cell).collect();
        write_row(&mut out, fields.iter())?;
    }
    Ok(out)
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Bool(b) => if *b { "True" } else { "False" }.into(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format!("{f}"),
        // serial numbers pass through; d/dt-excel projects them later
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        _ => String::new(),
    }
}

/// Map an Excel serial day number to epoch seconds, honouring the 1904 date
/// system and the 1900 leap bug: on the 1900 system, serials below 60 count
/// from Dec 31 1899 and the rest from Dec 30 1899.
pub fn serial_to_epoch(serial: f64, is1904: bool) -> i64 {
    let base = if is1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    };
    let base = base
        .expect("fixed dates are valid")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is valid")
        .and_utc()
        .timestamp();
    base + (serial * 86_400.0).round() as i64
}

/// Rewrite the `d_excel`/`dt_excel` columns of a materialised table from
/// serial numbers to dates/datetimes. Non-numeric cells pass through.
pub fn project_serial_columns(
    table: &mut Table,
    options: &ConvertOptions,
    _ctx: &ParseContext,
) -> Result<()> {
    let offset = if options.zero { 0 } else { 1 };
    let resolve = |spec: &Option<String>| -> Result<Vec<usize>> {
        match spec.as_deref().filter(|s| !s.is_empty() && *s != "none") {
            Some(spec) => parse_column_ids(spec, &table.header, offset, ""),
            None => Ok(Vec::new()),
        }
    };
    let date_cols = resolve(&options.d_excel)?;
    let datetime_cols = resolve(&options.dt_excel)?;
    if date_cols.is_empty() && datetime_cols.is_empty() {
        return Ok(());
    }

    for row in &mut table.rows {
        for &c in &date_cols {
            if let Ok(serial) = row[c].trim().parse::<f64>() {
                row[c] = format_date(serial_to_epoch(serial, options.is1904));
            }
        }
        for &c in &datetime_cols {
            if let Ok(serial) = row[c].trim().parse::<f64>() {
                row[c] = format_datetime(serial_to_epoch(serial, options.is1904));
            }
        }
    }
    Ok(())
}
