//! Format translators.
//!
//! Every non-CSV format is normalised into a canonical CSV byte stream in
//! memory; the stream is then re-read by the reader and re-typed so the
//! same typed printer serves every input format. The format set is closed:
//! a sum type and one dispatch, no runtime registration.

use std::path::Path;

use tabcast_lib_core::context::ParseContext;
use tabcast_lib_core::errors::{Result, TabError};

use crate::source::SourceOptions;

pub mod dbf;
pub mod excel;
pub mod fixed;
pub mod geojson;
pub mod json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Format {
    Csv,
    Fixed,
    Dbf,
    Xls,
    Xlsx,
    Json,
    Ndjson,
    Geojson,
}

impl Format {
    pub fn from_name(name: &str) -> Result<Format> {
        name.parse().map_err(|_| {
            TabError::Format(format!(
                "unknown input format {name:?}; expected one of csv, dbf, fixed, geojson, json, ndjson, xls, xlsx"
            ))
        })
    }

    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Format::Csv),
            "dbf" => Some(Format::Dbf),
            "json" => Some(Format::Json),
            "ndjson" | "jsonl" => Some(Format::Ndjson),
            "geojson" => Some(Format::Geojson),
            "xls" => Some(Format::Xls),
            "xlsx" => Some(Format::Xlsx),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub source: SourceOptions,
    /// Fixed-width schema file.
    pub schema: Option<std::path::PathBuf>,
    /// JSON: top-level key holding the array of objects.
    pub key: Option<String>,
    /// Excel sheet name; empty selects the first sheet.
    pub sheet: Option<String>,
    /// Excel serial date/datetime column specs.
    pub d_excel: Option<String>,
    pub dt_excel: Option<String>,
    pub is1904: bool,
    pub zero: bool,
}

/// Translate one source into canonical CSV bytes.
pub fn convert(format: Format, path: Option<&Path>, options: &ConvertOptions) -> Result<Vec<u8>> {
    match format {
        Format::Csv => {
            let text = crate::source::load_text(path, &options.source)?;
            Ok(text.into_bytes())
        }
        Format::Fixed => {
            let schema_path = options.schema.as_deref().ok_or_else(|| {
                TabError::Value("schema must not be null when format is \"fixed\".".into())
            })?;
            let schema_text = crate::source::load_text(Some(schema_path), &options.source)?;
            let data_text = crate::source::load_text(path, &options.source)?;
            fixed::convert_fixed(&data_text, &schema_text, options.source.skip_lines)
        }
        Format::Dbf => dbf::convert_dbf(path),
        Format::Xls | Format::Xlsx => excel::convert_excel(path, options.sheet.as_deref()),
        Format::Json => {
            let text = crate::source::load_text(path, &options.source)?;
            json::convert_json(text.as_bytes(), options.key.as_deref())
        }
        Format::Ndjson => {
            let text = crate::source::load_text(path, &options.source)?;
            json::convert_ndjson(&text)
        }
        Format::Geojson => {
            let text = crate::source::load_text(path, &options.source)?;
            geojson::convert_geojson(text.as_bytes())
        }
    }
}

/// Whether the Excel serial projection applies to this format.
pub fn supports_serial_projection(format: Format) -> bool {
    matches!(format, Format::Csv | Format::Xls | Format::Xlsx)
}

/// Apply `d_excel`/`dt_excel` to a materialised table: numeric cells of the
/// named columns are rewritten as dates/datetimes through the Excel serial
/// epochs. See `excel::serial_to_epoch` for the 1900/1904 handling.
pub fn apply_serial_projection(
    table: &mut tabcast_lib_core::table::Table,
    options: &ConvertOptions,
    ctx: &ParseContext,
) -> Result<()> {
    excel::project_serial_columns(table, options, ctx)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn format_names_roundtrip() {
        for name in ["csv", "dbf", "fixed", "geojson", "json", "ndjson", "xls", "xlsx"] {
            assert_eq!(Format::from_name(name).unwrap().to_string(), name);
        }
        assert!(Format::from_name("parquet").is_err());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("x.XLSX")), Some(Format::Xlsx));
        assert_eq!(Format::from_path(Path::new("x.jsonl")), Some(Format::Ndjson));
        assert_eq!(Format::from_path(Path::new("x.txt")), None);
        assert_eq!(Format::from_path(Path::new("x")), None);
    }

    #[test]
    fn fixed_requires_a_schema() {
        let err = convert(Format::Fixed, None, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, TabError::Value(_)));
    }
}
