//! DBF to CSV.
//!
//! The dBase field descriptors become the header and each record is emitted
//! as one CSV row. The `dbase` crate owns the binary format and character
//! decoding (per the file's language driver); this translator only consumes
//! its record iterator. DBF needs random access, so piping is refused.

use std::path::Path;

use tabcast_lib_core::errors::{Result, TabError};

use crate::writer::write_row;

pub fn convert_dbf(path: Option<&Path>) -> Result<Vec<u8>> {
    let path = match path {
        Some(p) if p.as_os_str() != "-" => p,
        _ => {
            return Err(TabError::Format(
                "Reading a DBF file from standard input is not supported.".into(),
            ))
        }
    };

    let mut reader = dbase::Reader::from_path(path)
        .map_err(|e| TabError::Format(format!("cannot open DBF {}: {e}", path.display())))?;

    let names: Vec<String> = reader
        .fields()
        .iter()
        .map(|f| f.name().to_owned())
        .collect();

    let mut out = Vec::new();
    write_row(&mut out, names.iter())?;

    let records = reader
        .read()
        .map_err(|e| TabError::Format(format!("cannot read DBF records: {e}")))?;
    for record in records {
        let fields: Vec<String> = names
            .iter()
            .map(|name| {
                record
                    .get(name)
                    .map(render_field)
                    .unwrap_or_default()
            })
            .collect();
        write_row(&mut out, fields.iter())?;
    }
    Ok(out)
}

fn render_field(value: &dbase::FieldValue) -> String {
    use dbase::FieldValue;
    match value {
        FieldValue::Character(Some(s)) => s.trim().to_owned(),
        FieldValue::Character(None) => String::new(),
        FieldValue::Numeric(Some(n)) => format!("{n}"),
        FieldValue::Numeric(None) => String::new(),
        FieldValue::Logical(Some(b)) => if *b { "True" } else { "False" }.into(),
        FieldValue::Logical(None) => String::new(),
        FieldValue::Date(Some(d)) => {
            format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())
        }
        FieldValue::Date(None) => String::new(),
        FieldValue::Float(Some(f)) => format!("{f}"),
        FieldValue::Float(None) => String::new(),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Memo(s) => s.clone(),
        other => format!("{other}"),
    }
}
