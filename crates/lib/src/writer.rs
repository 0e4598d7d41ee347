//! CSV output.
//!
//! RFC-4180 writing (LF line breaks; fields containing the delimiter, a
//! quote or a line break are quoted with internal quotes doubled) plus the
//! type-aware value renderer used by every typed pipeline: numbers are
//! re-emitted in C-locale form, temporals in their ISO-like forms, booleans
//! as `True`/`False`.

use std::borrow::Cow;
use std::io::Write;

use tabcast_lib_core::context::ParseContext;
use tabcast_lib_core::datetime::{format_date, format_datetime};
use tabcast_lib_core::errors::Result;
use tabcast_lib_core::infer::{ColumnKind, ColumnSchema, TypedTable};
use tabcast_lib_core::value::TypedCell;

pub fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains(['"', ',', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

pub fn write_row<W: Write, I, S>(out: &mut W, fields: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut first = true;
    for field in fields {
        if !first {
            out.write_all(b",")?;
        }
        first = false;
        out.write_all(csv_field(field.as_ref()).as_bytes())?;
    }
    out.write_all(b"\n")?;
    Ok(())
}

/// Render one typed cell as its output text (CSV quoting applied later).
pub fn render_typed(cell: &TypedCell, schema: &ColumnSchema, ctx: &ParseContext) -> String {
    if !ctx.blanks && cell.is_null(ctx) {
        return String::new();
    }
    if ctx.no_inference || schema.kind == ColumnKind::Text {
        return cell.raw().to_owned();
    }
    match schema.kind {
        ColumnKind::Bool => match cell.bool_value(ctx) {
            Some(true) => "True".into(),
            Some(false) => "False".into(),
            None => cell.raw().to_owned(),
        },
        ColumnKind::Number => match cell.number(ctx) {
            Some(v) if v.is_nan() => "NaN".into(),
            Some(v) if v.is_infinite() => {
                if v > 0.0 { "Infinity" } else { "-Infinity" }.into()
            }
            Some(_) => {
                // numbers are re-emitted as written, only normalised to the
                // C locale
                if ctx.locale.is_c() {
                    cell.raw().to_owned()
                } else {
                    ctx.locale
                        .to_c_locale(cell.raw().trim())
                        .unwrap_or_else(|| cell.raw().to_owned())
                }
            }
            None => cell.raw().to_owned(),
        },
        ColumnKind::DateTime => cell
            .datetime(ctx)
            .map_or_else(|| cell.raw().to_owned(), format_datetime),
        ColumnKind::Date => cell
            .date(ctx)
            .map_or_else(|| cell.raw().to_owned(), format_date),
        ColumnKind::Timedelta => cell
            .timedelta(ctx)
            .map_or_else(|| cell.raw().to_owned(), |td| td.canonical.clone()),
        ColumnKind::Text => unreachable!("handled above"),
    }
}

/// Write a whole typed table: header, then each row rendered per its column
/// schema. With `line_numbers`, a `line_number` column is prepended.
pub fn write_typed_table<W: Write>(
    out: &mut W,
    table: &TypedTable,
    schemas: &[ColumnSchema],
    ctx: &ParseContext,
    line_numbers: bool,
) -> Result<()> {
    write_header(out, &table.header, line_numbers)?;
    for (i, row) in table.rows.iter().enumerate() {
        write_typed_row(out, row, schemas, ctx, line_numbers.then_some(i + 1))?;
    }
    Ok(())
}

pub fn write_header<W: Write>(out: &mut W, header: &[String], line_numbers: bool) -> Result<()> {
    if line_numbers {
        let fields = std::iter::once("line_number").chain(header.iter().map(String::as_str));
        write_row(out, fields)
    } else {
        write_row(out, header.iter())
    }
}

pub fn write_typed_row<W: Write>(
    out: &mut W,
    row: &[TypedCell],
    schemas: &[ColumnSchema],
    ctx: &ParseContext,
    line_number: Option<usize>,
) -> Result<()> {
    let mut fields: Vec<String> = Vec::with_capacity(row.len() + 1);
    if let Some(n) = line_number {
        fields.push(n.to_string());
    }
    fields.extend(
        row.iter()
            .zip(schemas)
            .map(|(cell, schema)| render_typed(cell, schema, ctx)),
    );
    write_row(out, fields.iter())
}
