//! SQL projection: CSV to DDL/DML, and SQL result sets back to CSV.
//!
//! Statement text generation is driver-free; executing it is the host's
//! business. The read-back side consumes any source implementing `SqlRows`
//! (the row/column iterator contract of the database bindings) and renders
//! canonical CSV.

use std::io::Write;

use tabcast_lib_core::context::ParseContext;
use tabcast_lib_core::datetime::{format_date, format_datetime};
use tabcast_lib_core::encoding::char_count;
use tabcast_lib_core::errors::{Result, TabError};
use tabcast_lib_core::infer::{ColumnKind, ColumnSchema, TypedTable};
use tabcast_lib_dialects::{create_table, ColumnSpec, Dialect};

use crate::writer::write_row;

#[derive(Debug, Clone, Default)]
pub struct SqlOptions {
    pub dialect: Option<String>,
    pub db: Option<String>,
    /// Explicit table name; defaults to the input's base name.
    pub table_name: Option<String>,
    pub no_constraints: bool,
    pub unique_constraint: Vec<String>,
    pub create_if_not_exists: bool,
    /// Rows per INSERT statement; 0 batches everything into one.
    pub chunk_size: usize,
    /// Expression following the INSERT keyword (`OR IGNORE`, `OR REPLACE`).
    pub prefix: String,
}

impl SqlOptions {
    pub fn resolve_dialect(&self) -> Result<Dialect> {
        match (&self.dialect, &self.db) {
            (Some(name), _) => Dialect::from_name(name),
            (None, Some(db)) => Ok(Dialect::from_connection_string(db)),
            (None, None) => Ok(Dialect::Generic),
        }
    }
}

/// Generate the CREATE TABLE statement for a typed table.
pub fn table_ddl(
    typed: &TypedTable,
    schemas: &[ColumnSchema],
    table_name: &str,
    options: &SqlOptions,
) -> Result<String> {
    let dialect = options.resolve_dialect()?;
    let columns: Vec<ColumnSpec> = typed
        .header
        .iter()
        .zip(schemas)
        .enumerate()
        .map(|(c, (name, schema))| ColumnSpec {
            name: name.clone(),
            kind: schema.kind,
            not_null: !schema.has_blanks,
            precision: schema.max_precision,
            varchar_len: max_symbols(typed, c),
        })
        .collect();
    create_table(
        dialect,
        table_name,
        &columns,
        &options.unique_constraint,
        options.create_if_not_exists,
        options.no_constraints,
    )
}

/// The longest cell of a column, in display characters. Feeds VARCHAR
/// lengths.
fn max_symbols(typed: &TypedTable, c: usize) -> usize {
    typed
        .column(c)
        .map(|cell| char_count(cell.raw()))
        .max()
        .unwrap_or(0)
}

/// Generate batched INSERT statements for the table body.
pub fn insert_statements(
    typed: &TypedTable,
    schemas: &[ColumnSchema],
    table_name: &str,
    options: &SqlOptions,
    ctx: &ParseContext,
) -> Result<Vec<String>> {
    let dialect = options.resolve_dialect()?;
    let columns = typed
        .header
        .iter()
        .map(|name| dialect.quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ");
    let prefix = if options.prefix.is_empty() {
        String::new()
    } else {
        format!("{} ", options.prefix)
    };
    let chunk = if options.chunk_size == 0 {
        typed.rows.len().max(1)
    } else {
        options.chunk_size
    };

    let mut statements = Vec::new();
    for rows in typed.rows.chunks(chunk) {
        let tuples: Vec<String> = rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row
                    .iter()
                    .zip(schemas)
                    .map(|(cell, schema)| render_literal(cell, schema, dialect, ctx))
                    .collect();
                format!("({})", values.join(", "))
            })
            .collect();
        statements.push(format!(
            "INSERT {prefix}INTO {} ({columns}) VALUES {};",
            dialect.quote_ident(table_name),
            tuples.join(", ")
        ));
    }
    Ok(statements)
}

fn render_literal(
    cell: &tabcast_lib_core::value::TypedCell,
    schema: &ColumnSchema,
    dialect: Dialect,
    ctx: &ParseContext,
) -> String {
    if !ctx.blanks && cell.is_null(ctx) {
        return "NULL".into();
    }
    if ctx.no_inference {
        return dialect.string_literal(cell.raw());
    }
    match schema.kind {
        ColumnKind::Bool => cell
            .bool_value(ctx)
            .map_or_else(|| "NULL".into(), |v| dialect.bool_literal(v).to_owned()),
        ColumnKind::Number => match cell.number(ctx) {
            Some(v) if v.is_finite() => {
                let c_form = ctx
                    .locale
                    .to_c_locale(cell.raw().trim())
                    .unwrap_or_else(|| cell.raw().trim().to_owned());
                c_form
            }
            _ => "NULL".into(),
        },
        ColumnKind::DateTime => cell
            .datetime(ctx)
            .map_or_else(|| "NULL".into(), |e| dialect.datetime_literal(e)),
        ColumnKind::Date => cell
            .date(ctx)
            .map_or_else(|| "NULL".into(), |e| dialect.date_literal(e)),
        ColumnKind::Timedelta => cell
            .timedelta(ctx)
            .map_or_else(|| "NULL".into(), |td| dialect.interval_literal(td.seconds)),
        ColumnKind::Text => dialect.string_literal(cell.raw()),
    }
}

/// A value coming back from a SQL driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Days are carried as epoch seconds at midnight UTC.
    Date(i64),
    /// Epoch seconds plus sub-second microseconds.
    DateTime(i64, u32),
    /// Interval in seconds.
    Interval(f64),
}

/// The row/column iterator contract the SQL bindings must satisfy.
pub trait SqlRows {
    fn columns(&self) -> Vec<String>;
    fn next_row(&mut self) -> Result<Option<Vec<SqlValue>>>;
}

/// Render a result set as CSV, temporals in their canonical forms.
pub fn render_sql_rows<W: Write, R: SqlRows>(
    out: &mut W,
    rows: &mut R,
    line_numbers: bool,
) -> Result<()> {
    let mut header = rows.columns();
    if line_numbers {
        header.insert(0, "line_number".into());
    }
    write_row(out, header.iter())?;
    let mut n = 0usize;
    while let Some(row) = rows.next_row()? {
        n += 1;
        let mut fields: Vec<String> = Vec::with_capacity(row.len() + 1);
        if line_numbers {
            fields.push(n.to_string());
        }
        fields.extend(row.iter().map(render_sql_value));
        write_row(out, fields.iter())?;
    }
    Ok(())
}

fn render_sql_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Bool(v) => if *v { "True" } else { "False" }.into(),
        SqlValue::Int(v) => v.to_string(),
        SqlValue::Float(v) => v.to_string(),
        SqlValue::Text(s) => s.clone(),
        SqlValue::Date(epoch) => format_date(*epoch),
        SqlValue::DateTime(epoch, micros) => {
            format!("{}.{micros:06}", format_datetime(*epoch))
        }
        SqlValue::Interval(seconds) => render_interval(*seconds),
    }
}

fn render_interval(seconds: f64) -> String {
    let total_micros = (seconds.abs() * 1e6).round() as u64;
    let days = total_micros / 86_400_000_000;
    let rem = total_micros % 86_400_000_000;
    let hours = rem / 3_600_000_000;
    let minutes = rem % 3_600_000_000 / 60_000_000;
    let secs = rem % 60_000_000 / 1_000_000;
    let micros = rem % 1_000_000;
    let sign = if seconds < 0.0 { "-" } else { "" };
    let mut out = String::from(sign);
    if days > 0 {
        out.push_str(&format!("{days} days, "));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{secs:02}.{micros:06}"));
    out
}

/// Default table name: the input's file stem, or `stdin` when piped.
pub fn default_table_name(path: Option<&std::path::Path>) -> Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => p
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_owned)
            .ok_or_else(|| TabError::Value(format!("cannot derive a table name from {p:?}"))),
        _ => Ok("stdin".into()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tabcast_lib_core::infer::{typify, TypifyPolicy};
    use tabcast_lib_core::table::Table;

    use super::*;

    fn typed_and_schemas(
        header: &[&str],
        rows: &[&[&str]],
        ctx: &ParseContext,
    ) -> (TypedTable, Vec<ColumnSchema>) {
        let table = Table::new(
            header.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        );
        let typed = TypedTable::from_table(table);
        let schemas = typify(&typed, ctx, TypifyPolicy::WithPrecision);
        (typed, schemas)
    }

    #[test]
    fn ddl_reflects_inference() {
        let ctx = ParseContext::default();
        let (typed, schemas) = typed_and_schemas(
            &["flag", "amount", "when", "note"],
            &[
                &["true", "1.25", "2020-01-01", "hello"],
                &["false", "3.5", "2020-01-02", ""],
            ],
            &ctx,
        );
        let ddl = table_ddl(&typed, &schemas, "data", &SqlOptions::default()).unwrap();
        assert_eq!(
            ddl,
            "CREATE TABLE data (\n\
             \tflag BOOLEAN NOT NULL,\n\
             \tamount DECIMAL NOT NULL,\n\
             \twhen DATE NOT NULL,\n\
             \tnote VARCHAR\n\
             );\n"
        );
    }

    #[test]
    fn mysql_varchar_length_comes_from_the_data() {
        let ctx = ParseContext::default();
        let (typed, schemas) =
            typed_and_schemas(&["name"], &[&["ab"], &["abcdef"]], &ctx);
        let options = SqlOptions {
            dialect: Some("mysql".into()),
            ..Default::default()
        };
        let ddl = table_ddl(&typed, &schemas, "t", &options).unwrap();
        assert!(ddl.contains("VARCHAR(6) NOT NULL"), "{ddl}");
    }

    #[test]
    fn inserts_are_chunked() {
        let ctx = ParseContext::default();
        let (typed, schemas) = typed_and_schemas(
            &["n"],
            &[&["1"], &["2"], &["3"], &["4"], &["5"]],
            &ctx,
        );
        let options = SqlOptions {
            chunk_size: 2,
            ..Default::default()
        };
        let stmts = insert_statements(&typed, &schemas, "t", &options, &ctx).unwrap();
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0], "INSERT INTO t (n) VALUES (1), (2);");
        assert_eq!(stmts[2], "INSERT INTO t (n) VALUES (5);");
    }

    #[test]
    fn literals_follow_the_kinds() {
        let ctx = ParseContext::default();
        let (typed, schemas) = typed_and_schemas(
            &["b", "d", "t", "x"],
            &[&["yes", "2020-06-01", "1:30", "it's"]],
            &ctx,
        );
        let stmts =
            insert_statements(&typed, &schemas, "t", &SqlOptions::default(), &ctx).unwrap();
        assert_eq!(
            stmts[0],
            "INSERT INTO t (b, d, t, x) VALUES (TRUE, '2020-06-01', '0:01:30', 'it''s');"
        );
    }

    #[test]
    fn nulls_insert_as_null() {
        let ctx = ParseContext::default();
        let (typed, schemas) = typed_and_schemas(&["n"], &[&["1"], &["NA"]], &ctx);
        let stmts =
            insert_statements(&typed, &schemas, "t", &SqlOptions::default(), &ctx).unwrap();
        assert_eq!(stmts[0], "INSERT INTO t (n) VALUES (1), (NULL);");
    }

    struct FakeRows {
        rows: Vec<Vec<SqlValue>>,
    }

    impl SqlRows for FakeRows {
        fn columns(&self) -> Vec<String> {
            vec!["d".into(), "ts".into(), "iv".into(), "s".into()]
        }
        fn next_row(&mut self) -> Result<Option<Vec<SqlValue>>> {
            Ok(if self.rows.is_empty() {
                None
            } else {
                Some(self.rows.remove(0))
            })
        }
    }

    #[test]
    fn sql_rows_render_canonical_temporals() {
        let mut rows = FakeRows {
            rows: vec![vec![
                SqlValue::Date(0),
                SqlValue::DateTime(90, 500_000),
                SqlValue::Interval(90061.25),
                SqlValue::Text("x,y".into()),
            ]],
        };
        let mut out = Vec::new();
        render_sql_rows(&mut out, &mut rows, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "d,ts,iv,s\n1970-01-01,1970-01-01 00:01:30.500000,\"1 days, 01:01:01.250000\",\"x,y\"\n"
        );
    }
}
