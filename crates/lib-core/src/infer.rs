//! Column-major type inference.
//!
//! For each column, candidate kinds are attempted in a fixed order and a
//! candidate succeeds iff every non-null cell parses as that kind. Null
//! cells never disqualify a kind but flip the column's blank flag. Columns
//! are independent, so the engine fans out over rayon.

use rayon::prelude::*;

use crate::context::ParseContext;
use crate::table::Table;
use crate::value::TypedCell;

/// Inferred kind of a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ColumnKind {
    Bool,
    Timedelta,
    DateTime,
    Date,
    Number,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSchema {
    pub kind: ColumnKind,
    pub has_blanks: bool,
    pub max_precision: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypifyPolicy {
    WithPrecision,
    WithoutPrecision,
    WithoutPrecisionAndBlanks,
}

/// A table whose cells carry their lazy type caches.
#[derive(Debug, Default)]
pub struct TypedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<TypedCell>>,
}

impl TypedTable {
    pub fn from_table(table: Table) -> TypedTable {
        TypedTable {
            header: table.header,
            rows: table
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(TypedCell::new).collect())
                .collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn column(&self, c: usize) -> impl Iterator<Item = &TypedCell> {
        self.rows.iter().map(move |row| &row[c])
    }
}

/// Infer a schema for every column of the table.
pub fn typify(table: &TypedTable, ctx: &ParseContext, policy: TypifyPolicy) -> Vec<ColumnSchema> {
    let schemas: Vec<ColumnSchema> = (0..table.width())
        .into_par_iter()
        .map(|c| infer_column(table, c, ctx, policy))
        .collect();
    log::debug!(
        "typified {} columns: {:?}",
        schemas.len(),
        schemas.iter().map(|s| s.kind).collect::<Vec<_>>()
    );
    schemas
}

fn infer_column(
    table: &TypedTable,
    c: usize,
    ctx: &ParseContext,
    policy: TypifyPolicy,
) -> ColumnSchema {
    let nulls: Vec<bool> = table
        .column(c)
        .map(|cell| cell.is_null(ctx) && !ctx.blanks)
        .collect();
    let has_blanks = match policy {
        TypifyPolicy::WithoutPrecisionAndBlanks => false,
        _ => nulls.iter().any(|&n| n),
    };

    let non_null = || {
        table
            .column(c)
            .zip(&nulls)
            .filter(|(_, &null)| !null)
            .map(|(cell, _)| cell)
    };

    let mut max_precision = 0u8;
    let kind = if ctx.no_inference {
        // reproducible without locale or format assumptions
        ColumnKind::Text
    } else if non_null().next().is_none() {
        // an all-null column succeeds at the first attempt
        ColumnKind::Bool
    } else if non_null().all(|cell| cell.is_boolean(ctx)) {
        ColumnKind::Bool
    } else if non_null().all(|cell| cell.timedelta(ctx).is_some()) {
        ColumnKind::Timedelta
    } else if non_null().all(|cell| cell.datetime(ctx).is_some()) {
        ColumnKind::DateTime
    } else if non_null().all(|cell| cell.date(ctx).is_some()) {
        ColumnKind::Date
    } else if non_null().all(|cell| cell.is_number(ctx)) {
        if policy == TypifyPolicy::WithPrecision {
            max_precision = non_null().map(|cell| cell.precision(ctx)).max().unwrap_or(0);
        }
        ColumnKind::Number
    } else {
        ColumnKind::Text
    };

    ColumnSchema {
        kind,
        has_blanks,
        max_precision,
    }
}
