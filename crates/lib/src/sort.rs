//! Type-aware sorting.
//!
//! The body is materialised, per-column comparators are composed into one
//! lexicographic multi-key ordering, and the rows are sorted stably,
//! optionally on the rayon pool.

use std::cmp::Ordering;

use rayon::slice::ParallelSliceMut;
use tabcast_lib_core::columns::parse_column_ids;
use tabcast_lib_core::compare::{comparator, Comparator};
use tabcast_lib_core::context::ParseContext;
use tabcast_lib_core::errors::Result;
use tabcast_lib_core::infer::{typify, ColumnSchema, TypedTable, TypifyPolicy};
use tabcast_lib_core::table::Table;
use tabcast_lib_core::value::TypedCell;

#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    /// Comma-separated identifiers/ranges; empty means all columns.
    pub columns: String,
    pub descending: bool,
    pub parallel: bool,
    pub zero: bool,
}

pub fn sort(
    table: Table,
    options: &SortOptions,
    ctx: &ParseContext,
) -> Result<(TypedTable, Vec<ColumnSchema>)> {
    let offset = if options.zero { 0 } else { 1 };
    let ids = parse_column_ids(&options.columns, &table.header, offset, "")?;

    let mut typed = TypedTable::from_table(table);
    let schemas = typify(&typed, ctx, TypifyPolicy::WithoutPrecision);

    let keys: Vec<(usize, Comparator)> = ids
        .iter()
        .map(|&c| (c, comparator(schemas[c].kind, schemas[c].has_blanks, ctx)))
        .collect();

    let compare = |a: &Vec<TypedCell>, b: &Vec<TypedCell>| -> Ordering {
        for (col, cmp) in &keys {
            let ord = cmp.compare(&a[*col], &b[*col]);
            if ord != Ordering::Equal {
                return if options.descending { ord.reverse() } else { ord };
            }
        }
        Ordering::Equal
    };

    if options.parallel {
        typed.rows.par_sort_by(compare);
    } else {
        typed.rows.sort_by(compare);
    }
    Ok((typed, schemas))
}
