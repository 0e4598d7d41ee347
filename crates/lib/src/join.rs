//! Multi-way SQL-like joins over tabular sources.
//!
//! Sources are reduced pairwise, left to right. Union stacks horizontally;
//! the keyed modes run a nested-loop match under the type-aware comparator
//! of the join column. Header collisions on the right side are renamed
//! `_<k>`, and in inner/left/right joins the right join column is elided
//! from the merged header.

use tabcast_lib_core::columns::match_column;
use tabcast_lib_core::compare::{comparator, Comparator};
use tabcast_lib_core::context::ParseContext;
use tabcast_lib_core::errors::{Result, TabError};
use tabcast_lib_core::infer::{typify, ColumnKind, ColumnSchema, TypedTable, TypifyPolicy};
use tabcast_lib_core::table::{mangle_duplicates, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum JoinMode {
    Union,
    Inner,
    Left,
    Right,
    Outer,
}

#[derive(Debug, Clone, Default)]
pub struct JoinOptions {
    /// Comma-separated join column specs: one for all sources, or one per
    /// source. `None` selects a union join.
    pub columns: Option<String>,
    pub zero: bool,
}

struct Src {
    typed: TypedTable,
    schemas: Vec<ColumnSchema>,
    join_col: usize,
}

/// Join `tables` under `mode`, returning the merged table and its column
/// schemas (used by the typed printer).
pub fn join(
    tables: Vec<Table>,
    mode: JoinMode,
    options: &JoinOptions,
    ctx: &ParseContext,
) -> Result<(Table, Vec<ColumnSchema>)> {
    if tables.is_empty() {
        return Err(TabError::Join("no input tables".into()));
    }
    let specs = parse_specs(options, tables.len())?;

    if specs.is_empty() && mode != JoinMode::Union && mode != JoinMode::Inner {
        return Err(TabError::Join(
            "You must provide join column names when performing an outer join.".into(),
        ));
    }
    if specs.is_empty() || mode == JoinMode::Union {
        return union_all(tables, ctx);
    }

    let mut tables = tables;
    let mut specs = specs;
    if mode == JoinMode::Right {
        tables.reverse();
        specs.reverse();
    }

    let offset = if options.zero { 0 } else { 1 };
    let mut sources: Vec<Src> = Vec::with_capacity(tables.len());
    for (table, spec) in tables.into_iter().zip(&specs) {
        let join_col = match_column(&table.header, spec, offset)?;
        let typed = TypedTable::from_table(table);
        let schemas = typify(&typed, ctx, TypifyPolicy::WithoutPrecision);
        sources.push(Src {
            typed,
            schemas,
            join_col,
        });
    }

    let mut sources = sources.into_iter();
    let mut acc = sources.next().expect("at least one source");
    for right in sources {
        acc = match mode {
            JoinMode::Union => unreachable!("union has no join columns"),
            JoinMode::Inner => merge_keyed(acc, right, false, false, ctx)?,
            JoinMode::Left | JoinMode::Right => merge_keyed(acc, right, true, false, ctx)?,
            JoinMode::Outer => merge_keyed(acc, right, true, true, ctx)?,
        };
    }

    Ok((
        Table::new(
            acc.typed.header,
            acc.typed
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(|c| c.raw().to_owned()).collect())
                .collect(),
        ),
        acc.schemas,
    ))
}

fn parse_specs(options: &JoinOptions, source_count: usize) -> Result<Vec<String>> {
    let Some(spec) = options.columns.as_deref().filter(|s| !s.trim().is_empty()) else {
        return Ok(Vec::new());
    };
    let mut names: Vec<String> = spec.split(',').map(|s| s.trim().to_owned()).collect();
    if names.len() == 1 {
        names = vec![names[0].clone(); source_count];
    }
    if names.len() != source_count {
        return Err(TabError::Join(
            "The number of join column names must match the number of files, or be a single \
             column name that exists in all files."
                .into(),
        ));
    }
    Ok(names)
}

/// Union join: stack tables horizontally, padding the shorter side.
fn union_all(tables: Vec<Table>, ctx: &ParseContext) -> Result<(Table, Vec<ColumnSchema>)> {
    let mut iter = tables.into_iter();
    let mut acc = iter
        .next()
        .ok_or_else(|| TabError::Join("no input tables".into()))?;
    let typed = TypedTable::from_table(acc.clone());
    let mut schemas = typify(&typed, ctx, TypifyPolicy::WithoutPrecision);

    for right in iter {
        let right_typed = TypedTable::from_table(right.clone());
        schemas.extend(typify(&right_typed, ctx, TypifyPolicy::WithoutPrecision));

        let header = mangle_duplicates(
            acc.header
                .iter()
                .chain(right.header.iter())
                .cloned()
                .collect(),
        );
        let (lw, rw) = (acc.width(), right.width());
        let height = acc.rows.len().max(right.rows.len());
        let mut rows = Vec::with_capacity(height);
        for r in 0..height {
            let mut row: Vec<String> = Vec::with_capacity(lw + rw);
            match acc.rows.get(r) {
                Some(left_row) => row.extend(left_row.iter().cloned()),
                None => row.extend(std::iter::repeat_n(String::new(), lw)),
            }
            match right.rows.get(r) {
                Some(right_row) => row.extend(right_row.iter().cloned()),
                None => row.extend(std::iter::repeat_n(String::new(), rw)),
            }
            rows.push(row);
        }
        acc = Table::new(header, rows);
    }
    Ok((acc, schemas))
}

/// Keyed merge of two sources: inner matches, plus unmatched-left rows when
/// `keep_left`, plus unmatched-right rows when `outer`. In the non-outer
/// modes the right join column is elided from the result.
fn merge_keyed(
    left: Src,
    right: Src,
    keep_left: bool,
    outer: bool,
    ctx: &ParseContext,
) -> Result<Src> {
    let (c0, c1) = (left.join_col, right.join_col);
    let cmp = join_comparator(&left, &right, ctx);

    let keep_right_key = outer;
    let header = merged_header(&left, &right, keep_right_key);
    let mut schemas: Vec<ColumnSchema> = left.schemas.clone();
    schemas.extend(pruned(&right.schemas, c1, keep_right_key));

    let right_width = if keep_right_key {
        right.typed.width()
    } else {
        right.typed.width() - 1
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut introduced_blanks = false;
    for left_row in &left.typed.rows {
        let mut matched = false;
        for right_row in &right.typed.rows {
            if cmp.equal(&left_row[c0], &right_row[c1]) {
                matched = true;
                let mut row: Vec<String> =
                    left_row.iter().map(|c| c.raw().to_owned()).collect();
                row.extend(
                    right_row
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| keep_right_key || *i != c1)
                        .map(|(_, c)| c.raw().to_owned()),
                );
                rows.push(row);
            }
        }
        if !matched && keep_left {
            let mut row: Vec<String> = left_row.iter().map(|c| c.raw().to_owned()).collect();
            row.extend(std::iter::repeat_n(String::new(), right_width));
            rows.push(row);
            introduced_blanks = true;
        }
    }
    if outer {
        for right_row in &right.typed.rows {
            let matched = left
                .typed
                .rows
                .iter()
                .any(|left_row| cmp.equal(&right_row[c1], &left_row[c0]));
            if !matched {
                let mut row: Vec<String> =
                    std::iter::repeat_n(String::new(), left.typed.width()).collect();
                row.extend(right_row.iter().map(|c| c.raw().to_owned()));
                rows.push(row);
                introduced_blanks = true;
            }
        }
    }

    let typed = TypedTable::from_table(Table::new(header, rows));
    // blanks introduced by unmatched rows change null semantics for the
    // next round, so outer joins re-infer the merged table
    if outer && introduced_blanks {
        schemas = typify(&typed, ctx, TypifyPolicy::WithoutPrecision);
    }
    Ok(Src {
        typed,
        schemas,
        join_col: c0,
    })
}

fn pruned(schemas: &[ColumnSchema], skip: usize, keep: bool) -> Vec<ColumnSchema> {
    schemas
        .iter()
        .enumerate()
        .filter(|(i, _)| keep || *i != skip)
        .map(|(_, s)| *s)
        .collect()
}

fn merged_header(left: &Src, right: &Src, keep_right_key: bool) -> Vec<String> {
    let mangled = mangle_duplicates(
        left.typed
            .header
            .iter()
            .chain(right.typed.header.iter())
            .cloned()
            .collect(),
    );
    if keep_right_key {
        return mangled;
    }
    let elide = left.typed.width() + right.join_col;
    mangled
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i != elide)
        .map(|(_, name)| name)
        .collect()
}

fn join_comparator<'a>(left: &Src, right: &Src, ctx: &'a ParseContext) -> Comparator<'a> {
    let k0 = left.schemas[left.join_col].kind;
    let k1 = right.schemas[right.join_col].kind;
    let kind = if ctx.no_inference || k0 == k1 {
        k0
    } else {
        // the sides disagree, so equality falls back to text
        log::debug!("join column kinds differ ({k0} vs {k1}); comparing as text");
        ColumnKind::Text
    };
    let has_blanks =
        left.schemas[left.join_col].has_blanks || right.schemas[right.join_col].has_blanks;
    comparator(kind, has_blanks, ctx)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn table(csv: &[&str]) -> Table {
        let header = csv[0].split(',').map(str::to_owned).collect();
        let rows = csv[1..]
            .iter()
            .map(|line| line.split(',').map(str::to_owned).collect())
            .collect();
        Table::new(header, rows)
    }

    fn keyed(spec: &str) -> JoinOptions {
        JoinOptions {
            columns: Some(spec.into()),
            zero: false,
        }
    }

    #[test]
    fn union_pads_the_shorter_side() {
        let ctx = ParseContext::default();
        let (out, _) = join(
            vec![table(&["h1", "abc"]), table(&["h2", "abc", "def"]), table(&["h3", "", "ghi"])],
            JoinMode::Union,
            &JoinOptions::default(),
            &ctx,
        )
        .unwrap();
        assert_eq!(out.header, vec!["h1", "h2", "h3"]);
        assert_eq!(out.rows, vec![vec!["abc", "abc", ""], vec!["", "def", "ghi"]]);
    }

    #[test]
    fn inner_join_emits_matches_and_elides_right_key() {
        let ctx = ParseContext::default();
        let (out, _) = join(
            vec![table(&["a,b", "1,x", "2,y"]), table(&["a,c", "2,z", "3,w"])],
            JoinMode::Inner,
            &keyed("a"),
            &ctx,
        )
        .unwrap();
        assert_eq!(out.header, vec!["a", "b", "c"]);
        assert_eq!(out.rows, vec![vec!["2", "y", "z"]]);
    }

    #[test]
    fn left_join_keeps_unmatched_left_rows() {
        let ctx = ParseContext::default();
        let (out, _) = join(
            vec![table(&["a,b", "1,x", "2,y"]), table(&["a,c", "2,z", "3,w"])],
            JoinMode::Left,
            &keyed("a"),
            &ctx,
        )
        .unwrap();
        assert_eq!(out.rows, vec![vec!["1", "x", ""], vec!["2", "y", "z"]]);
    }

    #[test]
    fn outer_join_emits_both_unmatched_sides_in_order() {
        let ctx = ParseContext::default();
        let (out, _) = join(
            vec![table(&["a,b", "1,x", "2,y"]), table(&["a,c", "2,z", "3,w"])],
            JoinMode::Outer,
            &keyed("a"),
            &ctx,
        )
        .unwrap();
        assert_eq!(out.header, vec!["a", "b", "a_2", "c"]);
        assert_eq!(out.rows, vec![
            vec!["1", "x", "", ""],
            vec!["2", "y", "2", "z"],
            vec!["", "", "3", "w"],
        ]);
    }

    #[test]
    fn right_join_reverses_the_sources() {
        let ctx = ParseContext::default();
        let (out, _) = join(
            vec![table(&["a,b", "1,x", "2,y"]), table(&["a,c", "2,z", "3,w"])],
            JoinMode::Right,
            &keyed("a"),
            &ctx,
        )
        .unwrap();
        assert_eq!(out.header, vec!["a", "c", "b"]);
        assert_eq!(out.rows, vec![vec!["2", "z", "y"], vec!["3", "w", ""]]);
    }

    #[test]
    fn collision_renaming_uses_smallest_suffix() {
        let ctx = ParseContext::default();
        let (out, _) = join(
            vec![table(&["id,v", "1,a"]), table(&["id,v", "1,b"])],
            JoinMode::Outer,
            &keyed("id"),
            &ctx,
        )
        .unwrap();
        assert_eq!(out.header, vec!["id", "v", "id_2", "v_2"]);
    }

    #[test]
    fn spec_cardinality_must_match() {
        let ctx = ParseContext::default();
        let err = join(
            vec![table(&["a", "1"]), table(&["b", "2"]), table(&["c", "3"])],
            JoinMode::Inner,
            &keyed("a,b"),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, TabError::Join(_)));
    }

    #[test]
    fn keyed_join_without_columns_is_fatal() {
        let ctx = ParseContext::default();
        let err = join(
            vec![table(&["a", "1"]), table(&["a", "1"])],
            JoinMode::Outer,
            &JoinOptions::default(),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, TabError::Join(_)));
    }

    #[test]
    fn mismatched_kinds_compare_as_text() {
        let ctx = ParseContext::default();
        // left key infers number, right key infers text
        let (out, _) = join(
            vec![table(&["a,b", "1,x"]), table(&["a,c", "1,z", "q,w"])],
            JoinMode::Inner,
            &keyed("a"),
            &ctx,
        )
        .unwrap();
        assert_eq!(out.rows, vec![vec!["1", "x", "z"]]);
    }

    #[test]
    fn typed_equality_matches_across_renderings() {
        let ctx = ParseContext::default();
        // 1.0 and 1 are the same number
        let (out, _) = join(
            vec![table(&["a,b", "1.0,x"]), table(&["a,c", "1,z"])],
            JoinMode::Inner,
            &keyed("a"),
            &ctx,
        )
        .unwrap();
        assert_eq!(out.rows, vec![vec!["1.0", "x", "z"]]);
    }
}
