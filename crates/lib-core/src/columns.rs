//! Column identifier resolution.
//!
//! User-facing specs are comma-separated lists of column names, indices
//! (1-based unless zero mode is on) or ranges (`3-5`, `2:4`, open-ended
//! `-3`). Names win over ranges: a column literally named `3-5` resolves by
//! name.

use itertools::Itertools;

use crate::errors::{Result, TabError};

/// Resolve one identifier to a zero-based column index.
pub fn match_column(names: &[String], spec: &str, offset: usize) -> Result<usize> {
    let digital = !spec.is_empty() && spec.bytes().all(|b| b.is_ascii_digit());
    if !digital {
        if let Some(pos) = names.iter().position(|n| n == spec) {
            return Ok(pos);
        }
    }
    if digital {
        let index: i64 = spec
            .parse::<i64>()
            .map_err(|_| invalid_name(spec, names))?;
        let col = index - offset as i64;
        if col < 0 {
            return Err(TabError::ColumnIdentifier(format!(
                "Column '{index}' is invalid. Columns are (default) 1-based."
            )));
        }
        if col as usize >= names.len() {
            return Err(TabError::ColumnIdentifier(format!(
                "Column {index} is invalid. The last column is '{}' at index {}.",
                names[names.len() - 1],
                names.len() - 1 + offset
            )));
        }
        Ok(col as usize)
    } else {
        Err(invalid_name(spec, names))
    }
}

fn invalid_name(spec: &str, names: &[String]) -> TabError {
    let known = names.iter().map(|n| format!("'{n}'")).join(",");
    TabError::ColumnIdentifier(format!(
        "Column '{spec}' is invalid. It is neither an integer nor a column name. Column names are: {known}."
    ))
}

/// Resolve a comma-separated list of identifiers and ranges, minus excludes.
/// An empty spec selects every column.
pub fn parse_column_ids(
    spec: &str,
    names: &[String],
    offset: usize,
    exclude: &str,
) -> Result<Vec<usize>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let included = if spec.trim().is_empty() {
        (0..names.len()).collect()
    } else {
        resolve_list(spec, names, offset)?
    };
    if exclude.trim().is_empty() {
        return Ok(included);
    }
    let excluded = resolve_list(exclude, names, offset)?;
    Ok(included
        .into_iter()
        .filter(|c| !excluded.contains(c))
        .collect())
}

fn resolve_list(spec: &str, names: &[String], offset: usize) -> Result<Vec<usize>> {
    let mut out = Vec::new();
    for token in spec.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match match_column(names, token, offset) {
            Ok(col) => out.push(col),
            Err(err) => {
                let Some(range) = parse_range(token, names.len(), offset)? else {
                    return Err(err);
                };
                out.extend(range);
            }
        }
    }
    Ok(out)
}

fn parse_range(
    token: &str,
    column_count: usize,
    offset: usize,
) -> Result<Option<std::ops::RangeInclusive<usize>>> {
    let sep = if token.contains(':') {
        ':'
    } else if token.contains('-') {
        '-'
    } else {
        return Ok(None);
    };
    let (a, b) = token.split_once(sep).unwrap();
    let bad_range = || {
        TabError::ColumnIdentifier(format!(
            "Invalid range {token}. Ranges must be two integers (by default: 1-based) separated by a - or : character."
        ))
    };
    let parse_end = |s: &str, default: usize| -> Result<usize> {
        if s.trim().is_empty() {
            Ok(default)
        } else {
            s.trim().parse().map_err(|_| bad_range())
        }
    };
    let lo = parse_end(a, offset)?;
    let hi = parse_end(b, column_count + offset - 1)?;
    if lo < offset || hi < offset {
        return Err(bad_range());
    }
    let (lo, hi) = (lo - offset, hi - offset);
    if hi >= column_count || lo > hi {
        return Err(bad_range());
    }
    Ok(Some(lo..=hi))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn names() -> Vec<String> {
        ["id", "name", "a", "b", "c"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn by_name_and_index() {
        assert_eq!(match_column(&names(), "name", 1).unwrap(), 1);
        assert_eq!(match_column(&names(), "1", 1).unwrap(), 0);
        assert_eq!(match_column(&names(), "1", 0).unwrap(), 1);
        assert!(match_column(&names(), "6", 1).is_err());
        assert!(match_column(&names(), "0", 1).is_err());
        assert!(match_column(&names(), "missing", 1).is_err());
    }

    #[test]
    fn unknown_name_lists_known_columns() {
        let err = match_column(&names(), "nope", 1).unwrap_err().to_string();
        assert!(err.contains("'id'"), "{err}");
        assert!(err.contains("'c'"), "{err}");
    }

    #[test]
    fn lists_and_ranges() {
        assert_eq!(
            parse_column_ids("1,name,3-5", &names(), 1, "").unwrap(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(parse_column_ids("2:3", &names(), 1, "").unwrap(), vec![1, 2]);
        assert_eq!(parse_column_ids("-2", &names(), 1, "").unwrap(), vec![0, 1]);
        assert_eq!(parse_column_ids("4-", &names(), 1, "").unwrap(), vec![3, 4]);
    }

    #[test]
    fn empty_spec_selects_all_minus_excludes() {
        assert_eq!(parse_column_ids("", &names(), 1, "").unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(
            parse_column_ids("", &names(), 1, "2-3").unwrap(),
            vec![0, 3, 4]
        );
    }

    #[test]
    fn bad_ranges() {
        assert!(parse_column_ids("5-2", &names(), 1, "").is_err());
        assert!(parse_column_ids("1-99", &names(), 1, "").is_err());
        assert!(parse_column_ids("x-y", &names(), 1, "").is_err());
    }
}
