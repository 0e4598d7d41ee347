//! SQL generation dialects.
//!
//! A closed set of dialects, each mapping inferred column kinds to column
//! types, choosing identifier quoting and rendering value literals. The
//! differences live here; statement assembly lives in `tabcast-lib`.

use itertools::Itertools;
use tabcast_lib_core::datetime::{format_date, format_datetime};
use tabcast_lib_core::errors::{Result, TabError};
use tabcast_lib_core::infer::ColumnKind;
use tabcast_lib_core::timedelta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Dialect {
    Generic,
    Mysql,
    Postgresql,
    Sqlite,
    Firebird,
    Oracle,
}

impl Dialect {
    pub fn from_name(name: &str) -> Result<Dialect> {
        name.parse().map_err(|_| {
            TabError::Format(format!(
                "unknown SQL dialect {name:?}; expected one of generic, mysql, postgresql, sqlite, firebird, oracle"
            ))
        })
    }

    /// Infer the dialect from a `--db` connection string.
    pub fn from_connection_string(db: &str) -> Dialect {
        for dialect in [
            Dialect::Mysql,
            Dialect::Postgresql,
            Dialect::Sqlite,
            Dialect::Firebird,
            Dialect::Oracle,
        ] {
            if db.contains(&dialect.to_string()) {
                return dialect;
            }
        }
        Dialect::Generic
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::Mysql => '`',
            _ => '"',
        }
    }

    /// Identifiers that are lower_snake stay bare; everything else gets the
    /// dialect's quoting. Oracle additionally quotes a few reserved words
    /// that commonly appear as CSV headers.
    pub fn quote_ident(self, name: &str) -> String {
        let reserved =
            self == Dialect::Oracle && matches!(name, "date" | "integer" | "float");
        let bare = !reserved
            && !name.is_empty()
            && name.bytes().enumerate().all(|(i, b)| {
                b.is_ascii_lowercase() || b == b'_' || (b.is_ascii_digit() && i > 0)
            });
        if bare {
            name.to_owned()
        } else {
            let q = self.quote_char();
            format!("{q}{name}{q}")
        }
    }

    /// Column type text for a bare (no-constraints) declaration.
    pub fn column_type(self, kind: ColumnKind) -> Result<String> {
        self.column_type_inner(kind, None)
    }

    /// Column type text with NOT NULL and length/scale constraints applied.
    pub fn constrained_column_type(
        self,
        kind: ColumnKind,
        not_null: bool,
        precision: u8,
        varchar_len: usize,
    ) -> Result<String> {
        self.column_type_inner(kind, Some((not_null, precision, varchar_len)))
    }

    fn column_type_inner(
        self,
        kind: ColumnKind,
        constraints: Option<(bool, u8, usize)>,
    ) -> Result<String> {
        let not_null = |yes: bool| if yes { " NOT NULL" } else { "" };
        let out = match (self, kind) {
            (Dialect::Mysql, ColumnKind::Bool) => match constraints {
                Some((nn, _, _)) => format!("BOOL{}", not_null(nn)),
                None => "BOOL".into(),
            },
            (_, ColumnKind::Bool) => match constraints {
                Some((nn, _, _)) => format!("BOOLEAN{}", not_null(nn)),
                None => "BOOLEAN".into(),
            },

            (Dialect::Sqlite, ColumnKind::Number) => match constraints {
                Some((nn, _, _)) => format!("FLOAT{}", not_null(nn)),
                None => "FLOAT".into(),
            },
            (Dialect::Mysql | Dialect::Oracle, ColumnKind::Number) => match constraints {
                Some((nn, prec, _)) => format!("DECIMAL(38, {prec}){}", not_null(nn)),
                None => "DECIMAL".into(),
            },
            (_, ColumnKind::Number) => match constraints {
                Some((nn, _, _)) => format!("DECIMAL{}", not_null(nn)),
                None => "DECIMAL".into(),
            },

            (Dialect::Postgresql, ColumnKind::DateTime) => "TIMESTAMP WITHOUT TIME ZONE".into(),
            (Dialect::Mysql, ColumnKind::DateTime) => match constraints {
                Some((true, _, _)) => "TIMESTAMP NOT NULL".into(),
                Some((false, _, _)) => "TIMESTAMP NULL DEFAULT NULL".into(),
                None => "TIMESTAMP".into(),
            },
            (Dialect::Firebird, ColumnKind::DateTime) => match constraints {
                Some((nn, _, _)) => format!("TIMESTAMP{}", not_null(nn)),
                None => "TIMESTAMP".into(),
            },
            (_, ColumnKind::DateTime) => "TIMESTAMP".into(),

            (_, ColumnKind::Date) => match constraints {
                Some((nn, _, _)) => format!("DATE{}", not_null(nn)),
                None => "DATE".into(),
            },

            (Dialect::Postgresql, ColumnKind::Timedelta) => match constraints {
                Some((nn, _, _)) => format!("INTERVAL{}", not_null(nn)),
                None => "INTERVAL".into(),
            },
            (Dialect::Oracle, ColumnKind::Timedelta) => match constraints {
                Some((nn, _, _)) => format!("INTERVAL DAY TO SECOND{}", not_null(nn)),
                None => "INTERVAL DAY TO SECOND".into(),
            },
            (Dialect::Firebird, ColumnKind::Timedelta) => match constraints {
                Some((nn, _, _)) => format!("TIMESTAMP{}", not_null(nn)),
                None => "TIMESTAMP".into(),
            },
            (_, ColumnKind::Timedelta) => match constraints {
                Some((nn, _, _)) => format!("DATETIME{}", not_null(nn)),
                None => "DATETIME".into(),
            },

            (Dialect::Mysql, ColumnKind::Text) => match constraints {
                Some((nn, _, len)) => format!("VARCHAR({len}){}", not_null(nn)),
                None => {
                    return Err(TabError::Format(
                        "VARCHAR requires a length on dialect mysql".into(),
                    ))
                }
            },
            (Dialect::Firebird | Dialect::Oracle, ColumnKind::Text) => match constraints {
                Some((nn, _, _)) => format!("VARCHAR(200){}", not_null(nn)),
                None => "VARCHAR(200)".into(),
            },
            (_, ColumnKind::Text) => match constraints {
                Some((nn, _, _)) => format!("VARCHAR{}", not_null(nn)),
                None => "VARCHAR".into(),
            },
        };
        Ok(out)
    }

    pub fn bool_literal(self, value: bool) -> &'static str {
        match self {
            Dialect::Generic | Dialect::Postgresql => {
                if value {
                    "TRUE"
                } else {
                    "FALSE"
                }
            }
            _ => {
                if value {
                    "1"
                } else {
                    "0"
                }
            }
        }
    }

    pub fn string_literal(self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    pub fn date_literal(self, epoch: i64) -> String {
        let rendered = format_date(epoch);
        match self {
            Dialect::Oracle => format!("DATE '{rendered}'"),
            _ => format!("'{rendered}'"),
        }
    }

    pub fn datetime_literal(self, epoch: i64) -> String {
        let rendered = format_datetime(epoch);
        match self {
            Dialect::Oracle => format!("TIMESTAMP '{rendered}'"),
            _ => format!("'{rendered}'"),
        }
    }

    pub fn interval_literal(self, seconds: f64) -> String {
        match self {
            Dialect::Postgresql => format!("'{seconds} seconds'"),
            _ => format!("'{}'", timedelta::canonical(seconds)),
        }
    }
}

/// One column of a CREATE TABLE statement.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    pub not_null: bool,
    pub precision: u8,
    pub varchar_len: usize,
}

/// Render a complete CREATE TABLE statement. With `no_constraints`, bare
/// type names are emitted and nullability is left open.
pub fn create_table(
    dialect: Dialect,
    table_name: &str,
    columns: &[ColumnSpec],
    unique_constraint: &[String],
    if_not_exists: bool,
    no_constraints: bool,
) -> Result<String> {
    let phrase = if if_not_exists {
        "CREATE TABLE IF NOT EXISTS "
    } else {
        "CREATE TABLE "
    };
    let cols: Vec<String> = columns
        .iter()
        .map(|col| {
            let sql_type = if no_constraints {
                dialect.column_type(col.kind)?
            } else {
                dialect.constrained_column_type(
                    col.kind,
                    col.not_null,
                    col.precision,
                    col.varchar_len,
                )?
            };
            Ok(format!("{} {sql_type}", dialect.quote_ident(&col.name)))
        })
        .collect::<Result<_>>()?;
    let mut body = cols.join(",\n\t");
    if !unique_constraint.is_empty() {
        let unique = unique_constraint
            .iter()
            .map(|name| dialect.quote_ident(name))
            .join(", ");
        body.push_str(&format!(",\n\tUNIQUE ({unique})"));
    }
    Ok(format!(
        "{phrase}{} (\n\t{body}\n);\n",
        dialect.quote_ident(table_name)
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn spec(name: &str, kind: ColumnKind, not_null: bool, precision: u8, len: usize) -> ColumnSpec {
        ColumnSpec {
            name: name.into(),
            kind,
            not_null,
            precision,
            varchar_len: len,
        }
    }

    #[test]
    fn generic_create_table() {
        let columns = [
            spec("a", ColumnKind::Bool, true, 0, 0),
            spec("b", ColumnKind::Number, false, 2, 0),
            spec("c", ColumnKind::Text, true, 0, 5),
        ];
        let sql = create_table(Dialect::Generic, "t", &columns, &[], false, false).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE t (\n\ta BOOLEAN NOT NULL,\n\tb DECIMAL,\n\tc VARCHAR NOT NULL\n);\n"
        );
    }

    #[test]
    fn mysql_needs_varchar_lengths() {
        assert!(Dialect::Mysql.column_type(ColumnKind::Text).is_err());
        assert_eq!(
            Dialect::Mysql
                .constrained_column_type(ColumnKind::Text, true, 0, 12)
                .unwrap(),
            "VARCHAR(12) NOT NULL"
        );
        assert_eq!(
            Dialect::Mysql
                .constrained_column_type(ColumnKind::Number, false, 3, 0)
                .unwrap(),
            "DECIMAL(38, 3)"
        );
        assert_eq!(
            Dialect::Mysql
                .constrained_column_type(ColumnKind::DateTime, false, 0, 0)
                .unwrap(),
            "TIMESTAMP NULL DEFAULT NULL"
        );
    }

    #[test]
    fn postgres_temporal_types() {
        assert_eq!(
            Dialect::Postgresql.column_type(ColumnKind::DateTime).unwrap(),
            "TIMESTAMP WITHOUT TIME ZONE"
        );
        assert_eq!(
            Dialect::Postgresql
                .constrained_column_type(ColumnKind::Timedelta, true, 0, 0)
                .unwrap(),
            "INTERVAL NOT NULL"
        );
    }

    #[test]
    fn identifier_quoting() {
        assert_eq!(Dialect::Generic.quote_ident("lower_snake2"), "lower_snake2");
        assert_eq!(Dialect::Generic.quote_ident("Mixed Case"), "\"Mixed Case\"");
        assert_eq!(Dialect::Generic.quote_ident("2fast"), "\"2fast\"");
        assert_eq!(Dialect::Mysql.quote_ident("Mixed"), "`Mixed`");
        assert_eq!(Dialect::Oracle.quote_ident("date"), "\"date\"");
        assert_eq!(Dialect::Generic.quote_ident("date"), "date");
    }

    #[test]
    fn literals() {
        assert_eq!(Dialect::Postgresql.bool_literal(true), "TRUE");
        assert_eq!(Dialect::Sqlite.bool_literal(true), "1");
        assert_eq!(Dialect::Generic.string_literal("it's"), "'it''s'");
        assert_eq!(Dialect::Oracle.date_literal(0), "DATE '1970-01-01'");
        assert_eq!(
            Dialect::Generic.datetime_literal(60),
            "'1970-01-01 00:01:00'"
        );
    }

    #[test]
    fn dialect_names_roundtrip() {
        for name in ["generic", "mysql", "postgresql", "sqlite", "firebird", "oracle"] {
            assert_eq!(Dialect::from_name(name).unwrap().to_string(), name);
        }
        assert!(Dialect::from_name("mssql").is_err());
        assert_eq!(
            Dialect::from_connection_string("postgresql://u@h/db"),
            Dialect::Postgresql
        );
    }
}
