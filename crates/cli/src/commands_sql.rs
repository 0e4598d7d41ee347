use std::io::Write;

use tabcast_lib::source;
use tabcast_lib::sql::{default_table_name, insert_statements, table_ddl, SqlOptions};
use tabcast_lib_core::errors::Result;
use tabcast_lib_core::infer::{typify, TypedTable, TypifyPolicy};

use crate::commands::SqlArgs;

pub(crate) fn run(args: &SqlArgs) -> Result<()> {
    let path = crate::input_path(args.file.as_deref())?;
    let source_options = args.common.source_options();
    let text = source::load_text(path, &source_options)?;
    let table = source::read_table(&text, &source_options)?;

    let ctx = args.typed.parse_context(&args.common)?;
    let typed = TypedTable::from_table(table);
    let policy = if args.no_constraints {
        TypifyPolicy::WithoutPrecisionAndBlanks
    } else {
        TypifyPolicy::WithPrecision
    };
    let schemas = typify(&typed, &ctx, policy);

    let table_name = match &args.tables {
        Some(names) => names
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_owned(),
        None => default_table_name(path)?,
    };
    let options = SqlOptions {
        dialect: args.dialect.clone(),
        db: args.db.clone(),
        table_name: Some(table_name.clone()),
        no_constraints: args.no_constraints,
        unique_constraint: args
            .unique_constraint
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        create_if_not_exists: args.create_if_not_exists,
        chunk_size: args.chunk_size,
        prefix: args.prefix.clone(),
    };

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    let ddl = table_ddl(&typed, &schemas, &table_name, &options)?;
    out.write_all(ddl.as_bytes())?;
    if args.insert {
        for statement in insert_statements(&typed, &schemas, &table_name, &options, &ctx)? {
            writeln!(out, "{statement}")?;
        }
    }
    out.flush()?;
    Ok(())
}
