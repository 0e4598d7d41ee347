use std::io::Write;

use tabcast_lib::join::{join, JoinMode, JoinOptions};
use tabcast_lib::source;
use tabcast_lib::writer;
use tabcast_lib_core::errors::{Result, TabError};
use tabcast_lib_core::infer::TypedTable;
use tabcast_lib_core::table::Table;

use crate::commands::JoinArgs;

pub(crate) fn run(args: &JoinArgs) -> Result<()> {
    if args.left && args.right {
        return Err(TabError::Join(
            "It is not valid to specify both a left and a right join.".into(),
        ));
    }
    let mode = if args.outer {
        JoinMode::Outer
    } else if args.left {
        JoinMode::Left
    } else if args.right {
        JoinMode::Right
    } else if args.columns.is_some() {
        JoinMode::Inner
    } else {
        JoinMode::Union
    };

    let source_options = args.common.source_options();
    let mut tables: Vec<Table> = Vec::new();
    if args.files.is_empty() {
        let text = source::load_text(crate::input_path(None)?, &source_options)?;
        tables.push(source::read_table(&text, &source_options)?);
    } else {
        for file in &args.files {
            let text = source::load_text(Some(file), &source_options)?;
            tables.push(source::read_table(&text, &source_options)?);
        }
    }

    let ctx = args.typed.parse_context(&args.common)?;
    let options = JoinOptions {
        columns: args.columns.clone(),
        zero: args.common.zero,
    };
    let (merged, schemas) = join(tables, mode, &options, &ctx)?;

    let typed = TypedTable::from_table(merged);
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    writer::write_typed_table(&mut out, &typed, &schemas, &ctx, args.common.line_numbers)?;
    out.flush()?;
    Ok(())
}
