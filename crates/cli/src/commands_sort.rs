use std::io::Write;

use tabcast_lib::sort::{sort, SortOptions};
use tabcast_lib::source;
use tabcast_lib::writer;
use tabcast_lib_core::errors::Result;

use crate::commands::SortArgs;

pub(crate) fn run(args: &SortArgs) -> Result<()> {
    let path = crate::input_path(args.file.as_deref())?;
    let source_options = args.common.source_options();
    let text = source::load_text(path, &source_options)?;
    let table = source::read_table(&text, &source_options)?;

    if args.names {
        let start = if args.common.zero { 0 } else { 1 };
        for (i, name) in table.header.iter().enumerate() {
            println!("{:3}: {name}", i + start);
        }
        return Ok(());
    }

    let mut ctx = args.typed.parse_context(&args.common)?;
    ctx.ignore_case = args.ignore_case;

    let options = SortOptions {
        columns: args.columns.clone(),
        descending: args.reverse,
        parallel: args.parallel_sort,
        zero: args.common.zero,
    };
    let (typed, schemas) = sort(table, &options, &ctx)?;

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    writer::write_typed_table(&mut out, &typed, &schemas, &ctx, args.common.line_numbers)?;
    out.flush()?;
    Ok(())
}
