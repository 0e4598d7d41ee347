use std::io::Write;

use tabcast_lib::json_out::{write_json, JsonOutOptions};
use tabcast_lib::source;
use tabcast_lib_core::errors::Result;
use tabcast_lib_core::infer::{typify, TypedTable, TypifyPolicy};

use crate::commands::JsonArgs;

pub(crate) fn run(args: &JsonArgs) -> Result<()> {
    let path = crate::input_path(args.file.as_deref())?;
    let source_options = args.common.source_options();
    let text = source::load_text(path, &source_options)?;
    let table = source::read_table(&text, &source_options)?;

    let ctx = args.typed.parse_context(&args.common)?;
    let typed = TypedTable::from_table(table);
    let schemas = typify(&typed, &ctx, TypifyPolicy::WithoutPrecision);

    let options = JsonOutOptions {
        indent: args.indent,
        key: args.key.clone(),
        lat: args.lat.clone(),
        lon: args.lon.clone(),
        no_bbox: args.no_bbox,
        crs: args.crs.clone(),
        ndjson: args.newline,
        zero: args.common.zero,
    };

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    write_json(&mut out, &typed, &schemas, &ctx, &options)?;
    out.flush()?;
    Ok(())
}
