use std::path::Path;

use tabcast_lib::clean::{clean, CleanOptions};
use tabcast_lib::source;
use tabcast_lib_core::errors::Result;

use crate::commands::CleanArgs;

pub(crate) fn run(args: &CleanArgs) -> Result<()> {
    let path = crate::input_path(args.file.as_deref())?;
    let source_options = args.common.source_options();
    let text = source::load_text(path, &source_options)?;
    let base = crate::base_name(path);

    let options = CleanOptions {
        dry_run: args.dry_run,
        line_numbers: args.common.line_numbers,
    };
    let mut stderr = std::io::stderr();
    let report = clean(
        &text,
        &source_options,
        &options,
        Path::new("."),
        &base,
        &mut stderr,
    )?;
    if !args.dry_run {
        println!("{}", report.summary());
    }
    Ok(())
}
