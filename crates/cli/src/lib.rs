use clap::Parser as _;
use tabcast_lib_core::errors::{Result, TabError};

use crate::commands::{Cli, Commands};

pub mod commands;
mod commands_clean;
mod commands_convert;
mod commands_join;
mod commands_json;
mod commands_sort;
mod commands_sql;
mod logger;

pub fn run_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let verbose = match &cli.command {
        Commands::Convert(a) => a.common.verbose,
        Commands::Clean(a) => a.common.verbose,
        Commands::Sort(a) => a.common.verbose,
        Commands::Join(a) => a.common.verbose,
        Commands::Sql(a) => a.common.verbose,
        Commands::Json(a) => a.common.verbose,
    };
    let _ = logger::init(verbose);

    let outcome = match cli.command {
        Commands::Convert(args) => commands_convert::run(&args),
        Commands::Clean(args) => commands_clean::run(&args),
        Commands::Sort(args) => commands_sort::run(&args),
        Commands::Join(args) => commands_join::run(&args),
        Commands::Sql(args) => commands_sql::run(&args),
        Commands::Json(args) => commands_json::run(&args),
    };
    match outcome {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{e}");
            1
        }
    }
}

/// Resolve the positional input: `None`/`-` means stdin, which must then be
/// piped rather than a terminal.
pub(crate) fn input_path(file: Option<&std::path::Path>) -> Result<Option<&std::path::Path>> {
    use std::io::IsTerminal;

    let path = file.filter(|p| p.as_os_str() != "-");
    if path.is_none() && std::io::stdin().is_terminal() {
        return Err(TabError::Value(
            "You must provide an input file or piped data.".into(),
        ));
    }
    Ok(path)
}

pub(crate) fn base_name(path: Option<&std::path::Path>) -> String {
    path.and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("stdin")
        .to_owned()
}
