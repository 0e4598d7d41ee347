use std::io::Write;
use std::path::Path;

use tabcast_lib::convert::{self, ConvertOptions, Format};
use tabcast_lib::source;
use tabcast_lib::writer;
use tabcast_lib_core::errors::{Result, TabError};
use tabcast_lib_core::infer::{typify, TypedTable, TypifyPolicy};

use crate::commands::ConvertArgs;

pub(crate) fn run(args: &ConvertArgs) -> Result<()> {
    let path = crate::input_path(args.file.as_deref())?;
    let format = match &args.format {
        Some(name) => Format::from_name(name)?,
        None => match path {
            Some(p) => Format::from_path(p).ok_or_else(|| {
                TabError::Format(format!(
                    "cannot determine the format of {}; specify one with -f",
                    p.display()
                ))
            })?,
            None => {
                return Err(TabError::Format(
                    "You must specify a format when providing input as piped data via STDIN."
                        .into(),
                ))
            }
        },
    };

    if args.names {
        for name in convert::excel::sheet_names(path)? {
            println!("{name}");
        }
        return Ok(());
    }
    if let Some(which) = &args.write_sheets {
        let written =
            convert::excel::write_sheets(path, which, args.use_sheet_names, Path::new("."))?;
        for p in written {
            log::debug!("wrote {}", p.display());
        }
        return Ok(());
    }

    let options = ConvertOptions {
        source: args.common.source_options(),
        schema: args.schema.clone(),
        key: args.key.clone(),
        sheet: args.sheet.clone(),
        d_excel: args.d_excel.clone(),
        dt_excel: args.dt_excel.clone(),
        is1904: args.is1904,
        zero: args.common.zero,
    };
    let ctx = args.typed.parse_context(&args.common)?;

    let bytes = convert::convert(format, path, &options)?;
    let text = String::from_utf8(bytes).map_err(|e| TabError::Encoding(e.to_string()))?;

    // translators emit a canonical stream; only raw CSV keeps the user's
    // skip-lines and trimming, and only spreadsheet-shaped input can be
    // headerless
    let mut intermediate = args.common.source_options();
    intermediate.encoding = "UTF-8".into();
    if format != Format::Csv {
        intermediate.skip_lines = 0;
        intermediate.skip_init_space = false;
    }
    if !matches!(format, Format::Csv | Format::Xls | Format::Xlsx) {
        intermediate.no_header = false;
    }

    let mut table = source::read_table(&text, &intermediate)?;
    if convert::supports_serial_projection(format) {
        convert::apply_serial_projection(&mut table, &options, &ctx)?;
    }

    let typed = TypedTable::from_table(table);
    let schemas = typify(&typed, &ctx, TypifyPolicy::WithoutPrecision);
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    writer::write_typed_table(&mut out, &typed, &schemas, &ctx, args.common.line_numbers)?;
    out.flush()?;
    Ok(())
}
