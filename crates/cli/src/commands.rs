use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tabcast_helpers::Config;
use tabcast_lib_core::context::ParseContext;
use tabcast_lib_core::errors::Result;

use tabcast_lib::source::SourceOptions;

#[derive(Debug, Parser)]
#[command(name = "tabcast")]
#[command(about = "A toolkit for tabular data: convert, clean, sort, join, and project CSV", long_about = None, version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(
        name = "convert",
        about = "Convert common tabular data formats (csv, fixed, dbf, xls, xlsx, json, ndjson, geojson) to CSV"
    )]
    Convert(ConvertArgs),
    #[command(name = "clean", about = "Fix common errors in a CSV file")]
    Clean(CleanArgs),
    #[command(name = "sort", about = "Sort CSV files by one or more typed columns")]
    Sort(SortArgs),
    #[command(name = "join", about = "Execute a SQL-like join to merge CSV files on a specified column")]
    Join(JoinArgs),
    #[command(name = "sql", about = "Generate SQL statements for a CSV file")]
    Sql(SqlArgs),
    #[command(name = "json", about = "Convert a CSV file to JSON, NDJSON or GeoJSON")]
    Json(JsonArgs),
}

/// Flags every command accepts.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Specify the encoding of the input file.
    #[arg(short = 'e', long, default_value = "UTF-8")]
    pub encoding: String,
    /// Ignore whitespace immediately following the delimiter.
    #[arg(short = 'S', long = "skipinitialspace")]
    pub skip_init_space: bool,
    /// The input has no header row; generate headers (a,b,c,...).
    #[arg(short = 'H', long = "no-header-row")]
    pub no_header: bool,
    /// Number of initial lines to skip before the header row.
    #[arg(short = 'K', long = "skip-lines", default_value_t = 0)]
    pub skip_lines: usize,
    /// Insert a column of line numbers at the front of the output.
    #[arg(short = 'l', long = "linenumbers")]
    pub line_numbers: bool,
    /// Use zero-based column numbering.
    #[arg(long)]
    pub zero: bool,
    /// Maximum length of a single field, in characters.
    #[arg(short = 'z', long = "maxfieldsize")]
    pub max_field_size: Option<usize>,
    /// Print verbose diagnostics.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Flags of the type-aware commands.
#[derive(Debug, Args)]
pub struct TypedArgs {
    /// Locale of any formatted numbers.
    #[arg(short = 'L', long, default_value = "C")]
    pub locale: String,
    /// Do not convert "", "na", "n/a", "none", "null", "." to NULL.
    #[arg(long)]
    pub blanks: bool,
    /// Convert this value to NULL; may be given multiple times.
    #[arg(long = "null-value")]
    pub null_value: Vec<String>,
    /// strptime date format, like "%m/%d/%Y".
    #[arg(long = "date-format", default_value = "%m/%d/%Y")]
    pub date_format: String,
    /// strptime datetime format, like "%m/%d/%Y %I:%M %p".
    #[arg(long = "datetime-format", default_value = "%m/%d/%Y %I:%M %p")]
    pub datetime_format: String,
    /// Do not convert a numeric value with leading zeroes to a number.
    #[arg(long = "no-leading-zeroes")]
    pub no_leading_zeroes: bool,
    /// Disable type inference when parsing the input.
    #[arg(short = 'I', long = "no-inference")]
    pub no_inference: bool,
    /// Use the date library as the date/datetime parser backend.
    #[arg(long = "date-lib-parser", default_value_t = true)]
    pub date_lib_parser: bool,
}

impl CommonArgs {
    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            encoding: self.encoding.clone(),
            skip_init_space: self.skip_init_space,
            no_header: self.no_header,
            skip_lines: self.skip_lines,
            max_field_size: self.max_field_size,
        }
    }
}

impl TypedArgs {
    pub fn parse_context(&self, common: &CommonArgs) -> Result<ParseContext> {
        Ok(ParseContext::with_locale(&self.locale)?.config(|ctx| {
            ctx.add_null_values(&self.null_value);
            ctx.date_format = self.date_format.clone();
            ctx.datetime_format = self.datetime_format.clone();
            ctx.blanks = self.blanks;
            ctx.no_inference = self.no_inference;
            ctx.no_leading_zeroes = self.no_leading_zeroes;
            ctx.max_field_size = common.max_field_size;
        }))
    }
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// The file to convert. If omitted, input is read from STDIN.
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub common: CommonArgs,
    #[command(flatten)]
    pub typed: TypedArgs,
    /// The input format; inferred from the file extension if omitted.
    #[arg(short = 'f', long)]
    pub format: Option<String>,
    /// CSV-formatted schema file for fixed-width input.
    #[arg(short = 's', long)]
    pub schema: Option<PathBuf>,
    /// Top-level key holding the list of objects when processing JSON.
    #[arg(short = 'k', long)]
    pub key: Option<String>,
    /// Display sheet names from the input Excel file and exit.
    #[arg(short = 'n', long)]
    pub names: bool,
    /// The name of the Excel sheet to operate on.
    #[arg(long)]
    pub sheet: Option<String>,
    /// Excel sheets to write to sibling files, or "-" for all sheets.
    #[arg(long = "write-sheets")]
    pub write_sheets: Option<String>,
    /// Use sheet names as file names with --write-sheets.
    #[arg(long = "use-sheet-names")]
    pub use_sheet_names: bool,
    /// Numeric columns to interpret as Excel serial dates, e.g. "1,id,3-5".
    #[arg(long = "d-excel")]
    pub d_excel: Option<String>,
    /// Numeric columns to interpret as Excel serial datetimes.
    #[arg(long = "dt-excel")]
    pub dt_excel: Option<String>,
    /// Use the 1904 date system for Excel serials.
    #[arg(long)]
    pub is1904: bool,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// The CSV file to operate on. If omitted, input is read from STDIN.
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub common: CommonArgs,
    /// Do not create output files; report to STDERR instead.
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct SortArgs {
    /// The CSV file to operate on. If omitted, input is read from STDIN.
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub common: CommonArgs,
    #[command(flatten)]
    pub typed: TypedArgs,
    /// Comma-separated column names, indices or ranges to sort by.
    #[arg(short = 'c', long, default_value = "")]
    pub columns: String,
    /// Sort in descending order.
    #[arg(short = 'r', long)]
    pub reverse: bool,
    /// Case-independent text comparison.
    #[arg(short = 'i', long = "ignore-case")]
    pub ignore_case: bool,
    /// Sort on the thread pool.
    #[arg(short = 'p', long = "parallel-sort")]
    pub parallel_sort: bool,
    /// Display column names and indices and exit.
    #[arg(short = 'n', long)]
    pub names: bool,
}

#[derive(Debug, Args)]
pub struct JoinArgs {
    /// The CSV files to join, in order.
    pub files: Vec<PathBuf>,
    #[command(flatten)]
    pub common: CommonArgs,
    #[command(flatten)]
    pub typed: TypedArgs,
    /// Join column name(s): one for all files or one per file. Omitting it
    /// stacks the files sequentially without matching.
    #[arg(short = 'c', long)]
    pub columns: Option<String>,
    /// Perform a full outer join instead of the default inner join.
    #[arg(long)]
    pub outer: bool,
    /// Perform a left outer join.
    #[arg(long)]
    pub left: bool,
    /// Perform a right outer join.
    #[arg(long)]
    pub right: bool,
}

#[derive(Debug, Args)]
pub struct SqlArgs {
    /// The CSV file to operate on. If omitted, input is read from STDIN.
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub common: CommonArgs,
    #[command(flatten)]
    pub typed: TypedArgs,
    /// SQL dialect {generic,mysql,postgresql,sqlite,firebird,oracle}.
    #[arg(short = 'i', long)]
    pub dialect: Option<String>,
    /// A connection string; only consulted to pick the dialect.
    #[arg(long)]
    pub db: Option<String>,
    /// Name of the table to create; defaults to the file name.
    #[arg(long)]
    pub tables: Option<String>,
    /// Generate a schema without length limits or null checks.
    #[arg(long = "no-constraints")]
    pub no_constraints: bool,
    /// Comma-separated column names for a UNIQUE constraint.
    #[arg(long = "unique-constraint", default_value = "")]
    pub unique_constraint: String,
    /// Also generate INSERT statements for the data.
    #[arg(long)]
    pub insert: bool,
    /// Rows per INSERT statement. Requires --insert.
    #[arg(long = "chunk-size", default_value_t = 0)]
    pub chunk_size: usize,
    /// Expression following the INSERT keyword, like OR IGNORE.
    #[arg(long, default_value = "")]
    pub prefix: String,
    /// Emit CREATE TABLE IF NOT EXISTS.
    #[arg(long = "create-if-not-exists")]
    pub create_if_not_exists: bool,
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    /// The CSV file to operate on. If omitted, input is read from STDIN.
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub common: CommonArgs,
    #[command(flatten)]
    pub typed: TypedArgs,
    /// Indent the output by this many spaces.
    #[arg(short = 'i', long)]
    pub indent: Option<usize>,
    /// Output a JSON object keyed by this column instead of an array.
    #[arg(short = 'k', long)]
    pub key: Option<String>,
    /// Latitude column for GeoJSON output.
    #[arg(long)]
    pub lat: Option<String>,
    /// Longitude column for GeoJSON output.
    #[arg(long)]
    pub lon: Option<String>,
    /// Suppress the computed bounding box.
    #[arg(long = "no-bbox")]
    pub no_bbox: bool,
    /// Coordinate reference system name for GeoJSON output.
    #[arg(long)]
    pub crs: Option<String>,
    /// Emit newline-delimited JSON, one object per row.
    #[arg(long)]
    pub newline: bool,
}
