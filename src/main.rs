use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tabula::cli::{self, TranscodeArgs};
use tabula::error::TabulaResult;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Map spreadsheet rows/columns to JSON records and back.")]
#[command(long_about = "Tabula - tabular record transcoder for .xlsx workbooks

Reads a table (one worksheet) as keyed records using a header row, and
writes records back with overwrite, append, overlay or upsert semantics.
Pass --pivot to treat columns as records and rows as fields.

COMMANDS:
  fields  - List the header fields of a table
  read    - Decode a table to JSON records
  write   - Write records (overwrite | append | overlay)
  upsert  - Update lines matched on a field, append the rest
  update  - Update named fields of matched lines only

EXAMPLES:
  tabula read book.xlsx -t People
  tabula write book.xlsx -t People -r new.json --mode overlay --preserve-formulas
  tabula upsert book.xlsx -t People -r people.json --match-field Name
  tabula update book.xlsx -t People -r ages.json --match-field Name --fields Age,City")]
#[command(version)]
struct Cli {
    /// Log every operation (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the header fields of a table
    Fields {
        /// Path to .xlsx workbook
        file: PathBuf,

        /// Worksheet name
        #[arg(short, long)]
        table: String,

        #[command(flatten)]
        options: TranscodeArgs,
    },

    /// Decode a table to JSON records
    Read {
        /// Path to .xlsx workbook
        file: PathBuf,

        /// Worksheet name
        #[arg(short, long)]
        table: String,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: TranscodeArgs,
    },

    #[command(long_about = "Write records into a table.

MODES:
  overwrite - clear the data lines, then write records from the start line
  append    - write records after the last populated line
  overlay   - merge each record into the line at the same index,
              keeping every field the record does not supply

With --preserve-formulas, formulas in the cleared (overwrite) or kept
(overlay) cells are written back after the values.")]
    /// Write records (overwrite | append | overlay)
    Write {
        /// Path to .xlsx workbook
        file: PathBuf,

        /// Worksheet name
        #[arg(short, long)]
        table: String,

        /// JSON file holding an array of record objects
        #[arg(short, long)]
        records: PathBuf,

        /// overwrite, append or overlay
        #[arg(short, long, default_value = "overwrite")]
        mode: String,

        /// Save to this workbook instead of the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: TranscodeArgs,
    },

    /// Update lines matched on a field, append the rest
    Upsert {
        /// Path to .xlsx workbook
        file: PathBuf,

        /// Worksheet name
        #[arg(short, long)]
        table: String,

        /// JSON file holding an array of record objects
        #[arg(short, long)]
        records: PathBuf,

        /// Field whose value identifies a line
        #[arg(long)]
        match_field: String,

        /// Save to this workbook instead of the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: TranscodeArgs,
    },

    /// Update named fields of matched lines only (never inserts)
    Update {
        /// Path to .xlsx workbook
        file: PathBuf,

        /// Worksheet name
        #[arg(short, long)]
        table: String,

        /// JSON file holding an array of record objects
        #[arg(short, long)]
        records: PathBuf,

        /// Field whose value identifies a line
        #[arg(long)]
        match_field: String,

        /// Fields to update (comma-separated); unknown ones are skipped
        #[arg(long, value_delimiter = ',', required = true)]
        fields: Vec<String>,

        /// Save to this workbook instead of the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: TranscodeArgs,
    },
}

fn main() -> TabulaResult<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.verbose);

    match cli.command {
        Commands::Fields {
            file,
            table,
            options,
        } => cli::fields(file, table, options),

        Commands::Read {
            file,
            table,
            output,
            options,
        } => cli::read(file, table, options, output),

        Commands::Write {
            file,
            table,
            records,
            mode,
            output,
            options,
        } => cli::write(file, table, records, mode, options, output),

        Commands::Upsert {
            file,
            table,
            records,
            match_field,
            output,
            options,
        } => cli::upsert(file, table, records, match_field, options, output),

        Commands::Update {
            file,
            table,
            records,
            match_field,
            fields,
            output,
            options,
        } => cli::update(file, table, records, match_field, fields, options, output),
    }
}
