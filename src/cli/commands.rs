use crate::config::TranscodeOptions;
use crate::core::WriteMode;
use crate::error::{TabulaError, TabulaResult};
use crate::excel::{load_workbook, save_workbook};
use crate::store::MemoryStore;
use crate::types::{Decoded, Record};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Transcoding flags shared by every command; they override `--config`
#[derive(Args, Debug, Clone, Default)]
pub struct TranscodeArgs {
    /// YAML file with transcoding options
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Header row (column with --pivot), 1-based
    #[arg(long)]
    pub header_line: Option<usize>,

    /// First data row (column with --pivot), 1-based
    #[arg(long)]
    pub start_line: Option<usize>,

    /// Records are columns, fields are rows
    #[arg(long)]
    pub pivot: bool,

    /// Keep existing formulas in cells the new data does not supply
    #[arg(long)]
    pub preserve_formulas: bool,

    /// Read date cells as their displayed text (ISO dates for .xlsx input,
    /// whose number formats are not imported)
    #[arg(long)]
    pub display_dates: bool,

    /// Read at most this many header cells
    #[arg(long)]
    pub field_cap: Option<usize>,

    /// Allow duplicate header names (they share one record key)
    #[arg(long)]
    pub lenient_headers: bool,

    /// Do not log skipped-field warnings
    #[arg(short, long)]
    pub quiet: bool,
}

impl TranscodeArgs {
    /// Options from `--config` (or defaults) with flags applied on top
    pub fn load(&self) -> TabulaResult<TranscodeOptions> {
        let mut opts = match self.config {
            Some(ref path) => TranscodeOptions::from_file(path)?,
            None => TranscodeOptions::default(),
        };
        if let Some(line) = self.header_line {
            opts.header_line = line;
        }
        if let Some(line) = self.start_line {
            opts.start_line = line;
        }
        if self.field_cap.is_some() {
            opts.field_cap = self.field_cap;
        }
        opts.pivot |= self.pivot;
        opts.preserve_formulas |= self.preserve_formulas;
        opts.use_display_dates |= self.display_dates;
        opts.mute |= self.quiet;
        if self.lenient_headers {
            opts.strict_headers = false;
        }
        opts.validate()?;
        Ok(opts)
    }
}

/// Read a JSON array of record objects
pub fn load_records(path: &Path) -> TabulaResult<Vec<Record>> {
    let content = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    if !value.is_array() {
        return Err(TabulaError::InvalidParameters(format!(
            "{} must contain a JSON array of records",
            path.display()
        )));
    }
    serde_json::from_value(value).map_err(|e| {
        TabulaError::InvalidParameters(format!(
            "{}: every record must be a JSON object ({})",
            path.display(),
            e
        ))
    })
}

fn open(file: &Path, table: &str) -> TabulaResult<MemoryStore> {
    let store = load_workbook(file)?;
    // Fail before any work when the sheet is missing
    store.table(table)?;
    Ok(store)
}

fn save(store: &MemoryStore, file: &Path, output: Option<&Path>) -> TabulaResult<PathBuf> {
    let target = output.unwrap_or(file).to_path_buf();
    save_workbook(store, &target)?;
    Ok(target)
}

/// Execute the fields command - list header fields and their positions
pub fn fields(file: PathBuf, table: String, args: TranscodeArgs) -> TabulaResult<()> {
    let opts = args.load()?;
    let store = open(&file, &table)?;
    let fields = crate::core::resolve_fields(&store, &table, &opts)?;

    println!("{}", "📋 Tabula - Header Fields".bold().green());
    println!("   File:  {}", file.display());
    println!("   Table: {}\n", table.bright_blue().bold());

    if fields.is_empty() {
        println!("{}", "   (header line is empty)".yellow());
        return Ok(());
    }
    let noun = opts.orientation().line_noun();
    for field in fields.iter() {
        println!(
            "   {} {:>3}  {}",
            noun,
            field.position(),
            field.name.cyan()
        );
    }
    Ok(())
}

/// Execute the read command - decode a table to JSON records
pub fn read(
    file: PathBuf,
    table: String,
    args: TranscodeArgs,
    output: Option<PathBuf>,
) -> TabulaResult<()> {
    let opts = args.load()?;
    let store = open(&file, &table)?;

    let records = match crate::core::decode(&store, &table, &opts)? {
        Decoded::Records(records) => records,
        Decoded::EmptyTable => {
            eprintln!(
                "{}",
                format!("⚠️  Table '{}' has no data lines", table).yellow()
            );
            Vec::new()
        }
    };
    let json = serde_json::to_string_pretty(&records)?;

    match output {
        Some(path) => {
            fs::write(&path, json)?;
            println!(
                "{} {} records → {}",
                "✅".green(),
                records.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Execute the write command - write records with a write mode
pub fn write(
    file: PathBuf,
    table: String,
    records: PathBuf,
    mode: String,
    args: TranscodeArgs,
    output: Option<PathBuf>,
) -> TabulaResult<()> {
    let mode: WriteMode = mode.parse()?;
    let opts = args.load()?;
    let records = load_records(&records)?;
    let mut store = open(&file, &table)?;

    println!("{}", format!("✏️  Tabula - {} write", mode).bold().green());
    println!("   Table: {}", table.bright_blue().bold());

    let report = crate::core::write_records(&mut store, &table, &records, mode, &opts)?;
    let target = save(&store, &file, output.as_deref())?;

    println!(
        "   {} lines written from {} {}",
        report.lines_written.to_string().bold(),
        opts.orientation().line_noun(),
        report.first_line
    );
    if report.lines_cleared > 0 {
        println!("   {} lines cleared", report.lines_cleared);
    }
    if report.formulas_restored > 0 {
        println!("   {} formulas restored", report.formulas_restored);
    }
    println!("{} {}", "✅ Saved".green(), target.display());
    Ok(())
}

/// Execute the upsert command - update matching lines, append the rest
pub fn upsert(
    file: PathBuf,
    table: String,
    records: PathBuf,
    match_field: String,
    args: TranscodeArgs,
    output: Option<PathBuf>,
) -> TabulaResult<()> {
    let opts = args.load()?;
    let records = load_records(&records)?;
    let mut store = open(&file, &table)?;

    println!("{}", "🔁 Tabula - Upsert".bold().green());
    println!(
        "   Table: {}  (match on {})",
        table.bright_blue().bold(),
        match_field.cyan()
    );

    let report = crate::core::upsert(&mut store, &table, &records, &match_field, &opts)?;
    let target = save(&store, &file, output.as_deref())?;

    println!("   {} updated", report.updated_lines.len().to_string().bold());
    println!("   {} inserted", report.inserted_lines.len().to_string().bold());
    println!("{} {}", "✅ Saved".green(), target.display());
    Ok(())
}

/// Execute the update command - find-and-update named fields
#[allow(clippy::too_many_arguments)]
pub fn update(
    file: PathBuf,
    table: String,
    records: PathBuf,
    match_field: String,
    target_fields: Vec<String>,
    args: TranscodeArgs,
    output: Option<PathBuf>,
) -> TabulaResult<()> {
    let opts = args.load()?;
    let records = load_records(&records)?;
    let mut store = open(&file, &table)?;

    println!("{}", "🔎 Tabula - Find and update".bold().green());
    println!(
        "   Table: {}  (match on {})",
        table.bright_blue().bold(),
        match_field.cyan()
    );

    let report = crate::core::find_and_update(
        &mut store,
        &table,
        &records,
        &match_field,
        &target_fields,
        &opts,
    )?;
    let target = save(&store, &file, output.as_deref())?;

    for name in &report.updated_fields {
        println!("   {} {}", "✓".green(), name);
    }
    for name in &report.skipped_fields {
        println!("   {} {} (not in header)", "⚠️ ".yellow(), name);
    }
    println!(
        "   {} cells written, {} records unmatched",
        report.cells_written.to_string().bold(),
        report.unmatched_records
    );
    println!("{} {}", "✅ Saved".green(), target.display());
    Ok(())
}
