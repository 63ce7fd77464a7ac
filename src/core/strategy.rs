//! Write modes: overwrite, append, overlay

use super::codec::encode;
use super::header::{resolve_required_fields, FieldList};
use super::lines::{
    clear_lines, last_line, last_position, read_region, replay_formulas, write_lines, LineRegion,
};
use crate::config::TranscodeOptions;
use crate::error::{TabulaError, TabulaResult};
use crate::store::TableStore;
use crate::types::{CellVariant, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How records are merged into the data lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Clear the data extent and write the records from the start line
    Overwrite,
    /// Write after the last populated line
    Append,
    /// Merge supplied fields into the lines starting at the start line
    Overlay,
}

impl FromStr for WriteMode {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(WriteMode::Overwrite),
            "append" => Ok(WriteMode::Append),
            "overlay" => Ok(WriteMode::Overlay),
            _ => Err(TabulaError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteMode::Overwrite => "overwrite",
            WriteMode::Append => "append",
            WriteMode::Overlay => "overlay",
        };
        f.write_str(name)
    }
}

/// What a write touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub mode: WriteMode,
    /// First line written (row, or column in pivot)
    pub first_line: usize,
    pub lines_written: usize,
    /// Lines blanked before writing (overwrite only)
    pub lines_cleared: usize,
    pub formulas_restored: usize,
}

impl WriteReport {
    fn new(mode: WriteMode, first_line: usize) -> Self {
        Self {
            mode,
            first_line,
            lines_written: 0,
            lines_cleared: 0,
            formulas_restored: 0,
        }
    }
}

/// Write `records` into `table` using `mode`.
///
/// Fields come from the header line; record keys that are not headers are
/// ignored. Fails with `NotFound` when the table is missing or its header
/// line is empty.
pub fn write_records<S: TableStore + ?Sized>(
    store: &mut S,
    table: &str,
    records: &[Record],
    mode: WriteMode,
    opts: &TranscodeOptions,
) -> TabulaResult<WriteReport> {
    opts.validate()?;
    let fields = resolve_required_fields(&*store, table, opts)?;

    let report = match mode {
        WriteMode::Overwrite => overwrite(store, table, &fields, records, opts)?,
        WriteMode::Append => append(store, table, &fields, records, opts)?,
        WriteMode::Overlay if opts.preserve_formulas => {
            overlay_preserving(store, table, &fields, records, opts)?
        }
        WriteMode::Overlay => overlay(store, table, &fields, records, opts)?,
    };

    debug!(
        table,
        mode = %mode,
        first_line = report.first_line,
        lines = report.lines_written,
        formulas = report.formulas_restored,
        "wrote records"
    );
    Ok(report)
}

/// First free line after the data extent, never before the start line
pub(crate) fn append_line<S: TableStore + ?Sized>(
    store: &S,
    table: &str,
    opts: &TranscodeOptions,
) -> TabulaResult<usize> {
    let last = last_line(store, table, opts.orientation())?;
    Ok((last + 1).max(opts.start_line))
}

fn overwrite<S: TableStore + ?Sized>(
    store: &mut S,
    table: &str,
    fields: &FieldList,
    records: &[Record],
    opts: &TranscodeOptions,
) -> TabulaResult<WriteReport> {
    let orientation = opts.orientation();
    let start = opts.start_line;
    let mut report = WriteReport::new(WriteMode::Overwrite, start);

    let last = last_line(&*store, table, orientation)?;
    let width = last_position(&*store, table, orientation)?.max(fields.span());
    let cleared = LineRegion::new(start, (last + 1).saturating_sub(start), width);

    let snapshot = if opts.preserve_formulas && !cleared.is_empty() {
        read_region(&*store, table, orientation, cleared, CellVariant::FormulaText)?
    } else {
        Vec::new()
    };

    clear_lines(store, table, orientation, cleared)?;
    report.lines_cleared = cleared.lines;

    let lines = encode(fields, records);
    write_lines(store, table, orientation, start, 1, &lines)?;
    report.lines_written = lines.len();

    // Replayed formulas win over freshly written literals
    report.formulas_restored =
        replay_formulas(store, table, orientation, cleared, &snapshot, |_, _| false)?;
    Ok(report)
}

fn append<S: TableStore + ?Sized>(
    store: &mut S,
    table: &str,
    fields: &FieldList,
    records: &[Record],
    opts: &TranscodeOptions,
) -> TabulaResult<WriteReport> {
    let first = append_line(&*store, table, opts)?;
    let mut report = WriteReport::new(WriteMode::Append, first);

    let lines = encode(fields, records);
    write_lines(store, table, opts.orientation(), first, 1, &lines)?;
    report.lines_written = lines.len();
    Ok(report)
}

/// Overlay in one read and one write; formulas in rewritten cells become
/// their literal values.
fn overlay<S: TableStore + ?Sized>(
    store: &mut S,
    table: &str,
    fields: &FieldList,
    records: &[Record],
    opts: &TranscodeOptions,
) -> TabulaResult<WriteReport> {
    let orientation = opts.orientation();
    let start = opts.start_line;
    let mut report = WriteReport::new(WriteMode::Overlay, start);
    if records.is_empty() {
        return Ok(report);
    }

    let region = LineRegion::new(start, records.len(), fields.span());
    let mut lines = read_region(&*store, table, orientation, region, CellVariant::Value)?;
    for (line, record) in lines.iter_mut().zip(records) {
        for field in fields.iter() {
            if let Some(value) = record.get(&field.name) {
                line[field.offset] = value.clone();
            }
        }
    }

    write_lines(store, table, orientation, start, 1, &lines)?;
    report.lines_written = lines.len();
    Ok(report)
}

/// Overlay one line at a time, re-applying formulas in cells whose field the
/// record did not supply.
fn overlay_preserving<S: TableStore + ?Sized>(
    store: &mut S,
    table: &str,
    fields: &FieldList,
    records: &[Record],
    opts: &TranscodeOptions,
) -> TabulaResult<WriteReport> {
    let orientation = opts.orientation();
    let start = opts.start_line;
    let width = fields.span();
    let mut report = WriteReport::new(WriteMode::Overlay, start);

    for (i, record) in records.iter().enumerate() {
        let region = LineRegion::new(start + i, 1, width);
        let mut line = read_region(&*store, table, orientation, region, CellVariant::Value)?
            .pop()
            .unwrap_or_default();
        let formulas = read_region(&*store, table, orientation, region, CellVariant::FormulaText)?;

        let mut supplied = vec![false; width];
        for field in fields.iter() {
            if let Some(value) = record.get(&field.name) {
                line[field.offset] = value.clone();
                supplied[field.offset] = true;
            }
        }

        write_lines(store, table, orientation, start + i, 1, &vec![line])?;
        report.formulas_restored +=
            replay_formulas(store, table, orientation, region, &formulas, |_, j| {
                supplied[j]
            })?;
        report.lines_written += 1;
    }
    Ok(report)
}
