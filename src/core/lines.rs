//! Orientation-aware block access.
//!
//! The rest of the core speaks in lines (one per record) and positions (one
//! per field). These helpers translate to physical rows/columns and back.

use crate::error::{TabulaError, TabulaResult};
use crate::store::TableStore;
use crate::types::{CellValue, CellVariant, Matrix, Orientation};

/// Block of `lines` × `positions` starting at (`first_line`, `first_position`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRegion {
    pub first_line: usize,
    pub lines: usize,
    pub first_position: usize,
    pub positions: usize,
}

impl LineRegion {
    /// Full-width region starting at position 1
    pub fn new(first_line: usize, lines: usize, positions: usize) -> Self {
        Self {
            first_line,
            lines,
            first_position: 1,
            positions,
        }
    }

    /// A single position across `lines` lines
    pub fn field(first_line: usize, lines: usize, position: usize) -> Self {
        Self {
            first_line,
            lines,
            first_position: position,
            positions: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines == 0 || self.positions == 0
    }
}

/// `NotFound` unless the store knows `table`
pub fn ensure_table<S: TableStore + ?Sized>(store: &S, table: &str) -> TabulaResult<()> {
    if store.has_table(table) {
        Ok(())
    } else {
        Err(TabulaError::table_not_found(table))
    }
}

pub fn last_line<S: TableStore + ?Sized>(
    store: &S,
    table: &str,
    orientation: Orientation,
) -> TabulaResult<usize> {
    match orientation {
        Orientation::Normal => store.last_populated_row(table),
        Orientation::Pivot => store.last_populated_column(table, 1),
    }
}

pub fn last_position<S: TableStore + ?Sized>(
    store: &S,
    table: &str,
    orientation: Orientation,
) -> TabulaResult<usize> {
    match orientation {
        Orientation::Normal => store.last_populated_column(table, 1),
        Orientation::Pivot => store.last_populated_row(table),
    }
}

/// Read a region as a line-major matrix (`lines` rows of `positions` cells)
pub fn read_region<S: TableStore + ?Sized>(
    store: &S,
    table: &str,
    orientation: Orientation,
    region: LineRegion,
    variant: CellVariant,
) -> TabulaResult<Matrix> {
    if region.is_empty() {
        ensure_table(store, table)?;
        return Ok(vec![Vec::new(); region.lines]);
    }
    let block = store.read_block(
        table,
        orientation.cell(region.first_line, region.first_position),
        orientation.shape(region.lines, region.positions),
        variant,
    )?;
    Ok(orientation.to_lines(block))
}

/// Write line-major `lines` starting at (`first_line`, `first_position`)
pub fn write_lines<S: TableStore + ?Sized>(
    store: &mut S,
    table: &str,
    orientation: Orientation,
    first_line: usize,
    first_position: usize,
    lines: &Matrix,
) -> TabulaResult<()> {
    if lines.is_empty() {
        return Ok(());
    }
    let block = orientation.to_physical(lines.clone());
    store.write_block(table, orientation.cell(first_line, first_position), &block)
}

pub fn write_cell<S: TableStore + ?Sized>(
    store: &mut S,
    table: &str,
    orientation: Orientation,
    line: usize,
    position: usize,
    value: CellValue,
) -> TabulaResult<()> {
    store.write_block(table, orientation.cell(line, position), &vec![vec![value]])
}

pub fn clear_lines<S: TableStore + ?Sized>(
    store: &mut S,
    table: &str,
    orientation: Orientation,
    region: LineRegion,
) -> TabulaResult<()> {
    if region.is_empty() {
        return Ok(());
    }
    store.clear_region(
        table,
        orientation.cell(region.first_line, region.first_position),
        orientation.shape(region.lines, region.positions),
    )
}

/// Re-apply every non-blank formula of a line-major snapshot taken at
/// `region`, skipping cells for which `skip(line_index, position_index)`
/// holds. Returns the number of formulas written.
pub fn replay_formulas<S, F>(
    store: &mut S,
    table: &str,
    orientation: Orientation,
    region: LineRegion,
    snapshot: &Matrix,
    skip: F,
) -> TabulaResult<usize>
where
    S: TableStore + ?Sized,
    F: Fn(usize, usize) -> bool,
{
    let mut restored = 0;
    for (i, line) in snapshot.iter().enumerate() {
        for (j, formula) in line.iter().enumerate() {
            let CellValue::Text(text) = formula else {
                continue;
            };
            if text.is_empty() || skip(i, j) {
                continue;
            }
            let cell = orientation.cell(region.first_line + i, region.first_position + j);
            store.write_formula(table, cell, text)?;
            restored += 1;
        }
    }
    Ok(restored)
}
