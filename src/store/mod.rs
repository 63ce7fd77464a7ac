//! Grid access capability
//!
//! The transcoding core never talks to a concrete document model. It needs
//! exactly the operations of [`TableStore`]; adapters (the in-memory
//! [`MemoryStore`], the `.xlsx` loader built on top of it) provide them.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::TabulaResult;
use crate::types::{CellVariant, Matrix, Origin, Shape};

/// Rectangular read/write access to the named tables of one document.
///
/// All coordinates are 1-based. Every method fails with
/// [`TabulaError::NotFound`](crate::error::TabulaError::NotFound) when
/// `table` does not exist.
pub trait TableStore {
    fn has_table(&self, table: &str) -> bool;

    /// Read `shape` cells starting at `origin`. The result is always exactly
    /// `shape.rows` × `shape.cols`; cells outside the populated area read as
    /// blank.
    fn read_block(
        &self,
        table: &str,
        origin: Origin,
        shape: Shape,
        variant: CellVariant,
    ) -> TabulaResult<Matrix>;

    /// Write `values` starting at `origin`, growing the table as needed.
    /// Each written cell loses any formula it held.
    fn write_block(&mut self, table: &str, origin: Origin, values: &Matrix) -> TabulaResult<()>;

    /// Set one cell's formula (text including the leading `=`)
    fn write_formula(&mut self, table: &str, cell: Origin, formula: &str) -> TabulaResult<()>;

    /// Last row holding any non-blank cell, or 1 when the table is empty
    fn last_populated_row(&self, table: &str) -> TabulaResult<usize>;

    /// Last column at or after `from_column` holding any non-blank cell,
    /// or `from_column` when there is none
    fn last_populated_column(&self, table: &str, from_column: usize) -> TabulaResult<usize>;

    /// Blank values and formulas in the region; formatting is kept
    fn clear_region(&mut self, table: &str, origin: Origin, shape: Shape) -> TabulaResult<()>;
}
